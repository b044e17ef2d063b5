// ==========================================
// 客户释放单看板系统 - 库存 API
// ==========================================
// 职责: 在手量录入与分库位查询
// 口径: 未指定库位时回落配置默认库位
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::app::AppState;
use crate::domain::item::InventoryBalance;

/// 录入某物料某库位在手量 (幂等覆盖), 返回写入后的余额
pub fn set_on_hand(
    state: &AppState,
    item_code: &str,
    location: Option<&str>,
    qty: f64,
) -> ApiResult<InventoryBalance> {
    if qty < 0.0 {
        return Err(ApiError::InvalidArgument("在手量不能为负".to_string()));
    }
    let item = state
        .item_repo
        .find_by_code(item_code)?
        .ok_or_else(|| ApiError::NotFound(format!("物料不存在: {}", item_code)))?;

    let location = match location {
        Some(l) if !l.trim().is_empty() => l.to_string(),
        _ => state.config.default_location()?,
    };
    state.item_repo.set_on_hand(item.item_id, &location, qty)?;

    Ok(InventoryBalance {
        item_id: item.item_id,
        location,
        qty_on_hand: qty,
    })
}

/// 某物料分库位余额
pub fn list_inventory(state: &AppState, item_code: &str) -> ApiResult<Vec<InventoryBalance>> {
    let item = state
        .item_repo
        .find_by_code(item_code)?
        .ok_or_else(|| ApiError::NotFound(format!("物料不存在: {}", item_code)))?;
    Ok(state.item_repo.inventory_for(item.item_id)?)
}
