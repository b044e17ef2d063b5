// ==========================================
// 客户释放单看板系统 - MRP API
// ==========================================
// 职责: 周桶/日桶 MRP 查询 (网格 + 组件明细 + 警告) 与导出
// ==========================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::api::error::ApiResult;
use crate::app::AppState;
use crate::domain::grid::GridModel;
use crate::domain::types::{ItemType, OrderTypeFilter};
use crate::engine::{KanbanProjector, MrpEngine, ProjectMap};

/// MRP 响应: 网格与计算警告一并返回
#[derive(Debug, Clone, Serialize)]
pub struct MrpResponse {
    pub grid: GridModel,
    pub warnings: Vec<String>,
}

/// MRP 查询参数
#[derive(Debug, Clone)]
pub struct MrpQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub import_id: Option<i64>,
    pub order_type: OrderTypeFilter,
    /// 组件类别过滤; 空表示不过滤
    pub include_types: Vec<ItemType>,
    /// true 时按交付日分桶, 否则按 ISO 周
    pub day_mode: bool,
}

/// MRP 网格导出为 CSV; 未给路径时落到配置导出目录, 返回写入路径
pub fn export_mrp(state: &AppState, query: &MrpQuery, out_path: Option<&str>) -> ApiResult<String> {
    let response = mrp(state, query)?;
    if response.grid.rows.is_empty() {
        return Err(crate::api::error::ApiError::InvalidArgument(
            "没有可导出的数据".to_string(),
        ));
    }
    let path = crate::api::kanban_api::resolve_export_path(state, out_path, "mrp")?;
    crate::export::ExportFormatter::write_csv_file(&response.grid, std::path::Path::new(&path))?;
    Ok(path)
}

/// MRP 计算 (周桶或日桶)
pub fn mrp(state: &AppState, query: &MrpQuery) -> ApiResult<MrpResponse> {
    // 日期倒置自动交换
    let (start, end) = if query.start > query.end {
        (query.end, query.start)
    } else {
        (query.start, query.end)
    };

    let engine = MrpEngine::new(&state.order_repo, &state.item_repo);
    let result = if query.day_mode {
        engine.calculate_daily(
            start,
            end,
            query.import_id,
            query.order_type,
            &query.include_types,
        )?
    } else {
        engine.calculate_weekly(
            start,
            end,
            query.import_id,
            query.order_type,
            &query.include_types,
        )?
    };

    let project_map = ProjectMap::load(&state.project_repo)?;
    let grid = KanbanProjector::project_mrp(&result, &project_map);

    Ok(MrpResponse {
        grid,
        warnings: result.warnings,
    })
}
