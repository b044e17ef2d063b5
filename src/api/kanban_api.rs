// ==========================================
// 客户释放单看板系统 - 看板 API
// ==========================================
// 职责: 订单看板查询与导出
// 口径: 日期倒置自动交换, 不作为错误
// ==========================================

use chrono::NaiveDate;
use std::path::Path;

use crate::api::error::{ApiError, ApiResult};
use crate::app::AppState;
use crate::domain::grid::GridModel;
use crate::domain::types::OrderTypeFilter;
use crate::engine::{KanbanProjector, ProjectMap};
use crate::export::ExportFormatter;

/// 看板查询参数
#[derive(Debug, Clone, Default)]
pub struct KanbanQuery {
    pub import_id: Option<i64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub order_type: OrderTypeFilter,
}

/// 订单看板网格
pub fn kanban(state: &AppState, query: &KanbanQuery) -> ApiResult<GridModel> {
    let (start, end) = normalize_window(query.start, query.end);

    let mut rows = state.order_repo.aggregate(start, end, query.import_id)?;
    // F/P 过滤在聚合行口径上进行: 只保留目标类型的数量
    match query.order_type {
        OrderTypeFilter::All => {}
        OrderTypeFilter::FirmOnly => {
            rows.retain(|r| r.firm_qty > 0.0);
            for r in &mut rows {
                r.total_qty = r.firm_qty;
                r.forecast_qty = 0.0;
            }
        }
        OrderTypeFilter::ForecastOnly => {
            rows.retain(|r| r.forecast_qty > 0.0);
            for r in &mut rows {
                r.total_qty = r.forecast_qty;
                r.firm_qty = 0.0;
            }
        }
    }

    let project_map = ProjectMap::load(&state.project_repo)?;
    Ok(KanbanProjector::project_orders(&rows, &project_map))
}

/// 订单看板导出为 CSV; 未给路径时落到配置导出目录, 返回写入路径
pub fn export_kanban(
    state: &AppState,
    query: &KanbanQuery,
    out_path: Option<&str>,
) -> ApiResult<String> {
    let grid = kanban(state, query)?;
    if grid.rows.is_empty() {
        return Err(ApiError::InvalidArgument("没有可导出的数据".to_string()));
    }
    let path = resolve_export_path(state, out_path, "kanban")?;
    ExportFormatter::write_csv_file(&grid, Path::new(&path))?;
    Ok(path)
}

/// 导出路径解析: 显式路径优先, 否则配置导出目录 (缺省当前目录) + 时间戳文件名
pub(crate) fn resolve_export_path(
    state: &AppState,
    out_path: Option<&str>,
    prefix: &str,
) -> ApiResult<String> {
    match out_path {
        Some(p) => Ok(p.to_string()),
        None => {
            let dir = state
                .config
                .get(crate::config::KEY_EXPORT_DIR)?
                .unwrap_or_else(|| ".".to_string());
            let file = format!("{}_{}.csv", prefix, chrono::Local::now().format("%Y%m%d_%H%M%S"));
            Ok(Path::new(&dir).join(file).to_string_lossy().into_owned())
        }
    }
}

/// 日期窗口规整: start > end 时交换
pub(crate) fn normalize_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match (start, end) {
        (Some(s), Some(e)) if s > e => (Some(e), Some(s)),
        other => other,
    }
}
