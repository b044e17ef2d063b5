// ==========================================
// 客户释放单看板系统 - 排程 API
// ==========================================
// 职责: 排程 CRUD / 单元格编辑 / 日桶 MRP 重建 / 排程看板
// ==========================================

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::api::error::{ApiError, ApiResult};
use crate::app::AppState;
use crate::domain::grid::GridModel;
use crate::domain::schedule::{ProductionSchedule, ScheduleLine, ScheduleMrpRow};
use crate::domain::types::{ItemType, ScheduleStatus};
use crate::engine::{KanbanProjector, ProjectMap, SchedulingEngine};

/// 日桶 MRP 重建响应
#[derive(Debug, Clone, Serialize)]
pub struct DailyMrpResponse {
    pub row_count: usize,
    pub warnings: Vec<String>,
}

/// 新建排程
pub fn create_schedule(
    state: &AppState,
    name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> ApiResult<ProductionSchedule> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidArgument("排程名称不能为空".to_string()));
    }
    let (start_date, end_date) = swap_if_inverted(start_date, end_date);
    Ok(state.schedule_repo.create(name.trim(), start_date, end_date)?)
}

/// 更新排程基本信息
pub fn update_schedule(
    state: &AppState,
    schedule_id: &str,
    name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: ScheduleStatus,
) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidArgument("排程名称不能为空".to_string()));
    }
    let (start_date, end_date) = swap_if_inverted(start_date, end_date);
    state
        .schedule_repo
        .update(schedule_id, name.trim(), start_date, end_date, status)?;
    Ok(())
}

/// 删除排程 (级联清除明细与 MRP 行)
pub fn delete_schedule(state: &AppState, schedule_id: &str) -> ApiResult<()> {
    state.schedule_repo.delete(schedule_id)?;
    Ok(())
}

/// 查询单个排程
pub fn get_schedule(state: &AppState, schedule_id: &str) -> ApiResult<ProductionSchedule> {
    state
        .schedule_repo
        .find_by_id(schedule_id)?
        .ok_or_else(|| ApiError::NotFound(format!("ProductionSchedule ({})", schedule_id)))
}

/// 排程列表, 最新在前
pub fn list_schedules(state: &AppState) -> ApiResult<Vec<ProductionSchedule>> {
    Ok(state.schedule_repo.list()?)
}

/// 单格写入
pub fn set_cell(
    state: &AppState,
    schedule_id: &str,
    item_id: i64,
    production_date: NaiveDate,
    planned_qty: f64,
) -> ApiResult<()> {
    if planned_qty < 0.0 {
        return Err(ApiError::InvalidArgument("计划量不能为负".to_string()));
    }
    let engine = SchedulingEngine::new(&state.schedule_repo, &state.item_repo);
    engine.set_cell(schedule_id, item_id, production_date, planned_qty)?;
    Ok(())
}

/// 批量写入 (单事务)
pub fn batch_set_cells(state: &AppState, lines: &[ScheduleLine]) -> ApiResult<usize> {
    if lines.iter().any(|l| l.planned_qty < 0.0) {
        return Err(ApiError::InvalidArgument("计划量不能为负".to_string()));
    }
    let engine = SchedulingEngine::new(&state.schedule_repo, &state.item_repo);
    Ok(engine.batch_set_cells(lines)?)
}

/// 重建某排程的日桶 MRP
pub fn calc_daily_mrp(
    state: &AppState,
    schedule_id: &str,
    include_types: &[ItemType],
) -> ApiResult<DailyMrpResponse> {
    let engine = SchedulingEngine::new(&state.schedule_repo, &state.item_repo);
    let report = engine.calculate_daily_mrp(schedule_id, include_types)?;
    Ok(DailyMrpResponse {
        row_count: report.row_count,
        warnings: report.warnings,
    })
}

/// 排程 MRP 派生行读取
pub fn schedule_mrp_rows(state: &AppState, schedule_id: &str) -> ApiResult<Vec<ScheduleMrpRow>> {
    Ok(state.schedule_repo.mrp_rows(schedule_id)?)
}

/// 排程看板 (日模式网格)
///
/// 列按所选周派生; 未传周集合时取排程窗口内的全部 ISO 周。
pub fn schedule_grid(
    state: &AppState,
    schedule_id: &str,
    selected_weeks: &[NaiveDate],
) -> ApiResult<GridModel> {
    let schedule = get_schedule(state, schedule_id)?;
    let lines = state.schedule_repo.lines_for(schedule_id)?;

    let weeks: Vec<NaiveDate> = if selected_weeks.is_empty() {
        let mut weeks = Vec::new();
        let mut cursor = crate::calendar::week_start(schedule.start_date);
        let last = crate::calendar::week_start(schedule.end_date);
        while cursor <= last {
            weeks.push(cursor);
            cursor += chrono::Duration::days(7);
        }
        weeks
    } else {
        selected_weeks.to_vec()
    };

    let day_columns = SchedulingEngine::derive_day_columns(&weeks);
    let anchors = SchedulingEngine::week_anchors(&weeks);

    let mut item_codes: BTreeMap<i64, String> = BTreeMap::new();
    for line in &lines {
        if !item_codes.contains_key(&line.item_id) {
            if let Some(item) = state.item_repo.find_by_id(line.item_id)? {
                item_codes.insert(line.item_id, item.item_code);
            }
        }
    }

    let project_map = ProjectMap::load(&state.project_repo)?;
    Ok(KanbanProjector::project_schedule(
        &day_columns,
        &anchors,
        &lines,
        &item_codes,
        &project_map,
    ))
}

fn swap_if_inverted(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    if start > end {
        (end, start)
    } else {
        (start, end)
    }
}
