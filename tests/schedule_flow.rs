// ==========================================
// 集成测试: 生产排程与日桶 MRP 重建
// ==========================================

mod common;

use chrono::NaiveDate;
use release_kanban::api;
use release_kanban::domain::grid::{CellStyle, GridCell, GridColumn};
use release_kanban::domain::schedule::ScheduleLine;
use release_kanban::domain::types::{ItemType, ScheduleStatus};
use release_kanban::engine::SchedulingEngine;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn test_schedule_crud() {
    let (state, _tmp) = common::create_test_state();

    // 起止倒置自动交换
    let schedule =
        api::schedule_api::create_schedule(&state, "八月排程", d(2025, 8, 31), d(2025, 8, 1))
            .unwrap();
    assert_eq!(schedule.start_date, d(2025, 8, 1));
    assert_eq!(schedule.end_date, d(2025, 8, 31));
    assert_eq!(schedule.status, ScheduleStatus::Draft);

    api::schedule_api::update_schedule(
        &state,
        &schedule.schedule_id,
        "八月排程-定稿",
        d(2025, 8, 1),
        d(2025, 8, 31),
        ScheduleStatus::Active,
    )
    .unwrap();

    let loaded = api::schedule_api::get_schedule(&state, &schedule.schedule_id).unwrap();
    assert_eq!(loaded.name, "八月排程-定稿");
    assert_eq!(loaded.status, ScheduleStatus::Active);

    api::schedule_api::delete_schedule(&state, &schedule.schedule_id).unwrap();
    assert!(api::schedule_api::get_schedule(&state, &schedule.schedule_id).is_err());
}

#[test]
fn test_set_cell_is_idempotent_overwrite() {
    let (state, _tmp) = common::create_test_state();
    let item = common::seed_item(&state, "FG-1", ItemType::Fg);
    let schedule =
        api::schedule_api::create_schedule(&state, "S", d(2025, 8, 1), d(2025, 8, 31)).unwrap();

    api::schedule_api::set_cell(&state, &schedule.schedule_id, item, d(2025, 8, 12), 10.0).unwrap();
    api::schedule_api::set_cell(&state, &schedule.schedule_id, item, d(2025, 8, 12), 25.0).unwrap();

    let lines = state.schedule_repo.lines_for(&schedule.schedule_id).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].planned_qty, 25.0);
}

#[test]
fn test_daily_mrp_onhand_evolution() {
    // FG-1 → RM-1(1); onhand[RM-1]=5
    // day1 计划 10 → required 10, onhand 5, net 5; 期末 onhand = 5 + 10
    // day2 计划 10 → required 10, onhand 15, net 0
    let (state, _tmp) = common::create_test_state();
    let fg = common::seed_item(&state, "FG-1", ItemType::Fg);
    let rm = common::seed_item(&state, "RM-1", ItemType::Rm);
    common::seed_bom(&state, fg, &[(rm, 1.0)]);
    state.item_repo.set_on_hand(rm, "MAIN", 5.0).unwrap();

    let schedule =
        api::schedule_api::create_schedule(&state, "S", d(2025, 8, 1), d(2025, 8, 31)).unwrap();
    api::schedule_api::set_cell(&state, &schedule.schedule_id, fg, d(2025, 8, 12), 10.0).unwrap();
    api::schedule_api::set_cell(&state, &schedule.schedule_id, fg, d(2025, 8, 13), 10.0).unwrap();

    let report =
        api::schedule_api::calc_daily_mrp(&state, &schedule.schedule_id, &[ItemType::Rm]).unwrap();
    assert_eq!(report.row_count, 2);

    let rows = state.schedule_repo.mrp_rows(&schedule.schedule_id).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].production_date, d(2025, 8, 12));
    assert_eq!((rows[0].required_qty, rows[0].on_hand_qty, rows[0].net_qty), (10.0, 5.0, 5.0));
    assert_eq!(rows[1].production_date, d(2025, 8, 13));
    assert_eq!((rows[1].required_qty, rows[1].on_hand_qty, rows[1].net_qty), (10.0, 15.0, 0.0));
}

#[test]
fn test_daily_mrp_rebuild_is_destructive() {
    let (state, _tmp) = common::create_test_state();
    let fg = common::seed_item(&state, "FG-1", ItemType::Fg);
    let rm = common::seed_item(&state, "RM-1", ItemType::Rm);
    common::seed_bom(&state, fg, &[(rm, 2.0)]);

    let schedule =
        api::schedule_api::create_schedule(&state, "S", d(2025, 8, 1), d(2025, 8, 31)).unwrap();
    api::schedule_api::set_cell(&state, &schedule.schedule_id, fg, d(2025, 8, 12), 10.0).unwrap();
    api::schedule_api::calc_daily_mrp(&state, &schedule.schedule_id, &[]).unwrap();

    // 改计划后重算: 旧派生行整体被替换
    api::schedule_api::set_cell(&state, &schedule.schedule_id, fg, d(2025, 8, 12), 0.0).unwrap();
    api::schedule_api::set_cell(&state, &schedule.schedule_id, fg, d(2025, 8, 14), 3.0).unwrap();
    api::schedule_api::calc_daily_mrp(&state, &schedule.schedule_id, &[]).unwrap();

    let rows = state.schedule_repo.mrp_rows(&schedule.schedule_id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].production_date, d(2025, 8, 14));
    assert_eq!(rows[0].required_qty, 6.0);
}

#[test]
fn test_batch_set_cells_single_transaction() {
    let (state, _tmp) = common::create_test_state();
    let fg = common::seed_item(&state, "FG-1", ItemType::Fg);
    let schedule =
        api::schedule_api::create_schedule(&state, "S", d(2025, 8, 1), d(2025, 8, 31)).unwrap();

    let lines: Vec<ScheduleLine> = (12..=14)
        .map(|day| ScheduleLine {
            schedule_id: schedule.schedule_id.clone(),
            item_id: fg,
            production_date: d(2025, 8, day),
            planned_qty: day as f64,
        })
        .collect();
    let written = api::schedule_api::batch_set_cells(&state, &lines).unwrap();
    assert_eq!(written, 3);
    assert_eq!(state.schedule_repo.lines_for(&schedule.schedule_id).unwrap().len(), 3);
}

#[test]
fn test_schedule_grid_day_columns_and_styles() {
    let (state, _tmp) = common::create_test_state();
    let fg = common::seed_item(&state, "FG-1", ItemType::Fg);
    // 窗口恰好一个 ISO 周: 2025-08-18(一) .. 2025-08-24(日)
    let schedule =
        api::schedule_api::create_schedule(&state, "S", d(2025, 8, 18), d(2025, 8, 24)).unwrap();
    api::schedule_api::set_cell(&state, &schedule.schedule_id, fg, d(2025, 8, 14), 9.0).unwrap();

    let grid = api::schedule_api::schedule_grid(&state, &schedule.schedule_id, &[]).unwrap();
    assert!(grid.day_mode);

    // 派生日列 = {锚点-6 .. 锚点} = {08-12 .. 08-18}
    let days: Vec<NaiveDate> = grid
        .columns
        .iter()
        .filter_map(|c| match c {
            GridColumn::Day { date } => Some(*date),
            _ => None,
        })
        .collect();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0], d(2025, 8, 12));
    assert_eq!(days[6], d(2025, 8, 18));

    // 样式: 锚点日 Accent, 周日 Warning, 正计划 Success
    let row = &grid.rows[0];
    let qty_cell = GridCell::Qty { qty: 9.0, firm: None };
    let anchor_idx = days.iter().position(|&x| x == d(2025, 8, 18)).unwrap();
    let sunday_idx = days.iter().position(|&x| x == d(2025, 8, 17)).unwrap();
    let planned_idx = days.iter().position(|&x| x == d(2025, 8, 14)).unwrap();

    assert_eq!(grid.cell_style(anchor_idx, &qty_cell, false), CellStyle::Accent);
    assert_eq!(grid.cell_style(sunday_idx, &GridCell::Empty, false), CellStyle::Warning);
    assert_eq!(grid.cell_style(planned_idx, &row.cells[planned_idx], false), CellStyle::Success);
}

#[test]
fn test_day_expansion_property() {
    // 任选锚点 w, 派生日恰为 {w-6 .. w}
    let days = SchedulingEngine::derive_day_columns(&[d(2025, 1, 6)]);
    let expected: Vec<NaiveDate> = (0..7).map(|i| d(2024, 12, 31) + chrono::Duration::days(i)).collect();
    assert_eq!(days, expected);
}
