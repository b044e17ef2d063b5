// ==========================================
// 集成测试: 看板投影 (行序 / 汇总守恒 / 样式)
// ==========================================

mod common;

use release_kanban::api::{self, KanbanQuery};
use release_kanban::domain::grid::{CellStyle, GridCell, GridColumn, RowKey};
use release_kanban::domain::types::OrderTypeFilter;
use release_kanban::engine::ReleaseImporter;

const RELEASE_TEXT: &str = "\
Supplier: ZULU
ZULU GMBH
Item Number: Z999X
08/25/25 P 500
Supplier: ACME
ACME CORP
Item Number: R001P320C
08/25/25 F 300
09/01/25 P 200
Supplier: ACME
ACME CORP
Item Number: R001H368B
08/25/25 F 1000
12/29/25 F 80
";

fn seed(state: &release_kanban::app::AppState) -> i64 {
    state
        .project_repo
        .seed_defaults(&[("R001H368", "凤凰", 10), ("R001P320", "麒麟", 30)])
        .unwrap();
    let importer = ReleaseImporter::new(&state.order_repo, &state.import_repo);
    importer
        .import_text("kanban.txt", RELEASE_TEXT, None)
        .unwrap()
        .import_id
}

#[test]
fn test_row_order_follows_display_order() {
    let (state, _tmp) = common::create_test_state();
    seed(&state);

    let grid = api::kanban_api::kanban(&state, &KanbanQuery::default()).unwrap();
    let parts: Vec<&str> = grid.rows.iter().map(|r| r.key.part_number()).collect();

    // DisplayOrder 10 → 30 → 未匹配 (∞), 与供应商顺序无关
    assert_eq!(parts, vec!["R001H368B", "R001P320C", "Z999X"]);
    assert_eq!(grid.rows[0].project, "凤凰");
    assert_eq!(grid.rows[1].project, "麒麟");
    assert_eq!(grid.rows[2].project, "UNKNOWN");
}

#[test]
fn test_grid_totals_are_conserved() {
    let (state, _tmp) = common::create_test_state();
    seed(&state);

    let grid = api::kanban_api::kanban(&state, &KanbanQuery::default()).unwrap();

    // 每行: 年度小计 = 该年周格之和; 总计 = 全部周格之和
    for row in &grid.rows {
        let mut year_sums: std::collections::BTreeMap<i32, f64> = Default::default();
        let mut grand = 0.0;
        for (col, cell) in grid.columns.iter().zip(row.cells.iter()) {
            match col {
                GridColumn::Week { year, .. } => {
                    *year_sums.entry(*year).or_default() += cell.value();
                    grand += cell.value();
                }
                GridColumn::YearSum { year } => {
                    assert!(
                        (cell.value() - year_sums.get(year).copied().unwrap_or(0.0)).abs() < 1e-9,
                        "年度小计不守恒: {:?}",
                        row.key
                    );
                }
                GridColumn::Total => {
                    assert!((cell.value() - grand).abs() < 1e-9, "总计不守恒: {:?}", row.key);
                }
                GridColumn::Day { .. } => unreachable!("周模式不应有日列"),
            }
        }
    }

    // TOTAL 行: 每列 = 数据行该列之和
    for (idx, total_cell) in grid.total_row.iter().enumerate() {
        let column_sum: f64 = grid.rows.iter().map(|r| r.cells[idx].value()).sum();
        assert!((total_cell.value() - column_sum).abs() < 1e-9, "TOTAL 行第 {} 列不守恒", idx);
    }
}

#[test]
fn test_year_boundary_creates_two_yearsums() {
    let (state, _tmp) = common::create_test_state();
    seed(&state);

    // 12/29/25 是 2026 年 CW01 → 网格应有 2025 与 2026 两个小计列
    let grid = api::kanban_api::kanban(&state, &KanbanQuery::default()).unwrap();
    let year_sums: Vec<i32> = grid
        .columns
        .iter()
        .filter_map(|c| match c {
            GridColumn::YearSum { year } => Some(*year),
            _ => None,
        })
        .collect();
    assert_eq!(year_sums, vec![2025, 2026]);
    assert!(matches!(grid.columns.last(), Some(GridColumn::Total)));
}

#[test]
fn test_firm_wins_on_mixed_cell_style() {
    let (state, _tmp) = common::create_test_state();
    seed(&state);

    let grid = api::kanban_api::kanban(&state, &KanbanQuery::default()).unwrap();

    // R001P320C: CW35 有 F, CW36 只有 P
    let row = grid
        .rows
        .iter()
        .find(|r| r.key.part_number() == "R001P320C")
        .unwrap();
    let mut styles = Vec::new();
    for (idx, cell) in row.cells.iter().enumerate() {
        if let GridCell::Qty { .. } = cell {
            styles.push(grid.cell_style(idx, cell, false));
        }
    }
    assert_eq!(styles, vec![CellStyle::Firm, CellStyle::Forecast]);
}

#[test]
fn test_firm_only_filter() {
    let (state, _tmp) = common::create_test_state();
    seed(&state);

    let query = KanbanQuery {
        order_type: OrderTypeFilter::FirmOnly,
        ..Default::default()
    };
    let grid = api::kanban_api::kanban(&state, &query).unwrap();

    // 纯预测行 Z999X 被过滤掉
    assert!(grid.rows.iter().all(|r| r.key.part_number() != "Z999X"));
    // 剩余单元格全部按确认着色
    for row in &grid.rows {
        for cell in &row.cells {
            if let GridCell::Qty { firm, .. } = cell {
                assert_eq!(*firm, Some(true));
            }
        }
    }
}

#[test]
fn test_version_scoped_query() {
    let (state, _tmp) = common::create_test_state();
    let v1 = seed(&state);

    let importer = ReleaseImporter::new(&state.order_repo, &state.import_repo);
    let v2 = importer
        .import_text(
            "extra.txt",
            "Supplier: ACME\nACME CORP\nItem Number: R001H368B\n08/25/25 F 7\n",
            None,
        )
        .unwrap()
        .import_id;

    let grid_v2 = api::kanban_api::kanban(
        &state,
        &KanbanQuery { import_id: Some(v2), ..Default::default() },
    )
    .unwrap();
    assert_eq!(grid_v2.rows.len(), 1);
    assert_eq!(grid_v2.rows[0].key.part_number(), "R001H368B");

    let grid_v1 = api::kanban_api::kanban(
        &state,
        &KanbanQuery { import_id: Some(v1), ..Default::default() },
    )
    .unwrap();
    assert_eq!(grid_v1.rows.len(), 3);
}

#[test]
fn test_export_with_explicit_path() {
    let (state, _tmp) = common::create_test_state();
    seed(&state);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("kanban.csv");
    let written = api::kanban_api::export_kanban(
        &state,
        &KanbanQuery::default(),
        Some(&out.to_string_lossy()),
    )
    .unwrap();
    assert_eq!(written, out.to_string_lossy());
    assert!(std::fs::read_to_string(&out).unwrap().contains("TOTAL"));
}

#[test]
fn test_export_falls_back_to_configured_dir() {
    let (state, _tmp) = common::create_test_state();
    seed(&state);

    let dir = tempfile::tempdir().unwrap();
    state
        .config
        .set(release_kanban::config::KEY_EXPORT_DIR, &dir.path().to_string_lossy())
        .unwrap();

    let written = api::kanban_api::export_kanban(&state, &KanbanQuery::default(), None).unwrap();
    assert!(written.starts_with(&*dir.path().to_string_lossy()));
    assert!(std::fs::read_to_string(&written).unwrap().contains("TOTAL"));
}

#[test]
fn test_row_key_variants() {
    let key = RowKey::SupplierItem {
        supplier_code: "ACME".to_string(),
        item_number: "PN-1".to_string(),
    };
    assert_eq!(key.part_number(), "PN-1");
    assert_eq!(key.supplier_code(), "ACME");
}
