// ==========================================
// 集成测试: 释放单导入与版本生命周期
// ==========================================

mod common;

use release_kanban::domain::types::{ImportStatus, OrderType};
use release_kanban::engine::ReleaseImporter;
use release_kanban::repository::RepositoryError;

const RELEASE_TEXT: &str = "\
Supplier: ACME

ACME CORP
Ship-To: X
Purchase Order: PO-1
Release Date: 08/21/25
Release ID: R-9
Item Number: PN-001
08/25/25 F 1,200
09/01/25 P 800.5
";

#[test]
fn test_import_release_text() {
    let (state, _tmp) = common::create_test_state();
    let importer = ReleaseImporter::new(&state.order_repo, &state.import_repo);

    let report = importer
        .import_text("release.txt", RELEASE_TEXT, Some("tester"))
        .unwrap();
    assert_eq!(report.order_count, 2); // 两个 ISO 周各一头
    assert_eq!(report.line_count, 2);
    assert!(report.soft_errors.is_empty());

    let headers = state.order_repo.orders_for_version(report.import_id).unwrap();
    assert_eq!(headers.len(), 2);
    for h in &headers {
        assert_eq!(h.supplier_code, "ACME");
        assert_eq!(h.supplier_name.as_deref(), Some("ACME CORP"));
        assert_eq!(h.purchase_order.as_deref(), Some("PO-1"));
        assert_eq!(h.release_id.as_deref(), Some("R-9"));
        assert_eq!(h.order_number, format!("ACME_PN-001_{}", h.calendar_week));
    }

    let lines = state.order_repo.lines_for_version(report.import_id).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].line.order_type, OrderType::Firm);
    assert_eq!(lines[0].line.required_qty, 1200.0);
    assert_eq!(lines[1].line.required_qty, 800.5);
}

#[test]
fn test_reimport_creates_new_version_with_equal_rows() {
    let (state, _tmp) = common::create_test_state();
    let importer = ReleaseImporter::new(&state.order_repo, &state.import_repo);

    let first = importer.import_text("r.txt", RELEASE_TEXT, None).unwrap();
    let second = importer.import_text("r.txt", RELEASE_TEXT, None).unwrap();

    // 版本单调递增, 互不去重
    assert!(second.import_id > first.import_id);
    assert_eq!(first.order_count, second.order_count);
    assert_eq!(first.line_count, second.line_count);

    // 版本不可变: 先导入的版本读数不受后导入影响
    let lines_a = state.order_repo.lines_for_version(first.import_id).unwrap();
    let lines_b = state.order_repo.lines_for_version(second.import_id).unwrap();
    assert_eq!(lines_a.len(), lines_b.len());
    for (a, b) in lines_a.iter().zip(lines_b.iter()) {
        assert_eq!(a.line.item_number, b.line.item_number);
        assert_eq!(a.line.delivery_date, b.line.delivery_date);
        assert_eq!(a.line.required_qty, b.line.required_qty);
    }
}

#[test]
fn test_year_boundary_week() {
    // 2024-12-30 属于 2025 年第 1 周
    let text = "\
Supplier: ACME
ACME CORP
Item Number: PN-001
12/30/24 F 100
";
    let (state, _tmp) = common::create_test_state();
    let importer = ReleaseImporter::new(&state.order_repo, &state.import_repo);
    let report = importer.import_text("boundary.txt", text, None).unwrap();

    let headers = state.order_repo.orders_for_version(report.import_id).unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].calendar_week, "CW01");
    assert_eq!(headers[0].order_year, 2025);
}

#[test]
fn test_empty_parse_records_failed_version() {
    let (state, _tmp) = common::create_test_state();
    let importer = ReleaseImporter::new(&state.order_repo, &state.import_repo);

    let err = importer
        .import_text("noise.txt", "nothing to see here\n", None)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError(_)));

    // 失败版本只留元数据行
    let history = state.import_repo.history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, ImportStatus::Failed);
    assert_eq!(history[0].order_count, 0);
    assert!(history[0].error_message.is_some());
}

#[test]
fn test_delete_version_cascades() {
    let (state, _tmp) = common::create_test_state();
    let importer = ReleaseImporter::new(&state.order_repo, &state.import_repo);
    let report = importer.import_text("r.txt", RELEASE_TEXT, None).unwrap();

    state.import_repo.delete(report.import_id).unwrap();

    assert!(state.import_repo.find_by_id(report.import_id).unwrap().is_none());
    assert!(state.order_repo.orders_for_version(report.import_id).unwrap().is_empty());
    assert!(state.order_repo.lines_for_version(report.import_id).unwrap().is_empty());

    // 再删报未找到
    assert!(matches!(
        state.import_repo.delete(report.import_id),
        Err(RepositoryError::NotFound { .. })
    ));
}

#[test]
fn test_soft_error_line_skipped() {
    let text = "\
Supplier: ACME
ACME CORP
Item Number: PN-001
08/25/25 F 100
02/30/25 F 999
09/01/25 P 50
";
    let (state, _tmp) = common::create_test_state();
    let importer = ReleaseImporter::new(&state.order_repo, &state.import_repo);
    let report = importer.import_text("soft.txt", text, None).unwrap();

    // 非法日期行跳过, 其余正常入库
    assert_eq!(report.line_count, 2);
    assert_eq!(report.soft_errors.len(), 1);
}
