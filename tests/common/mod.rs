// ==========================================
// 集成测试辅助: 临时库与种子数据
// ==========================================
#![allow(dead_code)]

use release_kanban::app::AppState;
use release_kanban::db;
use release_kanban::domain::types::ItemType;
use release_kanban::repository::NewBomLine;
use tempfile::NamedTempFile;

/// 新建临时数据库并装配应用状态
///
/// 返回的 NamedTempFile 必须由调用方持有, 否则文件提前删除。
pub fn create_test_state() -> (AppState, NamedTempFile) {
    let tmp = NamedTempFile::new().expect("创建临时数据库文件失败");
    let path = tmp.path().to_string_lossy().into_owned();
    let conn = db::open_sqlite_connection(&path).expect("打开测试数据库失败");
    db::init_schema(&conn).expect("初始化测试库 schema 失败");
    (AppState::from_connection(conn), tmp)
}

/// 建物料, 返回 item_id
pub fn seed_item(state: &AppState, code: &str, item_type: ItemType) -> i64 {
    state
        .item_repo
        .upsert_item(code, code, None, None, item_type)
        .expect("建物料失败")
}

/// 建单级 BOM: parent → [(child, qty_per)]
pub fn seed_bom(state: &AppState, parent_id: i64, children: &[(i64, f64)]) {
    let lines: Vec<NewBomLine> = children
        .iter()
        .map(|&(child_item_id, qty_per)| NewBomLine {
            child_item_id,
            qty_per,
            scrap: None,
            effective_from: None,
            effective_to: None,
        })
        .collect();
    state.item_repo.set_bom(parent_id, &lines).expect("建BOM失败");
}
