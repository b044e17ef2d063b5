// ==========================================
// 集成测试: 库存录入与默认库位配置
// ==========================================

mod common;

use release_kanban::api::{self, ApiError};
use release_kanban::config::KEY_DEFAULT_LOCATION;
use release_kanban::domain::types::ItemType;

#[test]
fn test_set_on_hand_falls_back_to_configured_location() {
    let (state, _tmp) = common::create_test_state();
    common::seed_item(&state, "RM-1", ItemType::Rm);

    // 未配置时回落内置默认库位
    let bal = api::inventory_api::set_on_hand(&state, "RM-1", None, 5.0).unwrap();
    assert_eq!(bal.location, "MAIN");
    assert_eq!(bal.qty_on_hand, 5.0);

    // 配置后新录入走配置库位, 旧库位余额保留
    state.config.set(KEY_DEFAULT_LOCATION, "WH-2").unwrap();
    let bal = api::inventory_api::set_on_hand(&state, "RM-1", None, 7.0).unwrap();
    assert_eq!(bal.location, "WH-2");

    let balances = api::inventory_api::list_inventory(&state, "RM-1").unwrap();
    assert_eq!(balances.len(), 2);
    assert_eq!((balances[0].location.as_str(), balances[0].qty_on_hand), ("MAIN", 5.0));
    assert_eq!((balances[1].location.as_str(), balances[1].qty_on_hand), ("WH-2", 7.0));
}

#[test]
fn test_explicit_location_wins_over_config() {
    let (state, _tmp) = common::create_test_state();
    let rm = common::seed_item(&state, "RM-1", ItemType::Rm);
    state.config.set(KEY_DEFAULT_LOCATION, "WH-2").unwrap();

    let bal = api::inventory_api::set_on_hand(&state, "RM-1", Some("WH-9"), 3.0).unwrap();
    assert_eq!(bal.location, "WH-9");
    assert_eq!(state.item_repo.on_hand_total(rm).unwrap(), 3.0);
}

#[test]
fn test_unknown_item_and_negative_qty_rejected() {
    let (state, _tmp) = common::create_test_state();
    common::seed_item(&state, "RM-1", ItemType::Rm);

    let err = api::inventory_api::set_on_hand(&state, "GHOST-1", None, 1.0).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = api::inventory_api::set_on_hand(&state, "RM-1", None, -1.0).unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)));
}
