// ==========================================
// 客户释放单看板系统 - 配置层
// ==========================================

pub mod config_manager;

pub use config_manager::{ConfigManager, KEY_DEFAULT_LOCATION, KEY_EXPORT_DIR};
