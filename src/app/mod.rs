// ==========================================
// 客户释放单看板系统 - 应用层
// ==========================================

pub mod commands;
pub mod state;

pub use commands::CommandResponse;
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
