// ==========================================
// 客户释放单看板系统 - 应用状态装配
// ==========================================
// 职责: 打开数据库, 装配仓储与配置, 供 API 层注入
// 红线: 不使用全局单例; 连接经 Arc<Mutex> 注入各仓储
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::config::ConfigManager;
use crate::db;
use crate::repository::{
    ImportVersionRepository, ItemRepository, OrderRepository, ProjectMappingRepository,
    RepositoryError, RepositoryResult, ScheduleRepository,
};

/// 数据库路径环境变量 (优先于默认数据目录)
pub const DB_PATH_ENV: &str = "RELEASE_KANBAN_DB_PATH";

const APP_DIR: &str = "release-kanban";
const DB_FILE: &str = "release_kanban.db";

// ==========================================
// AppState - 应用状态
// ==========================================
pub struct AppState {
    pub conn: Arc<Mutex<Connection>>,
    pub import_repo: ImportVersionRepository,
    pub order_repo: OrderRepository,
    pub item_repo: ItemRepository,
    pub project_repo: ProjectMappingRepository,
    pub schedule_repo: ScheduleRepository,
    pub config: ConfigManager,
}

impl AppState {
    /// 打开 (或创建) 数据库文件并完成装配
    pub fn open(db_path: &str) -> RepositoryResult<AppState> {
        let conn = db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        db::init_schema(&conn)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        info!(db_path = %db_path, "数据库已就绪");
        Ok(Self::from_connection(conn))
    }

    /// 从既有连接装配 (测试入口)
    pub fn from_connection(conn: Connection) -> AppState {
        let conn = Arc::new(Mutex::new(conn));
        AppState {
            import_repo: ImportVersionRepository::new(Arc::clone(&conn)),
            order_repo: OrderRepository::new(Arc::clone(&conn)),
            item_repo: ItemRepository::new(Arc::clone(&conn)),
            project_repo: ProjectMappingRepository::new(Arc::clone(&conn)),
            schedule_repo: ScheduleRepository::new(Arc::clone(&conn)),
            config: ConfigManager::new(Arc::clone(&conn)),
            conn,
        }
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 [`DB_PATH_ENV`] → 系统数据目录 → 当前目录
pub fn get_default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        let app_dir = data_dir.join(APP_DIR);
        if std::fs::create_dir_all(&app_dir).is_ok() {
            return app_dir.join(DB_FILE);
        }
    }

    PathBuf::from(DB_FILE)
}
