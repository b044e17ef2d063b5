// ==========================================
// 客户释放单看板系统 - 运行配置
// ==========================================
// 职责: config_kv 表的键值读写
// 口径: 配置缺失时回落内置默认值, 不报错
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::repository::{RepositoryError, RepositoryResult};

/// 默认库位 (库存录入未指定库位时使用)
pub const KEY_DEFAULT_LOCATION: &str = "default_location";
/// 默认导出目录
pub const KEY_EXPORT_DIR: &str = "export_dir";

const DEFAULT_LOCATION: &str = "MAIN";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn get(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn set(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO config_kv (key, value) VALUES (?, ?)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value"#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 默认库位; 未配置时为 "MAIN"
    pub fn default_location(&self) -> RepositoryResult<String> {
        Ok(self
            .get(KEY_DEFAULT_LOCATION)?
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        db::configure_sqlite_connection(&conn).unwrap();
        db::init_schema(&conn).unwrap();
        ConfigManager::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_get_set_roundtrip() {
        let cfg = manager();
        assert_eq!(cfg.get("missing").unwrap(), None);
        assert_eq!(cfg.default_location().unwrap(), "MAIN");

        cfg.set(KEY_DEFAULT_LOCATION, "WH-2").unwrap();
        cfg.set(KEY_DEFAULT_LOCATION, "WH-3").unwrap();
        assert_eq!(cfg.default_location().unwrap(), "WH-3");
    }
}
