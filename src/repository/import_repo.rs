// ==========================================
// 客户释放单看板系统 - 导入版本仓储
// ==========================================
// 职责: import_version 表的读写与整版删除
// 红线: 不含业务逻辑, 所有查询参数化
// ==========================================

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use crate::domain::order::ImportVersion;
use crate::domain::types::ImportStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ImportVersionRepository - 导入版本仓储
// ==========================================
pub struct ImportVersionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ImportVersionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 记录一次失败的导入 (如文件无有效订单)
    ///
    /// 失败版本只有元数据行, 不挂任何订单; 不属于"部分可见"状态。
    pub fn insert_failed(
        &self,
        file_name: &str,
        imported_by: Option<&str>,
        error_message: &str,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO import_version (
                file_name, import_date, order_count, line_count,
                status, imported_by, error_message
            ) VALUES (?, ?, 0, 0, ?, ?, ?)"#,
            params![
                file_name,
                Utc::now().naive_utc().format(DATETIME_FMT).to_string(),
                ImportStatus::Failed.to_db_str(),
                imported_by,
                error_message,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 导入历史, 最新在前
    pub fn history(&self) -> RepositoryResult<Vec<ImportVersion>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT import_id, file_name, import_date, order_count, line_count,
                      status, imported_by, error_message
               FROM import_version
               ORDER BY import_id DESC"#,
        )?;

        let versions = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<ImportVersion>, _>>()?;
        Ok(versions)
    }

    /// 按版本ID查询
    pub fn find_by_id(&self, import_id: i64) -> RepositoryResult<Option<ImportVersion>> {
        let conn = self.get_conn()?;
        match conn.query_row(
            r#"SELECT import_id, file_name, import_date, order_count, line_count,
                      status, imported_by, error_message
               FROM import_version
               WHERE import_id = ?"#,
            params![import_id],
            Self::map_row,
        ) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 整版删除: 级联清除订单行 → 订单头 → 版本
    pub fn delete(&self, import_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        // 外键 ON DELETE CASCADE 负责级联; 此处校验存在性以便给出可读错误
        let affected = conn.execute(
            "DELETE FROM import_version WHERE import_id = ?",
            params![import_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ImportVersion".to_string(),
                id: import_id.to_string(),
            });
        }
        Ok(())
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ImportVersion> {
        let status_str: String = row.get(5)?;
        Ok(ImportVersion {
            import_id: row.get(0)?,
            file_name: row.get(1)?,
            import_date: NaiveDateTime::parse_from_str(&row.get::<_, String>(2)?, DATETIME_FMT)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
            order_count: row.get(3)?,
            line_count: row.get(4)?,
            status: ImportStatus::from_db_str(&status_str),
            imported_by: row.get(6)?,
            error_message: row.get(7)?,
        })
    }
}
