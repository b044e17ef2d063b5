// ==========================================
// 客户释放单看板系统 - 项目映射仓储
// ==========================================
// 职责: project_mapping 数据访问
// 红线: display_order 是看板行排序的唯一权威;
//       硬编码优先级表只允许作为种子数据写入本表
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::domain::project::ProjectMapping;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// ProjectMappingRepository - 项目映射仓储
// ==========================================
pub struct ProjectMappingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectMappingRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或更新映射 (按 project_code 幂等)
    pub fn upsert(
        &self,
        project_code: &str,
        project_name: &str,
        item_id: Option<i64>,
        brand: Option<&str>,
        display_order: i64,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO project_mapping (
                project_code, project_name, item_id, brand, is_active, display_order
            ) VALUES (?, ?, ?, ?, 1, ?)
            ON CONFLICT(project_code) DO UPDATE SET
                project_name = excluded.project_name,
                item_id = excluded.item_id,
                brand = excluded.brand,
                display_order = excluded.display_order"#,
            params![project_code, project_name, item_id, brand, display_order],
        )?;

        let id: i64 = conn.query_row(
            "SELECT mapping_id FROM project_mapping WHERE project_code = ?",
            params![project_code],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn find_by_code(&self, project_code: &str) -> RepositoryResult<Option<ProjectMapping>> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"SELECT mapping_id, project_code, project_name, item_id, brand,
                      is_active, display_order
               FROM project_mapping WHERE project_code = ?"#,
            params![project_code],
            Self::map_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// 全部生效映射, 按 display_order 有序
    pub fn list_active(&self) -> RepositoryResult<Vec<ProjectMapping>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT mapping_id, project_code, project_name, item_id, brand,
                      is_active, display_order
               FROM project_mapping
               WHERE is_active = 1
               ORDER BY display_order, project_code"#,
        )?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<ProjectMapping>, _>>()?;
        Ok(rows)
    }

    pub fn delete(&self, mapping_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM project_mapping WHERE mapping_id = ?",
            params![mapping_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProjectMapping".to_string(),
                id: mapping_id.to_string(),
            });
        }
        Ok(())
    }

    /// 写入种子映射 (已存在的 project_code 跳过)
    ///
    /// 仅供建库初始化; 运行期排序只认表内数据。
    pub fn seed_defaults(&self, seeds: &[(&str, &str, i64)]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        for (code, name, order) in seeds {
            inserted += tx.execute(
                r#"INSERT OR IGNORE INTO project_mapping (
                    project_code, project_name, item_id, brand, is_active, display_order
                ) VALUES (?, ?, NULL, NULL, 1, ?)"#,
                params![code, name, order],
            )?;
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ProjectMapping> {
        Ok(ProjectMapping {
            mapping_id: row.get(0)?,
            project_code: row.get(1)?,
            project_name: row.get(2)?,
            item_id: row.get(3)?,
            brand: row.get(4)?,
            is_active: row.get::<_, i64>(5)? != 0,
            display_order: row.get(6)?,
        })
    }
}
