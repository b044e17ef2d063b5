// ==========================================
// 客户释放单看板系统 - 生产排程仓储
// ==========================================
// 职责: production_schedule / schedule_lines / schedule_mrp 数据访问
// 红线: schedule_mrp 是派生表, 只允许整排程删除重建 (单事务)
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::schedule::{ProductionSchedule, ScheduleLine, ScheduleMrpRow};
use crate::domain::types::ScheduleStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

fn parse_date_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, DATE_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ==========================================
// ScheduleRepository - 排程仓储
// ==========================================
pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 排程 CRUD
    // ==========================================

    pub fn create(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<ProductionSchedule> {
        let schedule = ProductionSchedule {
            schedule_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            start_date,
            end_date,
            status: ScheduleStatus::Draft,
            created_at: Utc::now().naive_utc(),
        };

        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO production_schedule (
                schedule_id, name, start_date, end_date, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &schedule.schedule_id,
                &schedule.name,
                fmt_date(schedule.start_date),
                fmt_date(schedule.end_date),
                schedule.status.to_db_str(),
                schedule.created_at.format(DATETIME_FMT).to_string(),
            ],
        )?;
        Ok(schedule)
    }

    pub fn update(
        &self,
        schedule_id: &str,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: ScheduleStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"UPDATE production_schedule
               SET name = ?, start_date = ?, end_date = ?, status = ?
               WHERE schedule_id = ?"#,
            params![
                name,
                fmt_date(start_date),
                fmt_date(end_date),
                status.to_db_str(),
                schedule_id
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProductionSchedule".to_string(),
                id: schedule_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn delete(&self, schedule_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM production_schedule WHERE schedule_id = ?",
            params![schedule_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProductionSchedule".to_string(),
                id: schedule_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn find_by_id(&self, schedule_id: &str) -> RepositoryResult<Option<ProductionSchedule>> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"SELECT schedule_id, name, start_date, end_date, status, created_at
               FROM production_schedule WHERE schedule_id = ?"#,
            params![schedule_id],
            Self::map_schedule,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list(&self) -> RepositoryResult<Vec<ProductionSchedule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT schedule_id, name, start_date, end_date, status, created_at
               FROM production_schedule ORDER BY created_at DESC"#,
        )?;
        let rows = stmt
            .query_map([], Self::map_schedule)?
            .collect::<Result<Vec<ProductionSchedule>, _>>()?;
        Ok(rows)
    }

    // ==========================================
    // 排程明细 (计划单元格)
    // ==========================================

    /// 单元格写入: (排程, 物料, 生产日) 幂等覆盖
    pub fn upsert_line(
        &self,
        schedule_id: &str,
        item_id: i64,
        production_date: NaiveDate,
        planned_qty: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO schedule_lines (schedule_id, item_id, production_date, planned_qty)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(schedule_id, item_id, production_date)
               DO UPDATE SET planned_qty = excluded.planned_qty"#,
            params![schedule_id, item_id, fmt_date(production_date), planned_qty],
        )?;
        Ok(())
    }

    /// 批量单元格写入 (单事务)
    pub fn upsert_lines(&self, lines: &[ScheduleLine]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        for line in lines {
            tx.execute(
                r#"INSERT INTO schedule_lines (schedule_id, item_id, production_date, planned_qty)
                   VALUES (?, ?, ?, ?)
                   ON CONFLICT(schedule_id, item_id, production_date)
                   DO UPDATE SET planned_qty = excluded.planned_qty"#,
                params![
                    &line.schedule_id,
                    line.item_id,
                    fmt_date(line.production_date),
                    line.planned_qty
                ],
            )?;
        }
        tx.commit()?;
        Ok(lines.len())
    }

    /// 某排程全部明细, 按 (生产日, 物料) 有序
    pub fn lines_for(&self, schedule_id: &str) -> RepositoryResult<Vec<ScheduleLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT schedule_id, item_id, production_date, planned_qty
               FROM schedule_lines
               WHERE schedule_id = ?
               ORDER BY production_date, item_id"#,
        )?;
        let rows = stmt
            .query_map(params![schedule_id], |row| {
                Ok(ScheduleLine {
                    schedule_id: row.get(0)?,
                    item_id: row.get(1)?,
                    production_date: parse_date_col(row, 2)?,
                    planned_qty: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<ScheduleLine>, _>>()?;
        Ok(rows)
    }

    // ==========================================
    // 排程 MRP 派生行
    // ==========================================

    /// 整排程重建 MRP 行: 单事务内删除全部旧行并重插
    pub fn replace_mrp_rows(
        &self,
        schedule_id: &str,
        rows: &[ScheduleMrpRow],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM schedule_mrp WHERE schedule_id = ?",
            params![schedule_id],
        )?;
        for row in rows {
            tx.execute(
                r#"INSERT INTO schedule_mrp (
                    schedule_id, item_id, production_date,
                    required_qty, on_hand_qty, net_qty
                ) VALUES (?, ?, ?, ?, ?, ?)"#,
                params![
                    &row.schedule_id,
                    row.item_id,
                    fmt_date(row.production_date),
                    row.required_qty,
                    row.on_hand_qty,
                    row.net_qty
                ],
            )?;
        }

        tx.commit()?;
        Ok(rows.len())
    }

    /// 某排程全部 MRP 行, 按 (物料, 生产日) 有序
    pub fn mrp_rows(&self, schedule_id: &str) -> RepositoryResult<Vec<ScheduleMrpRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT schedule_id, item_id, production_date,
                      required_qty, on_hand_qty, net_qty
               FROM schedule_mrp
               WHERE schedule_id = ?
               ORDER BY item_id, production_date"#,
        )?;
        let rows = stmt
            .query_map(params![schedule_id], |row| {
                Ok(ScheduleMrpRow {
                    schedule_id: row.get(0)?,
                    item_id: row.get(1)?,
                    production_date: parse_date_col(row, 2)?,
                    required_qty: row.get(3)?,
                    on_hand_qty: row.get(4)?,
                    net_qty: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<ScheduleMrpRow>, _>>()?;
        Ok(rows)
    }

    fn map_schedule(row: &rusqlite::Row) -> rusqlite::Result<ProductionSchedule> {
        let status_str: String = row.get(4)?;
        Ok(ProductionSchedule {
            schedule_id: row.get(0)?,
            name: row.get(1)?,
            start_date: parse_date_col(row, 2)?,
            end_date: parse_date_col(row, 3)?,
            status: ScheduleStatus::from_db_str(&status_str),
            created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(5)?, DATETIME_FMT)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
        })
    }
}
