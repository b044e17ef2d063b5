// ==========================================
// 客户释放单看板系统 - 物料/BOM/库存仓储
// ==========================================
// 职责: items / bom_header / bom_lines / inventory_balance 数据访问
// 口径: 库存按库位存储, 引擎只读跨库位汇总
// ==========================================

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::item::{BomLine, InventoryBalance, Item};
use crate::domain::types::ItemType;
use crate::repository::error::{RepositoryError, RepositoryResult};

const DATE_FMT: &str = "%Y-%m-%d";

/// BOM 行写入参数
#[derive(Debug, Clone)]
pub struct NewBomLine {
    pub child_item_id: i64,
    pub qty_per: f64,
    pub scrap: Option<f64>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
}

// ==========================================
// ItemRepository - 物料仓储
// ==========================================
pub struct ItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ItemRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 物料主数据
    // ==========================================

    /// 新增或更新物料 (按 item_code 幂等)
    pub fn upsert_item(
        &self,
        item_code: &str,
        cn_name: &str,
        item_spec: Option<&str>,
        brand: Option<&str>,
        item_type: ItemType,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO items (item_code, cn_name, item_spec, brand, item_type, is_active)
               VALUES (?, ?, ?, ?, ?, 1)
               ON CONFLICT(item_code) DO UPDATE SET
                   cn_name = excluded.cn_name,
                   item_spec = excluded.item_spec,
                   brand = excluded.brand,
                   item_type = excluded.item_type"#,
            params![item_code, cn_name, item_spec, brand, item_type.to_db_str()],
        )?;

        let id: i64 = conn.query_row(
            "SELECT item_id FROM items WHERE item_code = ?",
            params![item_code],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn find_by_code(&self, item_code: &str) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"SELECT item_id, item_code, cn_name, item_spec, brand, item_type, is_active
               FROM items WHERE item_code = ?"#,
            params![item_code],
            Self::map_item,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn find_by_id(&self, item_id: i64) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"SELECT item_id, item_code, cn_name, item_spec, brand, item_type, is_active
               FROM items WHERE item_id = ?"#,
            params![item_id],
            Self::map_item,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_items(&self) -> RepositoryResult<Vec<Item>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT item_id, item_code, cn_name, item_spec, brand, item_type, is_active
               FROM items ORDER BY item_code"#,
        )?;
        let items = stmt
            .query_map([], Self::map_item)?
            .collect::<Result<Vec<Item>, _>>()?;
        Ok(items)
    }

    // ==========================================
    // BOM
    // ==========================================

    /// 整表替换某父件的 BOM (事务化)
    pub fn set_bom(&self, parent_item_id: i64, lines: &[NewBomLine]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO bom_header (parent_item_id) VALUES (?)",
            params![parent_item_id],
        )?;
        let bom_id: i64 = tx.query_row(
            "SELECT bom_id FROM bom_header WHERE parent_item_id = ?",
            params![parent_item_id],
            |row| row.get(0),
        )?;

        tx.execute("DELETE FROM bom_lines WHERE bom_id = ?", params![bom_id])?;
        for (no, line) in lines.iter().enumerate() {
            tx.execute(
                r#"INSERT INTO bom_lines (
                    bom_id, line_no, child_item_id, qty_per, scrap,
                    effective_from, effective_to
                ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    bom_id,
                    (no + 1) as i64,
                    line.child_item_id,
                    line.qty_per,
                    line.scrap,
                    line.effective_from.map(|d| d.format(DATE_FMT).to_string()),
                    line.effective_to.map(|d| d.format(DATE_FMT).to_string()),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// 某父件的 BOM 行, 按 line_no 有序; 无 BOM 时返回空表
    pub fn bom_lines(&self, parent_item_id: i64) -> RepositoryResult<Vec<BomLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT b.bom_line_id, b.bom_id, b.line_no, b.child_item_id,
                      b.qty_per, b.scrap, b.effective_from, b.effective_to
               FROM bom_lines b
               JOIN bom_header h ON h.bom_id = b.bom_id
               WHERE h.parent_item_id = ?
               ORDER BY b.line_no"#,
        )?;

        let lines = stmt
            .query_map(params![parent_item_id], |row| {
                Ok(BomLine {
                    bom_line_id: row.get(0)?,
                    bom_id: row.get(1)?,
                    line_no: row.get(2)?,
                    child_item_id: row.get(3)?,
                    qty_per: row.get(4)?,
                    scrap: row.get(5)?,
                    effective_from: row
                        .get::<_, Option<String>>(6)?
                        .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FMT).ok()),
                    effective_to: row
                        .get::<_, Option<String>>(7)?
                        .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FMT).ok()),
                })
            })?
            .collect::<Result<Vec<BomLine>, _>>()?;
        Ok(lines)
    }

    // ==========================================
    // 库存
    // ==========================================

    /// 设置某库位在手量 (幂等)
    pub fn set_on_hand(&self, item_id: i64, location: &str, qty: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO inventory_balance (item_id, location, qty_on_hand)
               VALUES (?, ?, ?)
               ON CONFLICT(item_id, location) DO UPDATE SET qty_on_hand = excluded.qty_on_hand"#,
            params![item_id, location, qty],
        )?;
        Ok(())
    }

    /// 某物料分库位余额, 按库位升序
    pub fn inventory_for(&self, item_id: i64) -> RepositoryResult<Vec<InventoryBalance>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT item_id, location, qty_on_hand
               FROM inventory_balance WHERE item_id = ? ORDER BY location"#,
        )?;
        let balances = stmt
            .query_map(params![item_id], |row| {
                Ok(InventoryBalance {
                    item_id: row.get(0)?,
                    location: row.get(1)?,
                    qty_on_hand: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<InventoryBalance>, _>>()?;
        Ok(balances)
    }

    /// 单物料跨库位汇总在手量
    pub fn on_hand_total(&self, item_id: i64) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: Option<f64> = conn.query_row(
            "SELECT SUM(qty_on_hand) FROM inventory_balance WHERE item_id = ?",
            params![item_id],
            |row| row.get(0),
        )?;
        Ok(total.unwrap_or(0.0))
    }

    /// 全量在手量快照 {item_id → 汇总量}
    pub fn on_hand_map(&self) -> RepositoryResult<HashMap<i64, f64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT item_id, SUM(qty_on_hand) FROM inventory_balance GROUP BY item_id",
        )?;
        let mut map = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Option<f64>>(1)?))
        })?;
        for row in rows {
            let (item_id, qty) = row?;
            map.insert(item_id, qty.unwrap_or(0.0));
        }
        Ok(map)
    }

    fn map_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
        let type_str: String = row.get(5)?;
        Ok(Item {
            item_id: row.get(0)?,
            item_code: row.get(1)?,
            cn_name: row.get(2)?,
            item_spec: row.get(3)?,
            brand: row.get(4)?,
            item_type: ItemType::from_db_str(&type_str),
            is_active: row.get::<_, i64>(6)? != 0,
        })
    }
}
