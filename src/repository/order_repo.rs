// ==========================================
// 客户释放单看板系统 - 订单仓储
// ==========================================
// 职责: customer_orders / customer_order_lines 的事务化写入与读取
// 红线: 行读取只选择行表真实存在的列, 头字段显式 JOIN 补充
//       (历史缺陷: 曾在行查询中选择头表独有列)
// ==========================================

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::domain::order::{
    AggregateRow, LineWithHeader, NewOrder, OrderHeader, OrderLine,
};
use crate::domain::types::{ImportStatus, OrderType, OrderTypeFilter};
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

fn parse_opt_date_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let s: Option<String> = row.get(idx)?;
    Ok(s.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FMT).ok()))
}

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入路径: 一次导入一个事务
    // ==========================================

    /// 落库一次成功解析的导入
    ///
    /// 单事务完成: 版本行 → 订单头 (键重复时复用) → 订单行 (键重复时忽略)
    /// → 回写头/行计数。失败时整体回滚, 不留部分版本。
    ///
    /// # 返回
    /// - (import_id, order_count, line_count)
    pub fn persist_import(
        &self,
        file_name: &str,
        imported_by: Option<&str>,
        orders: &[NewOrder],
    ) -> RepositoryResult<(i64, i64, i64)> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO import_version (
                file_name, import_date, order_count, line_count,
                status, imported_by, error_message
            ) VALUES (?, ?, 0, 0, ?, ?, NULL)"#,
            params![
                file_name,
                Utc::now().naive_utc().format(DATETIME_FMT).to_string(),
                ImportStatus::Success.to_db_str(),
                imported_by,
            ],
        )?;
        let import_id = tx.last_insert_rowid();

        let mut order_count: i64 = 0;
        let mut line_count: i64 = 0;

        for order in orders {
            // 头键 (import_id, supplier, cw, year): 已存在则复用 order_id
            let existing: Option<i64> = tx
                .query_row(
                    r#"SELECT order_id FROM customer_orders
                       WHERE import_id = ? AND supplier_code = ?
                         AND calendar_week = ? AND order_year = ?"#,
                    params![
                        import_id,
                        &order.supplier_code,
                        &order.calendar_week,
                        order.order_year
                    ],
                    |row| row.get(0),
                )
                .optional()?;

            let order_id = match existing {
                Some(id) => id,
                None => {
                    tx.execute(
                        r#"INSERT INTO customer_orders (
                            order_number, import_id, supplier_code, supplier_name,
                            calendar_week, order_year, release_date, release_id,
                            purchase_order, receipt_quantity, cum_received, status
                        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'ACTIVE')"#,
                        params![
                            &order.order_number,
                            import_id,
                            &order.supplier_code,
                            &order.supplier_name,
                            &order.calendar_week,
                            order.order_year,
                            order.release_date.map(fmt_date),
                            &order.release_id,
                            &order.purchase_order,
                            order.receipt_quantity,
                            order.cum_received,
                        ],
                    )?;
                    order_count += 1;
                    tx.last_insert_rowid()
                }
            };

            for line in &order.lines {
                // 行键 (order_id, item_number, delivery_date): 重复静默去重
                let inserted = tx.execute(
                    r#"INSERT OR IGNORE INTO customer_order_lines (
                        order_id, import_id, item_number, item_description,
                        unit_of_measure, delivery_date, calendar_week, order_type,
                        required_qty, status
                    ) VALUES (?, ?, ?, NULL, NULL, ?, ?, ?, ?, 'OPEN')"#,
                    params![
                        order_id,
                        import_id,
                        &line.item_number,
                        fmt_date(line.delivery_date),
                        &line.calendar_week,
                        line.order_type.to_db_str(),
                        line.required_qty,
                    ],
                )?;
                line_count += inserted as i64;
            }
        }

        tx.execute(
            "UPDATE import_version SET order_count = ?, line_count = ? WHERE import_id = ?",
            params![order_count, line_count, import_id],
        )?;

        tx.commit()?;
        Ok((import_id, order_count, line_count))
    }

    // ==========================================
    // 读取路径
    // ==========================================

    /// 某版本的全部订单头
    pub fn orders_for_version(&self, import_id: i64) -> RepositoryResult<Vec<OrderHeader>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT order_id, order_number, import_id, supplier_code, supplier_name,
                      calendar_week, order_year, release_date, release_id,
                      purchase_order, receipt_quantity, cum_received, status
               FROM customer_orders
               WHERE import_id = ?
               ORDER BY supplier_code, calendar_week, order_year"#,
        )?;

        let headers = stmt
            .query_map(params![import_id], Self::map_header)?
            .collect::<Result<Vec<OrderHeader>, _>>()?;
        Ok(headers)
    }

    /// 某版本的全部订单行, 头字段显式 JOIN 补充
    pub fn lines_for_version(&self, import_id: i64) -> RepositoryResult<Vec<LineWithHeader>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT l.line_id, l.order_id, l.import_id, l.item_number,
                      l.item_description, l.unit_of_measure, l.delivery_date,
                      l.calendar_week, l.order_type, l.required_qty,
                      l.cumulative_qty, l.net_required_qty, l.in_transit_qty,
                      l.received_qty, l.status,
                      h.supplier_code, h.supplier_name, h.release_date,
                      h.release_id, h.purchase_order
               FROM customer_order_lines l
               JOIN customer_orders h ON h.order_id = l.order_id
               WHERE l.import_id = ?
               ORDER BY h.supplier_code, l.item_number, l.delivery_date"#,
        )?;

        let rows = stmt
            .query_map(params![import_id], |row| {
                Ok(LineWithHeader {
                    line: Self::map_line(row)?,
                    supplier_code: row.get(15)?,
                    supplier_name: row.get(16)?,
                    release_date: parse_opt_date_col(row, 17)?,
                    release_id: row.get(18)?,
                    purchase_order: row.get(19)?,
                })
            })?
            .collect::<Result<Vec<LineWithHeader>, _>>()?;
        Ok(rows)
    }

    /// 日期窗口内的需求行 (MRP 需求源)
    ///
    /// - import_id 为 None 时跨版本聚合
    /// - type_filter 按 F/P 过滤
    pub fn lines_in_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        import_id: Option<i64>,
        type_filter: OrderTypeFilter,
    ) -> RepositoryResult<Vec<LineWithHeader>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT l.line_id, l.order_id, l.import_id, l.item_number,
                      l.item_description, l.unit_of_measure, l.delivery_date,
                      l.calendar_week, l.order_type, l.required_qty,
                      l.cumulative_qty, l.net_required_qty, l.in_transit_qty,
                      l.received_qty, l.status,
                      h.supplier_code, h.supplier_name, h.release_date,
                      h.release_id, h.purchase_order
               FROM customer_order_lines l
               JOIN customer_orders h ON h.order_id = l.order_id
               WHERE l.delivery_date >= ?1 AND l.delivery_date <= ?2
                 AND (?3 IS NULL OR l.import_id = ?3)
               ORDER BY l.delivery_date, h.supplier_code, l.item_number"#,
        )?;

        let rows = stmt
            .query_map(
                params![fmt_date(start), fmt_date(end), import_id],
                |row| {
                    Ok(LineWithHeader {
                        line: Self::map_line(row)?,
                        supplier_code: row.get(15)?,
                        supplier_name: row.get(16)?,
                        release_date: parse_opt_date_col(row, 17)?,
                        release_id: row.get(18)?,
                        purchase_order: row.get(19)?,
                    })
                },
            )?
            .collect::<Result<Vec<LineWithHeader>, _>>()?;

        Ok(rows
            .into_iter()
            .filter(|r| type_filter.accepts(r.line.order_type))
            .collect())
    }

    /// 聚合视图: 按 (供应商, 料号, 释放日期, 释放ID, 版本, 交付日期, 周历) 分组
    ///
    /// 项目名称不进 SQL 分组, 由投影阶段按料号补充。
    pub fn aggregate(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        import_id: Option<i64>,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT h.supplier_code, l.item_number, h.release_date, h.release_id,
                      l.import_id, l.delivery_date, l.calendar_week,
                      SUM(CASE WHEN l.order_type = 'F' THEN l.required_qty ELSE 0 END) AS firm_qty,
                      SUM(CASE WHEN l.order_type = 'P' THEN l.required_qty ELSE 0 END) AS forecast_qty,
                      SUM(l.required_qty) AS total_qty
               FROM customer_order_lines l
               JOIN customer_orders h ON h.order_id = l.order_id
               WHERE (?1 IS NULL OR l.delivery_date >= ?1)
                 AND (?2 IS NULL OR l.delivery_date <= ?2)
                 AND (?3 IS NULL OR l.import_id = ?3)
               GROUP BY h.supplier_code, l.item_number, h.release_date, h.release_id,
                        l.import_id, l.delivery_date, l.calendar_week
               ORDER BY h.supplier_code, l.item_number, l.delivery_date"#,
        )?;

        let rows = stmt
            .query_map(
                params![date_from.map(fmt_date), date_to.map(fmt_date), import_id],
                |row| {
                    Ok(AggregateRow {
                        supplier_code: row.get(0)?,
                        item_number: row.get(1)?,
                        release_date: parse_opt_date_col(row, 2)?,
                        release_id: row.get(3)?,
                        project: None,
                        import_id: row.get(4)?,
                        delivery_date: parse_date_col(row, 5)?,
                        calendar_week: row.get(6)?,
                        firm_qty: row.get(7)?,
                        forecast_qty: row.get(8)?,
                        total_qty: row.get(9)?,
                    })
                },
            )?
            .collect::<Result<Vec<AggregateRow>, _>>()?;
        Ok(rows)
    }

    // ==========================================
    // 行映射
    // ==========================================

    fn map_header(row: &rusqlite::Row) -> rusqlite::Result<OrderHeader> {
        Ok(OrderHeader {
            order_id: row.get(0)?,
            order_number: row.get(1)?,
            import_id: row.get(2)?,
            supplier_code: row.get(3)?,
            supplier_name: row.get(4)?,
            calendar_week: row.get(5)?,
            order_year: row.get(6)?,
            release_date: parse_opt_date_col(row, 7)?,
            release_id: row.get(8)?,
            purchase_order: row.get(9)?,
            receipt_quantity: row.get(10)?,
            cum_received: row.get(11)?,
            status: row.get(12)?,
        })
    }

    fn map_line(row: &rusqlite::Row) -> rusqlite::Result<OrderLine> {
        let type_str: String = row.get(8)?;
        Ok(OrderLine {
            line_id: row.get(0)?,
            order_id: row.get(1)?,
            import_id: row.get(2)?,
            item_number: row.get(3)?,
            item_description: row.get(4)?,
            unit_of_measure: row.get(5)?,
            delivery_date: parse_date_col(row, 6)?,
            calendar_week: row.get(7)?,
            order_type: OrderType::from_db_str(&type_str),
            required_qty: row.get(9)?,
            cumulative_qty: row.get(10)?,
            net_required_qty: row.get(11)?,
            in_transit_qty: row.get(12)?,
            received_qty: row.get(13)?,
            status: row.get(14)?,
        })
    }
}
