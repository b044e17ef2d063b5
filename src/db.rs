// ==========================================
// 客户释放单看板系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一建表入口，保证测试库与生产库 schema 一致
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启（删除版本时依赖级联删除）
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// 所有日期列以 TEXT 存储，格式 `%Y-%m-%d`；时间列格式 `%Y-%m-%d %H:%M:%S`。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- 导入版本: 一次释放单文件导入形成一个不可变版本
        CREATE TABLE IF NOT EXISTS import_version (
            import_id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_name TEXT NOT NULL,
            import_date TEXT NOT NULL,
            order_count INTEGER NOT NULL DEFAULT 0,
            line_count INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            imported_by TEXT,
            error_message TEXT
        );

        -- 订单头: 按 (导入版本, 供应商, 周历, 年度) 聚合
        CREATE TABLE IF NOT EXISTS customer_orders (
            order_id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_number TEXT NOT NULL,
            import_id INTEGER NOT NULL REFERENCES import_version(import_id) ON DELETE CASCADE,
            supplier_code TEXT NOT NULL,
            supplier_name TEXT,
            calendar_week TEXT NOT NULL,
            order_year INTEGER NOT NULL,
            release_date TEXT,
            release_id TEXT,
            purchase_order TEXT,
            receipt_quantity REAL,
            cum_received REAL,
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            UNIQUE(import_id, supplier_code, calendar_week, order_year)
        );

        -- 订单行: 按 (订单头, 料号, 交付日期) 唯一
        CREATE TABLE IF NOT EXISTS customer_order_lines (
            line_id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL REFERENCES customer_orders(order_id) ON DELETE CASCADE,
            import_id INTEGER NOT NULL REFERENCES import_version(import_id) ON DELETE CASCADE,
            item_number TEXT NOT NULL,
            item_description TEXT,
            unit_of_measure TEXT,
            delivery_date TEXT NOT NULL,
            calendar_week TEXT NOT NULL,
            order_type TEXT NOT NULL,
            required_qty REAL NOT NULL,
            cumulative_qty REAL,
            net_required_qty REAL,
            in_transit_qty REAL,
            received_qty REAL,
            status TEXT NOT NULL DEFAULT 'OPEN',
            UNIQUE(order_id, item_number, delivery_date)
        );

        CREATE INDEX IF NOT EXISTS idx_order_lines_import
            ON customer_order_lines(import_id);
        CREATE INDEX IF NOT EXISTS idx_order_lines_delivery
            ON customer_order_lines(delivery_date);

        -- 物料主数据
        CREATE TABLE IF NOT EXISTS items (
            item_id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_code TEXT NOT NULL UNIQUE,
            cn_name TEXT NOT NULL,
            item_spec TEXT,
            brand TEXT,
            item_type TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        -- BOM 头: 每个父件至多一张 BOM
        CREATE TABLE IF NOT EXISTS bom_header (
            bom_id INTEGER PRIMARY KEY AUTOINCREMENT,
            parent_item_id INTEGER NOT NULL UNIQUE REFERENCES items(item_id) ON DELETE CASCADE
        );

        -- BOM 行: 组件清单（含损耗率与生效窗口）
        CREATE TABLE IF NOT EXISTS bom_lines (
            bom_line_id INTEGER PRIMARY KEY AUTOINCREMENT,
            bom_id INTEGER NOT NULL REFERENCES bom_header(bom_id) ON DELETE CASCADE,
            line_no INTEGER NOT NULL,
            child_item_id INTEGER NOT NULL REFERENCES items(item_id),
            qty_per REAL NOT NULL,
            scrap REAL,
            effective_from TEXT,
            effective_to TEXT,
            UNIQUE(bom_id, line_no)
        );

        -- 库存余额: 按库位存储，引擎只读汇总
        CREATE TABLE IF NOT EXISTS inventory_balance (
            balance_id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id INTEGER NOT NULL REFERENCES items(item_id) ON DELETE CASCADE,
            location TEXT NOT NULL DEFAULT 'MAIN',
            qty_on_hand REAL NOT NULL DEFAULT 0,
            UNIQUE(item_id, location)
        );

        -- 项目映射: 看板行排序的唯一权威 (display_order)
        CREATE TABLE IF NOT EXISTS project_mapping (
            mapping_id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_code TEXT NOT NULL UNIQUE,
            project_name TEXT NOT NULL,
            item_id INTEGER REFERENCES items(item_id) ON DELETE SET NULL,
            brand TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            display_order INTEGER NOT NULL
        );

        -- 生产排程
        CREATE TABLE IF NOT EXISTS production_schedule (
            schedule_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        -- 排程明细: (排程, 物料, 生产日) 唯一
        CREATE TABLE IF NOT EXISTS schedule_lines (
            schedule_id TEXT NOT NULL REFERENCES production_schedule(schedule_id) ON DELETE CASCADE,
            item_id INTEGER NOT NULL REFERENCES items(item_id),
            production_date TEXT NOT NULL,
            planned_qty REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (schedule_id, item_id, production_date)
        );

        -- 排程 MRP 派生行: 每次 calc_daily_mrp 整体重建
        CREATE TABLE IF NOT EXISTS schedule_mrp (
            schedule_id TEXT NOT NULL REFERENCES production_schedule(schedule_id) ON DELETE CASCADE,
            item_id INTEGER NOT NULL REFERENCES items(item_id),
            production_date TEXT NOT NULL,
            required_qty REAL NOT NULL DEFAULT 0,
            on_hand_qty REAL NOT NULL DEFAULT 0,
            net_qty REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (schedule_id, item_id, production_date)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        // 重复执行不应报错
        init_schema(&conn).unwrap();

        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }
}
