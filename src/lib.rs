// ==========================================
// 客户释放单看板系统 - 计划支持核心
// ==========================================
// 分层:
// - domain     领域实体与网格模型
// - parser     释放单文本解析 (纯函数)
// - repository SQLite 数据访问 (事务边界)
// - engine     BOM 展开 / MRP / 排程 / 看板投影
// - api        核心边界 (错误折叠为 ApiError)
// - app        装配与统一响应
// ==========================================

pub mod api;
pub mod app;
pub mod calendar;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod export;
pub mod logging;
pub mod parser;
pub mod repository;

/// 应用名称
pub const APP_NAME: &str = "release-kanban";

/// 版本号 (取自 Cargo.toml)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
