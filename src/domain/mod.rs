// ==========================================
// 客户释放单看板系统 - 领域层
// ==========================================
// 职责: 实体与类型定义, 不含持久化与业务规则
// ==========================================

pub mod grid;
pub mod item;
pub mod order;
pub mod project;
pub mod schedule;
pub mod types;

// 重导出核心实体
pub use grid::{CellStyle, GridCell, GridColumn, GridModel, GridRow, RowKey};
pub use item::{BomComponent, BomLine, InventoryBalance, Item};
pub use order::{
    AggregateRow, ImportVersion, LineWithHeader, OrderHeader, OrderLine, ParseOutcome,
    ParsedHeader, ParsedLine,
};
pub use project::ProjectMapping;
pub use schedule::{ProductionSchedule, ScheduleLine, ScheduleMrpRow};
pub use types::{ImportStatus, ItemType, OrderType, OrderTypeFilter, ScheduleStatus};
