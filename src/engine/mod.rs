// ==========================================
// 客户释放单看板系统 - 引擎层
// ==========================================
// 红线: 引擎不持有连接与全局状态, 仓储句柄由调用方注入
// ==========================================

pub mod bom;
pub mod importer;
pub mod kanban;
pub mod mrp;
pub mod project_map;
pub mod scheduling;

pub use bom::{BomError, BomExpander, BomResult};
pub use importer::{ImportReport, ReleaseImporter};
pub use kanban::KanbanProjector;
pub use mrp::{MrpBucketEntry, MrpComponentRow, MrpEngine, MrpResult};
pub use project_map::{ProjectMap, UNKNOWN_PROJECT, UNMATCHED_ORDER};
pub use scheduling::{DailyMrpReport, SchedulingEngine};
