// ==========================================
// 客户释放单看板系统 - API 层
// ==========================================
// 红线: 本层是核心边界, 错误一律折叠为 ApiError, 不向外 panic
// ==========================================

pub mod error;
pub mod import_api;
pub mod inventory_api;
pub mod kanban_api;
pub mod mrp_api;
pub mod schedule_api;

pub use error::{ApiError, ApiResult};
pub use import_api::ImportResponse;
pub use kanban_api::KanbanQuery;
pub use mrp_api::{MrpQuery, MrpResponse};
pub use schedule_api::DailyMrpResponse;
