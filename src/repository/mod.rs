// ==========================================
// 客户释放单看板系统 - 仓储层
// ==========================================
// 红线: 仓储只做数据访问, 不做业务决策;
//       所有多表写入必须走事务
// ==========================================

pub mod error;
pub mod import_repo;
pub mod item_repo;
pub mod order_repo;
pub mod project_repo;
pub mod schedule_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use import_repo::ImportVersionRepository;
pub use item_repo::{ItemRepository, NewBomLine};
pub use order_repo::OrderRepository;
pub use project_repo::ProjectMappingRepository;
pub use schedule_repo::ScheduleRepository;
