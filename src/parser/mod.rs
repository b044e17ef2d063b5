// ==========================================
// 客户释放单看板系统 - 解析层
// ==========================================
// 红线: 解析器是纯函数, 不落库、不排序、不做跨行聚合
// ==========================================

pub mod release_parser;

pub use release_parser::ReleaseParser;
