// ==========================================
// 客户释放单看板系统 - 项目映射领域模型
// ==========================================
// 红线: display_order 是看板行排序的唯一权威,
//       UI 侧不允许再出现硬编码优先级表
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMapping {
    pub mapping_id: i64,
    pub project_code: String,
    pub project_name: String,
    pub item_id: Option<i64>,
    pub brand: Option<String>,
    pub is_active: bool,
    pub display_order: i64,
}
