// ==========================================
// 客户释放单看板系统 - 项目排序权威
// ==========================================
// 职责: 料号 → 项目优先级/项目名的三级回落查询
// 红线: 排序只认 project_mapping 表数据, 引擎内禁止硬编码优先级表
// ==========================================

use std::collections::HashMap;

use crate::repository::{ProjectMappingRepository, RepositoryResult};

/// 未匹配项目的行优先级 (排在所有已映射行之后)
pub const UNMATCHED_ORDER: i64 = i64::MAX;

/// 未匹配项目的展示名
pub const UNKNOWN_PROJECT: &str = "UNKNOWN";

// ==========================================
// ProjectMap - 项目映射快照
// ==========================================
// 一次加载, 只读查询; 引擎不持有连接
#[derive(Debug, Clone, Default)]
pub struct ProjectMap {
    by_code: HashMap<String, (i64, String)>, // code → (display_order, project_name)
}

impl ProjectMap {
    /// 从仓储加载全部生效映射
    pub fn load(repo: &ProjectMappingRepository) -> RepositoryResult<ProjectMap> {
        let mut by_code = HashMap::new();
        for mapping in repo.list_active()? {
            by_code.insert(
                mapping.project_code,
                (mapping.display_order, mapping.project_name),
            );
        }
        Ok(ProjectMap { by_code })
    }

    #[cfg(test)]
    pub fn from_entries(entries: &[(&str, &str, i64)]) -> ProjectMap {
        let mut by_code = HashMap::new();
        for (code, name, order) in entries {
            by_code.insert(code.to_string(), (*order, name.to_string()));
        }
        ProjectMap { by_code }
    }

    /// 料号的行优先级; 未匹配返回 [`UNMATCHED_ORDER`]
    pub fn get_order(&self, pn: &str) -> i64 {
        self.lookup(pn).map(|(order, _)| order).unwrap_or(UNMATCHED_ORDER)
    }

    /// 料号的项目名; 未匹配返回 "UNKNOWN"
    pub fn get_project_name(&self, pn: &str) -> String {
        self.lookup(pn)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| UNKNOWN_PROJECT.to_string())
    }

    // 三级回落: 全码 → 去尾字母 → 再去尾数字
    fn lookup(&self, pn: &str) -> Option<(i64, &str)> {
        if let Some((order, name)) = self.by_code.get(pn) {
            return Some((*order, name.as_str()));
        }

        let stripped_letter = Self::strip_trailing(pn, char::is_alphabetic);
        if stripped_letter != pn {
            if let Some((order, name)) = self.by_code.get(stripped_letter) {
                return Some((*order, name.as_str()));
            }
        }

        let stripped_digit = Self::strip_trailing(stripped_letter, |c| c.is_ascii_digit());
        if stripped_digit != pn {
            if let Some((order, name)) = self.by_code.get(stripped_digit) {
                return Some((*order, name.as_str()));
            }
        }

        None
    }

    fn strip_trailing(pn: &str, pred: impl Fn(char) -> bool) -> &str {
        match pn.chars().last() {
            Some(c) if pred(c) => &pn[..pn.len() - c.len_utf8()],
            _ => pn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> ProjectMap {
        ProjectMap::from_entries(&[
            ("R001H368", "凤凰", 10),
            ("R001P320", "麒麟", 30),
            ("M55", "玄武", 20),
        ])
    }

    #[test]
    fn test_three_tier_lookup() {
        let m = map();
        // 全码命中
        assert_eq!(m.get_order("R001H368"), 10);
        // 去尾字母命中
        assert_eq!(m.get_order("R001H368B"), 10);
        // 去尾字母后再去尾数字命中 (M55 ← M551 ← M551C)
        assert_eq!(m.get_order("M551C"), 20);
        // 未匹配
        assert_eq!(m.get_order("Z999X"), UNMATCHED_ORDER);
        assert_eq!(m.get_project_name("Z999X"), "UNKNOWN");
    }

    #[test]
    fn test_project_name() {
        let m = map();
        assert_eq!(m.get_project_name("R001P320C"), "麒麟");
    }
}
