// ==========================================
// 客户释放单看板系统 - BOM 展开引擎
// ==========================================
// 职责: 父件需求 → 组件累计用量的深度优先展开
// 口径: 实际用量 = 上级用量 × qty_per × (1 + scrap)
// 红线: 环检测基于祖先链; 命中环的根整体弃算
// ==========================================

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::warn;

use crate::domain::item::BomComponent;
use crate::repository::{ItemRepository, RepositoryError};

/// BOM 展开错误
#[derive(Error, Debug)]
pub enum BomError {
    /// 祖先链出现回边, 该根的展开整体作废
    #[error("BOM 存在循环引用: 根物料 {root_code}, 回边物料 item_id={cycle_item_id}")]
    CyclicBom { root_code: String, cycle_item_id: i64 },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type BomResult<T> = Result<T, BomError>;

// ==========================================
// BomExpander - BOM 展开引擎
// ==========================================
pub struct BomExpander<'a> {
    item_repo: &'a ItemRepository,
}

impl<'a> BomExpander<'a> {
    pub fn new(item_repo: &'a ItemRepository) -> Self {
        Self { item_repo }
    }

    /// 展开某父件的组件需求
    ///
    /// 返回全部后代组件 (含中间半成品), 累计实际用量, 按物料代码升序。
    /// 父件本身不在结果内。
    ///
    /// - demand_date 为 None 时, 生效期按"今日"口径过滤
    pub fn expand(
        &self,
        parent_item_id: i64,
        qty: f64,
        demand_date: Option<NaiveDate>,
    ) -> BomResult<Vec<BomComponent>> {
        let effective_date = demand_date.unwrap_or_else(|| chrono::Local::now().date_naive());

        let mut accumulated: HashMap<i64, f64> = HashMap::new();
        let mut ancestors: HashSet<i64> = HashSet::new();
        ancestors.insert(parent_item_id);

        self.walk(
            parent_item_id,
            parent_item_id,
            qty,
            effective_date,
            &mut ancestors,
            &mut accumulated,
        )?;

        let mut components = Vec::with_capacity(accumulated.len());
        for (item_id, actual_qty) in accumulated {
            let item = self.item_repo.find_by_id(item_id)?.ok_or_else(|| {
                RepositoryError::NotFound {
                    entity: "Item".to_string(),
                    id: item_id.to_string(),
                }
            })?;
            components.push(BomComponent {
                item_id: item.item_id,
                item_code: item.item_code,
                item_name: item.cn_name,
                item_spec: item.item_spec,
                item_type: item.item_type,
                brand: item.brand,
                actual_qty,
            });
        }
        components.sort_by(|a, b| a.item_code.cmp(&b.item_code));
        Ok(components)
    }

    fn walk(
        &self,
        root_item_id: i64,
        node_item_id: i64,
        node_qty: f64,
        effective_date: NaiveDate,
        ancestors: &mut HashSet<i64>,
        accumulated: &mut HashMap<i64, f64>,
    ) -> BomResult<()> {
        let lines = self.item_repo.bom_lines(node_item_id)?;

        for line in lines {
            if !line.is_effective_on(effective_date) {
                continue;
            }

            if ancestors.contains(&line.child_item_id) {
                let root_code = self
                    .item_repo
                    .find_by_id(root_item_id)?
                    .map(|i| i.item_code)
                    .unwrap_or_else(|| root_item_id.to_string());
                warn!(
                    root = %root_code,
                    cycle_item_id = line.child_item_id,
                    "BOM 循环引用, 弃算该根"
                );
                return Err(BomError::CyclicBom {
                    root_code,
                    cycle_item_id: line.child_item_id,
                });
            }

            let actual = node_qty * line.qty_per * (1.0 + line.scrap.unwrap_or(0.0));
            *accumulated.entry(line.child_item_id).or_insert(0.0) += actual;

            ancestors.insert(line.child_item_id);
            self.walk(
                root_item_id,
                line.child_item_id,
                actual,
                effective_date,
                ancestors,
                accumulated,
            )?;
            ancestors.remove(&line.child_item_id);
        }
        Ok(())
    }
}
