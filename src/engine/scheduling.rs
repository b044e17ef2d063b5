// ==========================================
// 客户释放单看板系统 - 生产排程引擎
// ==========================================
// 职责: 周列 → 日列派生, 计划单元格编辑, 日桶 MRP 重建
// 口径: 选中周锚点 w 展开为 [w-6 .. w] 共 7 天; 重复周合并
// 红线: schedule_mrp 重建必须整删整插 (仓储单事务完成)
// ==========================================

use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::calendar;
use crate::domain::schedule::{ProductionSchedule, ScheduleLine, ScheduleMrpRow};
use crate::domain::types::ItemType;
use crate::engine::bom::{BomError, BomExpander};
use crate::repository::{
    ItemRepository, RepositoryError, RepositoryResult, ScheduleRepository,
};

/// 日桶 MRP 重建结果
#[derive(Debug, Clone, Default)]
pub struct DailyMrpReport {
    pub row_count: usize,
    pub warnings: Vec<String>,
}

// ==========================================
// SchedulingEngine - 排程引擎
// ==========================================
pub struct SchedulingEngine<'a> {
    schedule_repo: &'a ScheduleRepository,
    item_repo: &'a ItemRepository,
}

impl<'a> SchedulingEngine<'a> {
    pub fn new(schedule_repo: &'a ScheduleRepository, item_repo: &'a ItemRepository) -> Self {
        Self { schedule_repo, item_repo }
    }

    // ==========================================
    // 日列派生
    // ==========================================

    /// 选中周集合 → 有序去重日列
    ///
    /// 每个选中周取其 ISO 周锚点 w (周一), 展开为 {w-6, .., w};
    /// 重叠周的日期只保留一次。
    pub fn derive_day_columns(selected_weeks: &[NaiveDate]) -> Vec<NaiveDate> {
        let mut days: BTreeSet<NaiveDate> = BTreeSet::new();
        for &week in selected_weeks {
            let anchor = calendar::week_start(week);
            for offset in 0..7 {
                days.insert(anchor - Duration::days(6 - offset));
            }
        }
        days.into_iter().collect()
    }

    /// 各选中周的锚点日 (展示层的重点列)
    pub fn week_anchors(selected_weeks: &[NaiveDate]) -> Vec<NaiveDate> {
        let anchors: BTreeSet<NaiveDate> = selected_weeks
            .iter()
            .map(|&w| calendar::week_start(w))
            .collect();
        anchors.into_iter().collect()
    }

    // ==========================================
    // 计划编辑
    // ==========================================

    /// 单格写入
    pub fn set_cell(
        &self,
        schedule_id: &str,
        item_id: i64,
        production_date: NaiveDate,
        planned_qty: f64,
    ) -> RepositoryResult<()> {
        self.require_schedule(schedule_id)?;
        self.schedule_repo
            .upsert_line(schedule_id, item_id, production_date, planned_qty)
    }

    /// 批量写入 (单事务)
    pub fn batch_set_cells(&self, lines: &[ScheduleLine]) -> RepositoryResult<usize> {
        if let Some(first) = lines.first() {
            self.require_schedule(&first.schedule_id)?;
        }
        self.schedule_repo.upsert_lines(lines)
    }

    // ==========================================
    // 日桶 MRP 重建
    // ==========================================

    /// 按计划行重建某排程的 MRP 派生行 (整删整插)
    ///
    /// 逐日推进: net = max(0, required - onhand);
    /// 期末在手按 onhand + required 滚动 (当期产出视为后续日的投入)。
    pub fn calculate_daily_mrp(
        &self,
        schedule_id: &str,
        include_types: &[ItemType],
    ) -> RepositoryResult<DailyMrpReport> {
        self.require_schedule(schedule_id)?;
        let plan_lines = self.schedule_repo.lines_for(schedule_id)?;
        info!(
            schedule_id = %schedule_id,
            plan_lines = plan_lines.len(),
            "日桶 MRP 重建开始"
        );

        let expander = BomExpander::new(self.item_repo);
        let mut warnings: Vec<String> = Vec::new();
        let mut cyclic_roots: BTreeSet<String> = BTreeSet::new();

        // required[组件][生产日] → 需求量
        let mut required: BTreeMap<i64, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        for line in &plan_lines {
            if line.planned_qty <= 0.0 {
                continue;
            }
            let components = match expander.expand(
                line.item_id,
                line.planned_qty,
                Some(line.production_date),
            ) {
                Ok(c) => c,
                Err(BomError::CyclicBom { root_code, .. }) => {
                    if cyclic_roots.insert(root_code.clone()) {
                        warnings.push(format!("BOM 循环引用, 已跳过: {}", root_code));
                    }
                    continue;
                }
                Err(BomError::Repository(e)) => return Err(e),
            };

            for comp in components {
                if !include_types.is_empty() && !include_types.contains(&comp.item_type) {
                    continue;
                }
                *required
                    .entry(comp.item_id)
                    .or_default()
                    .entry(line.production_date)
                    .or_insert(0.0) += comp.actual_qty;
            }
        }

        let on_hand = self.item_repo.on_hand_map()?;

        let mut rows: Vec<ScheduleMrpRow> = Vec::new();
        for (item_id, days) in required {
            let mut onhand = on_hand.get(&item_id).copied().unwrap_or(0.0);
            for (production_date, required_qty) in days {
                let net_qty = (required_qty - onhand).max(0.0);
                rows.push(ScheduleMrpRow {
                    schedule_id: schedule_id.to_string(),
                    item_id,
                    production_date,
                    required_qty,
                    on_hand_qty: onhand,
                    net_qty,
                });
                onhand += required_qty;
            }
        }

        let row_count = self.schedule_repo.replace_mrp_rows(schedule_id, &rows)?;
        info!(schedule_id = %schedule_id, row_count, "日桶 MRP 重建完成");

        Ok(DailyMrpReport { row_count, warnings })
    }

    fn require_schedule(&self, schedule_id: &str) -> RepositoryResult<ProductionSchedule> {
        self.schedule_repo
            .find_by_id(schedule_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ProductionSchedule".to_string(),
                id: schedule_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_derive_day_columns_single_week() {
        // 锚点 2025-08-18 (周一) → {08-12 .. 08-18}
        let days = SchedulingEngine::derive_day_columns(&[d(2025, 8, 18)]);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], d(2025, 8, 12));
        assert_eq!(days[6], d(2025, 8, 18));
    }

    #[test]
    fn test_derive_day_columns_dedup_and_order() {
        // 同周重复选择合并; 相邻周的跨度不重叠但保持有序
        let days = SchedulingEngine::derive_day_columns(&[
            d(2025, 8, 25),
            d(2025, 8, 18),
            d(2025, 8, 20), // 与 08-18 同周
        ]);
        assert_eq!(days.len(), 14);
        assert_eq!(days[0], d(2025, 8, 12));
        assert_eq!(days[13], d(2025, 8, 25));
        // 严格递增
        assert!(days.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_week_anchors() {
        let anchors = SchedulingEngine::week_anchors(&[d(2025, 8, 20), d(2025, 8, 25)]);
        assert_eq!(anchors, vec![d(2025, 8, 18), d(2025, 8, 25)]);
    }
}
