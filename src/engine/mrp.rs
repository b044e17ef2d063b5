// ==========================================
// 客户释放单看板系统 - MRP 计算引擎
// ==========================================
// 职责: 窗口内需求 → 组件分桶 required / projected
// 口径: 周桶键 = ISO 周周一; 日桶键 = 交付日当天
// 红线: 未知料号跳过并记警告, 不中断整体计算
// ==========================================

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

use crate::calendar;
use crate::domain::item::Item;
use crate::domain::types::{ItemType, OrderTypeFilter};
use crate::engine::bom::{BomError, BomExpander};
use crate::repository::{ItemRepository, OrderRepository, RepositoryResult};

// ==========================================
// 输出结构
// ==========================================

/// 单组件单桶的计算结果
#[derive(Debug, Clone, PartialEq)]
pub struct MrpBucketEntry {
    /// 桶键: 周模式为该周周一, 日模式为当天
    pub bucket_start: NaiveDate,
    pub calendar_week: String,
    pub year: i32,
    pub required_qty: f64,
    /// 期末预计在手 = 期初 - required (可为负)
    pub projected_qty: f64,
}

/// 单组件的完整计算行
#[derive(Debug, Clone)]
pub struct MrpComponentRow {
    pub item_id: i64,
    pub item_code: String,
    pub item_name: String,
    pub item_type: ItemType,
    pub on_hand_start: f64,
    /// 按桶键升序
    pub entries: Vec<MrpBucketEntry>,
}

/// MRP 计算结果
#[derive(Debug, Clone, Default)]
pub struct MrpResult {
    pub day_mode: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// 按物料代码升序
    pub components: Vec<MrpComponentRow>,
    /// 未知料号 / 循环 BOM 等非致命问题
    pub warnings: Vec<String>,
}

// ==========================================
// MrpEngine - MRP 计算引擎
// ==========================================
pub struct MrpEngine<'a> {
    order_repo: &'a OrderRepository,
    item_repo: &'a ItemRepository,
}

impl<'a> MrpEngine<'a> {
    pub fn new(order_repo: &'a OrderRepository, item_repo: &'a ItemRepository) -> Self {
        Self { order_repo, item_repo }
    }

    /// 周桶 MRP: 需求源为订单行, 按组件 × ISO 周分桶
    ///
    /// - import_id 为 None 时跨版本聚合
    /// - include_types 为空时不过滤组件类别
    pub fn calculate_weekly(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        import_id: Option<i64>,
        type_filter: OrderTypeFilter,
        include_types: &[ItemType],
    ) -> RepositoryResult<MrpResult> {
        self.calculate(start, end, import_id, type_filter, include_types, false)
    }

    /// 日桶 MRP: 桶键为交付日当天
    pub fn calculate_daily(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        import_id: Option<i64>,
        type_filter: OrderTypeFilter,
        include_types: &[ItemType],
    ) -> RepositoryResult<MrpResult> {
        self.calculate(start, end, import_id, type_filter, include_types, true)
    }

    fn calculate(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        import_id: Option<i64>,
        type_filter: OrderTypeFilter,
        include_types: &[ItemType],
        day_mode: bool,
    ) -> RepositoryResult<MrpResult> {
        // 日期倒置自动交换
        let (start, end) = if start > end { (end, start) } else { (start, end) };

        let lines = self
            .order_repo
            .lines_in_window(start, end, import_id, type_filter)?;
        info!(
            start = %start,
            end = %end,
            import_id = ?import_id,
            line_count = lines.len(),
            "MRP 计算开始"
        );

        let expander = BomExpander::new(self.item_repo);
        let mut warnings: Vec<String> = Vec::new();
        let mut unknown_items: HashSet<String> = HashSet::new();
        let mut cyclic_roots: HashSet<String> = HashSet::new();
        let mut item_cache: HashMap<String, Option<Item>> = HashMap::new();

        // demand[(组件, 桶键)] → 需求量
        let mut demand: HashMap<i64, BTreeMap<NaiveDate, f64>> = HashMap::new();
        let mut component_info: HashMap<i64, (String, String, ItemType)> = HashMap::new();

        for row in &lines {
            let item_number = &row.line.item_number;
            let parent = match item_cache.get(item_number) {
                Some(cached) => cached.clone(),
                None => {
                    let found = self.item_repo.find_by_code(item_number)?;
                    item_cache.insert(item_number.clone(), found.clone());
                    found
                }
            };
            let Some(parent) = parent else {
                if unknown_items.insert(item_number.clone()) {
                    warn!(item = %item_number, "料号不在物料主数据, 跳过该需求");
                    warnings.push(format!("未知料号: {}", item_number));
                }
                continue;
            };

            let date = row.line.delivery_date;
            let bucket = if day_mode { date } else { calendar::week_start(date) };

            let components =
                match expander.expand(parent.item_id, row.line.required_qty, Some(date)) {
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
                *demand
                    .entry(comp.item_id)
                    .or_default()
                    .entry(bucket)
                    .or_insert(0.0) += comp.actual_qty;
                component_info
                    .entry(comp.item_id)
                    .or_insert((comp.item_code, comp.item_name, comp.item_type));
            }
        }

        // 期初在手量快照
        let on_hand = self.item_repo.on_hand_map()?;

        let mut components: Vec<MrpComponentRow> = Vec::with_capacity(demand.len());
        for (item_id, buckets) in demand {
            let (item_code, item_name, item_type) = component_info
                .remove(&item_id)
                .unwrap_or_else(|| (item_id.to_string(), String::new(), ItemType::Other));
            let on_hand_start = on_hand.get(&item_id).copied().unwrap_or(0.0);

            let mut projected = on_hand_start;
            let mut entries = Vec::with_capacity(buckets.len());
            for (bucket_start, required_qty) in buckets {
                projected -= required_qty;
                entries.push(MrpBucketEntry {
                    bucket_start,
                    calendar_week: calendar::cw_label(bucket_start),
                    year: calendar::iso_year(bucket_start),
                    required_qty,
                    projected_qty: projected,
                });
            }

            components.push(MrpComponentRow {
                item_id,
                item_code,
                item_name,
                item_type,
                on_hand_start,
                entries,
            });
        }

        // 同桶并列行按物料代码升序, 保证确定性
        components.sort_by(|a, b| a.item_code.cmp(&b.item_code));

        Ok(MrpResult {
            day_mode,
            start_date: Some(start),
            end_date: Some(end),
            components,
            warnings,
        })
    }
}
