// ==========================================
// 客户释放单看板系统 - 看板投影引擎
// ==========================================
// 职责: 订单聚合 / MRP 结果 / 排程计划 → 矩形网格模型
// 口径: 列 = 周 (或日) 按年度分组, 每年度后接小计列, 末尾总计列;
//       行序 = (DisplayOrder, 供应商, 料号); 底部 TOTAL 行逐列汇总
// ==========================================

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

use crate::calendar;
use crate::domain::grid::{GridCell, GridColumn, GridModel, GridRow, RowKey};
use crate::domain::order::AggregateRow;
use crate::domain::schedule::ScheduleLine;
use crate::engine::mrp::MrpResult;
use crate::engine::project_map::ProjectMap;

// 行草稿: 数据列日期 → (数量, 确认标记)
struct RowDraft {
    key: RowKey,
    values: BTreeMap<NaiveDate, (f64, Option<bool>)>,
}

// ==========================================
// KanbanProjector - 看板投影
// ==========================================
pub struct KanbanProjector;

impl KanbanProjector {
    // ==========================================
    // 订单看板 (周模式)
    // ==========================================

    /// 聚合行 → 周模式网格
    ///
    /// 行键 (供应商, 料号); 单元格数量 = firm + forecast,
    /// 确认标记 F 优先 (混合格按确认着色)。
    pub fn project_orders(rows: &[AggregateRow], project_map: &ProjectMap) -> GridModel {
        if rows.is_empty() {
            return Self::empty_grid(false);
        }

        let min_d = rows.iter().map(|r| r.delivery_date).min().unwrap_or_default();
        let max_d = rows.iter().map(|r| r.delivery_date).max().unwrap_or_default();
        let dates = Self::weekly_dates(min_d, max_d);

        let mut drafts: BTreeMap<(String, String), RowDraft> = BTreeMap::new();
        for row in rows {
            let key = (row.supplier_code.clone(), row.item_number.clone());
            let draft = drafts.entry(key).or_insert_with(|| RowDraft {
                key: RowKey::SupplierItem {
                    supplier_code: row.supplier_code.clone(),
                    item_number: row.item_number.clone(),
                },
                values: BTreeMap::new(),
            });

            let anchor = calendar::week_start(row.delivery_date);
            let slot = draft.values.entry(anchor).or_insert((0.0, None));
            slot.0 += row.total_qty;
            // F 优先于 P
            if row.firm_qty > 0.0 {
                slot.1 = Some(true);
            } else if row.forecast_qty > 0.0 && slot.1 != Some(true) {
                slot.1 = Some(false);
            }
        }

        Self::assemble(false, &dates, drafts.into_values().collect(), &[], project_map)
    }

    // ==========================================
    // MRP 看板
    // ==========================================

    /// MRP 计算结果 → 网格 (单元格为 required)
    pub fn project_mrp(result: &MrpResult, project_map: &ProjectMap) -> GridModel {
        let mut dates: Vec<NaiveDate> = Vec::new();
        if let (Some(start), Some(end)) = (result.start_date, result.end_date) {
            dates = if result.day_mode {
                Self::daily_dates(start, end)
            } else {
                Self::weekly_dates(start, end)
            };
        }
        if dates.is_empty() {
            return Self::empty_grid(result.day_mode);
        }

        let drafts: Vec<RowDraft> = result
            .components
            .iter()
            .map(|comp| RowDraft {
                key: RowKey::Item {
                    item_id: comp.item_id,
                    item_code: comp.item_code.clone(),
                },
                values: comp
                    .entries
                    .iter()
                    .map(|e| (e.bucket_start, (e.required_qty, None)))
                    .collect(),
            })
            .collect();

        Self::assemble(result.day_mode, &dates, drafts, &[], project_map)
    }

    // ==========================================
    // 排程看板 (日模式)
    // ==========================================

    /// 计划行 → 日模式网格
    ///
    /// - day_columns: 派生日列 (无计划的日期也占列)
    /// - week_anchors: 各派生跨度第 7 天, 用于 Accent 样式
    pub fn project_schedule(
        day_columns: &[NaiveDate],
        week_anchors: &[NaiveDate],
        lines: &[ScheduleLine],
        item_codes: &BTreeMap<i64, String>,
        project_map: &ProjectMap,
    ) -> GridModel {
        if day_columns.is_empty() {
            return Self::empty_grid(true);
        }

        let mut drafts: BTreeMap<i64, RowDraft> = BTreeMap::new();
        for line in lines {
            let item_code = item_codes
                .get(&line.item_id)
                .cloned()
                .unwrap_or_else(|| line.item_id.to_string());
            let draft = drafts.entry(line.item_id).or_insert_with(|| RowDraft {
                key: RowKey::Item {
                    item_id: line.item_id,
                    item_code,
                },
                values: BTreeMap::new(),
            });
            let slot = draft.values.entry(line.production_date).or_insert((0.0, None));
            slot.0 += line.planned_qty;
        }

        Self::assemble(
            true,
            day_columns,
            drafts.into_values().collect(),
            week_anchors,
            project_map,
        )
    }

    // ==========================================
    // 组装
    // ==========================================

    /// 周模式数据列: week_start(min) 到 week_start(max), 步长 7 天
    fn weekly_dates(min_d: NaiveDate, max_d: NaiveDate) -> Vec<NaiveDate> {
        let (min_d, max_d) = if min_d > max_d { (max_d, min_d) } else { (min_d, max_d) };
        let mut dates = Vec::new();
        let mut cursor = calendar::week_start(min_d);
        let last = calendar::week_start(max_d);
        while cursor <= last {
            dates.push(cursor);
            cursor += Duration::days(7);
        }
        dates
    }

    fn daily_dates(min_d: NaiveDate, max_d: NaiveDate) -> Vec<NaiveDate> {
        let (min_d, max_d) = if min_d > max_d { (max_d, min_d) } else { (min_d, max_d) };
        let mut dates = Vec::new();
        let mut cursor = min_d;
        while cursor <= max_d {
            dates.push(cursor);
            cursor += Duration::days(1);
        }
        dates
    }

    /// 数据列日期 → 完整列表 (按年度插入小计列, 末尾总计列)
    fn build_columns(dates: &[NaiveDate], day_mode: bool) -> Vec<GridColumn> {
        let mut columns: Vec<GridColumn> = Vec::new();
        let mut current_year: Option<i32> = None;

        for &date in dates {
            let year = calendar::iso_year(date);
            if let Some(prev) = current_year {
                if prev != year {
                    columns.push(GridColumn::YearSum { year: prev });
                }
            }
            current_year = Some(year);
            columns.push(if day_mode {
                GridColumn::Day { date }
            } else {
                GridColumn::week_of(date)
            });
        }
        if let Some(year) = current_year {
            columns.push(GridColumn::YearSum { year });
        }
        columns.push(GridColumn::Total);
        columns
    }

    fn empty_grid(day_mode: bool) -> GridModel {
        GridModel {
            day_mode,
            columns: Vec::new(),
            rows: Vec::new(),
            total_row: Vec::new(),
            week_anchors: Vec::new(),
        }
    }

    fn assemble(
        day_mode: bool,
        dates: &[NaiveDate],
        mut drafts: Vec<RowDraft>,
        week_anchors: &[NaiveDate],
        project_map: &ProjectMap,
    ) -> GridModel {
        // 行序权威: (DisplayOrder, 供应商, 料号)
        drafts.sort_by(|a, b| {
            let oa = project_map.get_order(a.key.part_number());
            let ob = project_map.get_order(b.key.part_number());
            oa.cmp(&ob)
                .then_with(|| a.key.supplier_code().cmp(b.key.supplier_code()))
                .then_with(|| a.key.part_number().cmp(b.key.part_number()))
        });

        let columns = Self::build_columns(dates, day_mode);
        let mut total_acc: Vec<f64> = vec![0.0; columns.len()];
        let mut total_seen: Vec<bool> = vec![false; columns.len()];

        let mut rows: Vec<GridRow> = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let mut cells: Vec<GridCell> = Vec::with_capacity(columns.len());
            let mut year_sum = 0.0;
            let mut year_seen = false;
            let mut grand_sum = 0.0;
            let mut grand_seen = false;

            for (idx, col) in columns.iter().enumerate() {
                let cell = match col {
                    GridColumn::Week { anchor, .. } => match draft.values.get(anchor) {
                        Some(&(qty, firm)) => {
                            year_sum += qty;
                            year_seen = true;
                            grand_sum += qty;
                            grand_seen = true;
                            GridCell::Qty { qty, firm }
                        }
                        None => GridCell::Empty,
                    },
                    GridColumn::Day { date } => match draft.values.get(date) {
                        Some(&(qty, firm)) => {
                            year_sum += qty;
                            year_seen = true;
                            grand_sum += qty;
                            grand_seen = true;
                            GridCell::Qty { qty, firm }
                        }
                        None => GridCell::Empty,
                    },
                    GridColumn::YearSum { .. } => {
                        let cell = if year_seen {
                            GridCell::Subtotal { qty: year_sum }
                        } else {
                            GridCell::Empty
                        };
                        year_sum = 0.0;
                        year_seen = false;
                        cell
                    }
                    GridColumn::Total => {
                        if grand_seen {
                            GridCell::Subtotal { qty: grand_sum }
                        } else {
                            GridCell::Empty
                        }
                    }
                };

                if !cell.is_empty() {
                    total_acc[idx] += cell.value();
                    total_seen[idx] = true;
                }
                cells.push(cell);
            }

            rows.push(GridRow {
                project: project_map.get_project_name(draft.key.part_number()),
                key: draft.key,
                cells,
            });
        }

        let total_row: Vec<GridCell> = total_acc
            .iter()
            .zip(total_seen.iter())
            .map(|(&qty, &seen)| {
                if seen {
                    GridCell::Subtotal { qty }
                } else {
                    GridCell::Empty
                }
            })
            .collect();

        GridModel {
            day_mode,
            columns,
            rows,
            total_row,
            week_anchors: week_anchors.to_vec(),
        }
    }
}
