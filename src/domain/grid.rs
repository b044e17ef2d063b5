// ==========================================
// 客户释放单看板系统 - 看板网格模型
// ==========================================
// 职责: UI/导出消费的矩形网格结构
// 红线: 单元格与列均为带标签结构, 禁止字符串记录传递
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar;

// ==========================================
// GridColumn - 网格列
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridColumn {
    /// 周列: anchor 为该 ISO 周的周一
    Week {
        anchor: NaiveDate,
        label: String, // "CW{:02}"
        year: i32,     // ISO 年度
    },
    /// 日列 (排程模式)
    Day { date: NaiveDate },
    /// 年度小计列
    YearSum { year: i32 },
    /// 总计列
    Total,
}

impl GridColumn {
    pub fn week_of(anchor: NaiveDate) -> GridColumn {
        GridColumn::Week {
            anchor,
            label: calendar::cw_label(anchor),
            year: calendar::iso_year(anchor),
        }
    }

    /// 是否为数据列 (周列或日列)
    pub fn is_data(&self) -> bool {
        matches!(self, GridColumn::Week { .. } | GridColumn::Day { .. })
    }

    /// 所属年度 (Total 列无年度)
    pub fn year(&self) -> Option<i32> {
        match self {
            GridColumn::Week { year, .. } => Some(*year),
            GridColumn::Day { date } => Some(calendar::iso_year(*date)),
            GridColumn::YearSum { year } => Some(*year),
            GridColumn::Total => None,
        }
    }

    /// 两行表头压平成单行文本 (导出用)
    pub fn header_text(&self) -> String {
        match self {
            GridColumn::Week { label, year, .. } => format!("{} {}", label, year),
            GridColumn::Day { date } => date.format("%Y-%m-%d").to_string(),
            GridColumn::YearSum { year } => format!("{} 小计", year),
            GridColumn::Total => "总计".to_string(),
        }
    }
}

// ==========================================
// GridCell - 网格单元格
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridCell {
    /// 数量单元格; firm 表示是否含确认需求 (F 优先于 P)
    Qty { qty: f64, firm: Option<bool> },
    /// 小计/总计单元格
    Subtotal { qty: f64 },
    Empty,
}

impl GridCell {
    pub fn value(&self) -> f64 {
        match self {
            GridCell::Qty { qty, .. } => *qty,
            GridCell::Subtotal { qty } => *qty,
            GridCell::Empty => 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, GridCell::Empty)
    }
}

// ==========================================
// CellStyle - 单元格样式契约 (透传给展示层)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStyle {
    Default,
    /// 确认需求填充
    Firm,
    /// 预测需求填充
    Forecast,
    /// 年度小计与 TOTAL 行
    Bold,
    /// 日模式: 派生跨度的第 7 天 (周锚点)
    Accent,
    /// 日模式: 周日
    Warning,
    /// 日模式: 正计划量
    Success,
}

// ==========================================
// RowKey - 行键
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowKey {
    /// 订单看板行: (供应商, 料号)
    SupplierItem {
        supplier_code: String,
        item_number: String,
    },
    /// MRP 行: 组件物料
    Item { item_id: i64, item_code: String },
}

impl RowKey {
    /// 行的料号/物料代码 (项目映射查询键)
    pub fn part_number(&self) -> &str {
        match self {
            RowKey::SupplierItem { item_number, .. } => item_number,
            RowKey::Item { item_code, .. } => item_code,
        }
    }

    pub fn supplier_code(&self) -> &str {
        match self {
            RowKey::SupplierItem { supplier_code, .. } => supplier_code,
            RowKey::Item { .. } => "",
        }
    }
}

// ==========================================
// GridRow - 网格行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridRow {
    pub key: RowKey,
    /// 项目名称 (ProjectMap 提供, 未匹配为 "UNKNOWN")
    pub project: String,
    /// 与 columns 逐列对齐
    pub cells: Vec<GridCell>,
}

// ==========================================
// GridModel - 网格模型
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridModel {
    /// 日模式 (排程) 或周模式 (看板/MRP)
    pub day_mode: bool,
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
    /// 底部 TOTAL 行: 对所有数据行逐列汇总
    pub total_row: Vec<GridCell>,
    /// 日模式下各派生跨度的锚点日 (第 7 天), 用于 Accent 样式
    pub week_anchors: Vec<NaiveDate>,
}

impl GridModel {
    /// 解析单元格样式 (§ 样式契约)
    ///
    /// 优先级: Bold (小计/TOTAL) > Accent (锚点日) > Warning (周日)
    ///         > Success (正计划量) > Firm/Forecast > Default
    pub fn cell_style(&self, col_idx: usize, cell: &GridCell, is_total_row: bool) -> CellStyle {
        if is_total_row || matches!(cell, GridCell::Subtotal { .. }) {
            return CellStyle::Bold;
        }

        if self.day_mode {
            if let Some(GridColumn::Day { date }) = self.columns.get(col_idx) {
                if self.week_anchors.contains(date) {
                    return CellStyle::Accent;
                }
                if calendar::is_sunday(*date) {
                    return CellStyle::Warning;
                }
                if cell.value() > 0.0 {
                    return CellStyle::Success;
                }
            }
            return CellStyle::Default;
        }

        match cell {
            GridCell::Qty { firm: Some(true), .. } => CellStyle::Firm,
            GridCell::Qty { firm: Some(false), .. } => CellStyle::Forecast,
            _ => CellStyle::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn day_grid() -> GridModel {
        GridModel {
            day_mode: true,
            columns: vec![
                GridColumn::Day { date: d(2025, 8, 17) }, // 周日
                GridColumn::Day { date: d(2025, 8, 18) }, // 锚点
            ],
            rows: vec![],
            total_row: vec![],
            week_anchors: vec![d(2025, 8, 18)],
        }
    }

    #[test]
    fn test_style_precedence_day_mode() {
        let grid = day_grid();
        let qty = GridCell::Qty { qty: 5.0, firm: None };

        // 锚点日 Accent
        assert_eq!(grid.cell_style(1, &qty, false), CellStyle::Accent);
        // 周日 Warning
        assert_eq!(grid.cell_style(0, &GridCell::Empty, false), CellStyle::Warning);
        // TOTAL 行始终 Bold
        assert_eq!(grid.cell_style(0, &qty, true), CellStyle::Bold);
    }

    #[test]
    fn test_style_week_mode() {
        let grid = GridModel {
            day_mode: false,
            columns: vec![GridColumn::week_of(d(2025, 8, 18)), GridColumn::Total],
            rows: vec![],
            total_row: vec![],
            week_anchors: vec![],
        };

        let firm = GridCell::Qty { qty: 1.0, firm: Some(true) };
        let fc = GridCell::Qty { qty: 1.0, firm: Some(false) };
        assert_eq!(grid.cell_style(0, &firm, false), CellStyle::Firm);
        assert_eq!(grid.cell_style(0, &fc, false), CellStyle::Forecast);
        assert_eq!(
            grid.cell_style(1, &GridCell::Subtotal { qty: 2.0 }, false),
            CellStyle::Bold
        );
    }

    #[test]
    fn test_header_text() {
        let col = GridColumn::week_of(d(2024, 12, 30));
        assert_eq!(col.header_text(), "CW01 2025");
    }
}
