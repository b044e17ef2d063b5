// ==========================================
// 客户释放单看板系统 - 物料/BOM/库存领域模型
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::ItemType;

// ==========================================
// Item - 物料主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub item_id: i64,
    pub item_code: String,
    pub cn_name: String, // 中文品名
    pub item_spec: Option<String>,
    pub brand: Option<String>,
    pub item_type: ItemType,
    pub is_active: bool,
}

// ==========================================
// BomLine - BOM 组件行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomLine {
    pub bom_line_id: i64,
    pub bom_id: i64,
    pub line_no: i32,
    pub child_item_id: i64,
    pub qty_per: f64,
    /// 损耗率: 实际用量 = qty × qty_per × (1 + scrap)
    pub scrap: Option<f64>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
}

impl BomLine {
    /// 判断组件在指定需求日期是否生效
    ///
    /// 无日期时按"今日生效"口径由调用方传入当天。
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.effective_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.effective_to {
            if date > to {
                return false;
            }
        }
        true
    }
}

// ==========================================
// BomComponent - 展开结果行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomComponent {
    pub item_id: i64,
    pub item_code: String,
    pub item_name: String,
    pub item_spec: Option<String>,
    pub item_type: ItemType,
    pub brand: Option<String>,
    /// 累计实际用量
    pub actual_qty: f64,
}

// ==========================================
// InventoryBalance - 库存余额 (按库位)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryBalance {
    pub item_id: i64,
    pub location: String,
    pub qty_on_hand: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(from: Option<(i32, u32, u32)>, to: Option<(i32, u32, u32)>) -> BomLine {
        BomLine {
            bom_line_id: 1,
            bom_id: 1,
            line_no: 1,
            child_item_id: 2,
            qty_per: 1.0,
            scrap: None,
            effective_from: from.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            effective_to: to.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
        }
    }

    #[test]
    fn test_effectivity_window() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();

        let open = line(None, None);
        assert!(open.is_effective_on(d(2025, 1, 1)));

        let windowed = line(Some((2025, 1, 1)), Some((2025, 6, 30)));
        assert!(!windowed.is_effective_on(d(2024, 12, 31)));
        assert!(windowed.is_effective_on(d(2025, 1, 1)));
        assert!(windowed.is_effective_on(d(2025, 6, 30)));
        assert!(!windowed.is_effective_on(d(2025, 7, 1)));
    }
}
