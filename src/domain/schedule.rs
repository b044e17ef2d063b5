// ==========================================
// 客户释放单看板系统 - 生产排程领域模型
// ==========================================
// 口径: 排程行可自由编辑; schedule_mrp 为派生数据,
//       每次 calc_daily_mrp 删除重建
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::ScheduleStatus;

// ==========================================
// ProductionSchedule - 生产排程
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionSchedule {
    pub schedule_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ScheduleStatus,
    pub created_at: NaiveDateTime,
}

// ==========================================
// ScheduleLine - 排程明细 (单元格)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleLine {
    pub schedule_id: String,
    pub item_id: i64,
    pub production_date: NaiveDate,
    pub planned_qty: f64,
}

// ==========================================
// ScheduleMrpRow - 排程 MRP 派生行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMrpRow {
    pub schedule_id: String,
    pub item_id: i64,
    pub production_date: NaiveDate,
    pub required_qty: f64,
    /// 当日计算前的在手量
    pub on_hand_qty: f64,
    /// net = max(0, required - on_hand)
    pub net_qty: f64,
}
