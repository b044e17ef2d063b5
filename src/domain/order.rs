// ==========================================
// 客户释放单看板系统 - 订单领域模型
// ==========================================
// 口径: 释放单导入后按 (导入版本, 供应商, 周历, 年度) 聚合为订单头,
//       行按 (订单头, 料号, 交付日期) 唯一
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{ImportStatus, OrderType};

// ==========================================
// ImportVersion - 导入版本
// ==========================================
// 红线: 版本一经导入成功即不可变, 只能整版删除
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportVersion {
    pub import_id: i64,                // 版本ID (单调递增)
    pub file_name: String,             // 源文件名
    pub import_date: NaiveDateTime,    // 导入时间
    pub order_count: i64,              // 订单头数量
    pub line_count: i64,               // 订单行数量
    pub status: ImportStatus,          // 导入状态
    pub imported_by: Option<String>,   // 操作人
    pub error_message: Option<String>, // 失败原因
}

// ==========================================
// OrderHeader - 订单头
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderHeader {
    pub order_id: i64,
    /// 展示键 {SupplierCode}_{ItemNumber}_{CalendarWeek}, 不参与唯一性
    pub order_number: String,
    pub import_id: i64,
    pub supplier_code: String,
    pub supplier_name: Option<String>,
    pub calendar_week: String, // "CW{:02}"
    pub order_year: i32,       // ISO 年度
    pub release_date: Option<NaiveDate>,
    pub release_id: Option<String>,
    pub purchase_order: Option<String>,
    pub receipt_quantity: Option<f64>,
    pub cum_received: Option<f64>,
    pub status: String,
}

// ==========================================
// OrderLine - 订单行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_id: i64,
    pub order_id: i64,
    pub import_id: i64,
    pub item_number: String,
    pub item_description: Option<String>,
    pub unit_of_measure: Option<String>,
    pub delivery_date: NaiveDate,
    pub calendar_week: String,
    pub order_type: OrderType,
    pub required_qty: f64,
    pub cumulative_qty: Option<f64>,
    pub net_required_qty: Option<f64>,
    pub in_transit_qty: Option<f64>,
    pub received_qty: Option<f64>,
    pub status: String,
}

// ==========================================
// LineWithHeader - 行与头字段的联合读取结果
// ==========================================
// 注: 只允许选择行表实际存在的列, 头字段显式 JOIN 补充
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineWithHeader {
    pub line: OrderLine,
    pub supplier_code: String,
    pub supplier_name: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub release_id: Option<String>,
    pub purchase_order: Option<String>,
}

// ==========================================
// AggregateRow - 聚合视图行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRow {
    pub supplier_code: String,
    pub item_number: String,
    pub release_date: Option<NaiveDate>,
    pub release_id: Option<String>,
    /// 项目名称由 ProjectMap 在投影阶段补充, 不进 SQL 分组
    pub project: Option<String>,
    pub import_id: i64,
    pub delivery_date: NaiveDate,
    pub calendar_week: String,
    pub firm_qty: f64,
    pub forecast_qty: f64,
    pub total_qty: f64,
}

// ==========================================
// 解析器输出 (纯函数边界, 未落库)
// ==========================================

/// 解析得到的头记录: 一个 (供应商, 料号) 块的标量字段集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedHeader {
    pub supplier_code: String,
    pub supplier_name: Option<String>,
    pub item_number: String,
    pub purchase_order: Option<String>,
    pub release_id: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub receipt_quantity: Option<f64>,
    pub cum_received: Option<f64>,
}

/// 解析得到的计划行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLine {
    pub supplier_code: String,
    pub item_number: String,
    pub delivery_date: NaiveDate,
    pub order_type: OrderType,
    pub qty: f64,
}

/// 解析结果: 输出顺序与文件顺序一致
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub headers: Vec<ParsedHeader>,
    pub lines: Vec<ParsedLine>,
    /// 软错误 (如计划行日期非法): 跳过该行但继续解析
    pub soft_errors: Vec<String>,
}

// ==========================================
// 导入写入草稿 (引擎分组后交仓储落库)
// ==========================================

/// 待落库订单头: 引擎已按 (供应商, 周历, 年度) 分组去重
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub supplier_code: String,
    pub supplier_name: Option<String>,
    pub calendar_week: String,
    pub order_year: i32,
    pub release_date: Option<NaiveDate>,
    pub release_id: Option<String>,
    pub purchase_order: Option<String>,
    pub receipt_quantity: Option<f64>,
    pub cum_received: Option<f64>,
    pub lines: Vec<NewOrderLine>,
}

/// 待落库订单行
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub item_number: String,
    pub delivery_date: NaiveDate,
    pub calendar_week: String,
    pub order_type: OrderType,
    pub required_qty: f64,
}
