// ==========================================
// 客户释放单看板系统 - 领域类型
// ==========================================
// 职责: 状态/类别枚举, 与数据库字符串的互转
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// OrderType - 订单行类型 (F=确认 / P=预测)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// 确认需求 (Firm)
    Firm,
    /// 预测需求 (Planned/Forecast)
    Forecast,
}

impl OrderType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderType::Firm => "F",
            OrderType::Forecast => "P",
        }
    }

    /// 从字符解析, 大小写均接受; 未知值按预测处理
    pub fn from_db_str(s: &str) -> OrderType {
        match s.trim().to_ascii_uppercase().as_str() {
            "F" => OrderType::Firm,
            _ => OrderType::Forecast,
        }
    }
}

// ==========================================
// OrderTypeFilter - 查询口径 (全部/仅确认/仅预测)
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderTypeFilter {
    #[default]
    All,
    FirmOnly,
    ForecastOnly,
}

impl OrderTypeFilter {
    pub fn from_str(s: &str) -> OrderTypeFilter {
        match s.trim().to_ascii_uppercase().as_str() {
            "F" | "FIRM" => OrderTypeFilter::FirmOnly,
            "P" | "FORECAST" => OrderTypeFilter::ForecastOnly,
            _ => OrderTypeFilter::All,
        }
    }

    /// 判断某订单行类型是否落在本口径内
    pub fn accepts(&self, order_type: OrderType) -> bool {
        match self {
            OrderTypeFilter::All => true,
            OrderTypeFilter::FirmOnly => order_type == OrderType::Firm,
            OrderTypeFilter::ForecastOnly => order_type == OrderType::Forecast,
        }
    }
}

// ==========================================
// ItemType - 物料类别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    /// 成品
    Fg,
    /// 半成品
    Sfg,
    /// 原材料
    Rm,
    /// 包材
    Pkg,
    /// 其他
    Other,
}

impl ItemType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ItemType::Fg => "FG",
            ItemType::Sfg => "SFG",
            ItemType::Rm => "RM",
            ItemType::Pkg => "PKG",
            ItemType::Other => "OTHER",
        }
    }

    pub fn from_db_str(s: &str) -> ItemType {
        match s.trim().to_ascii_uppercase().as_str() {
            "FG" => ItemType::Fg,
            "SFG" => ItemType::Sfg,
            "RM" => ItemType::Rm,
            "PKG" => ItemType::Pkg,
            _ => ItemType::Other,
        }
    }
}

// ==========================================
// ImportStatus - 导入版本状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStatus {
    Success,
    Failed,
}

impl ImportStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ImportStatus::Success => "SUCCESS",
            ImportStatus::Failed => "FAILED",
        }
    }

    pub fn from_db_str(s: &str) -> ImportStatus {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => ImportStatus::Success,
            _ => ImportStatus::Failed,
        }
    }
}

// ==========================================
// ScheduleStatus - 排程状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    Draft,
    Active,
    Archived,
}

impl ScheduleStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Draft => "DRAFT",
            ScheduleStatus::Active => "ACTIVE",
            ScheduleStatus::Archived => "ARCHIVED",
        }
    }

    pub fn from_db_str(s: &str) -> ScheduleStatus {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => ScheduleStatus::Active,
            "ARCHIVED" => ScheduleStatus::Archived,
            _ => ScheduleStatus::Draft,
        }
    }
}
