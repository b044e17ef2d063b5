// ==========================================
// 客户释放单看板系统 - 周历计算
// ==========================================
// 职责: ISO 周历数学与宽松日期解析
// 口径: CalendarWeek = "CW{iso_week:02}"，OrderYear = iso_year
// ==========================================

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// 取日期所在的 ISO 周号 (01..53)
pub fn iso_week(d: NaiveDate) -> u32 {
    d.iso_week().week()
}

/// 取日期所在的 ISO 年度
///
/// 注意: 跨年周（例如 2024-12-30 属于 2025 年第 1 周）返回 ISO 年度而非公历年度。
pub fn iso_year(d: NaiveDate) -> i32 {
    d.iso_week().year()
}

/// 取日期所在 ISO 周的周一
pub fn week_start(d: NaiveDate) -> NaiveDate {
    d - Duration::days(d.weekday().num_days_from_monday() as i64)
}

/// 周历标签, 例如 "CW05"
pub fn cw_label(d: NaiveDate) -> String {
    format!("CW{:02}", iso_week(d))
}

/// 判断是否为周日（日模式看板的警示列）
pub fn is_sunday(d: NaiveDate) -> bool {
    d.weekday() == Weekday::Sun
}

/// 宽松日期解析
///
/// 支持 4 种格式:
/// - MM/DD/YY   （两位年份 <2000 时加 2000, 即 "12/31/99" → 2099-12-31）
/// - MM/DD/YYYY
/// - YYYY-MM-DD
/// - YYYY/MM/DD
///
/// 解析失败返回 None, 由调用方决定软错误处理。
pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // ISO 格式优先
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y/%m/%d") {
        // 仅当首段确实是 4 位年份时才接受, 避免与 MM/DD/YYYY 混淆
        if s.split('/').next().map(|p| p.len() == 4).unwrap_or(false) {
            return Some(d);
        }
    }

    // 美式 MM/DD/YY 或 MM/DD/YYYY
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() == 3 {
        let month: u32 = parts[0].trim().parse().ok()?;
        let day: u32 = parts[1].trim().parse().ok()?;
        let mut year: i32 = parts[2].trim().parse().ok()?;
        if year < 100 {
            // 两位年份轴: <2000 → +2000
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

/// 数量解析: 去除千分位逗号后按浮点解析
///
/// 核心全程携带 f64, 取整交给展示层。
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let s = raw.trim().replace(',', "");
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date_lenient("08/21/25"), Some(d(2025, 8, 21)));
        assert_eq!(parse_date_lenient("12/31/99"), Some(d(2099, 12, 31)));
        assert_eq!(parse_date_lenient("2024-01-01"), Some(d(2024, 1, 1)));
        assert_eq!(parse_date_lenient("2024/01/01"), Some(d(2024, 1, 1)));
        assert_eq!(parse_date_lenient("08/21/2025"), Some(d(2025, 8, 21)));
        assert_eq!(parse_date_lenient("13/45/25"), None);
        assert_eq!(parse_date_lenient(""), None);
        assert_eq!(parse_date_lenient("garbage"), None);
    }

    #[test]
    fn test_iso_week_year_boundary() {
        // 2024-12-30 属于 2025 年第 1 周
        let date = d(2024, 12, 30);
        assert_eq!(iso_week(date), 1);
        assert_eq!(iso_year(date), 2025);
        assert_eq!(cw_label(date), "CW01");
    }

    #[test]
    fn test_week_start() {
        // 2025-08-21 是周四, 所在周周一为 2025-08-18
        assert_eq!(week_start(d(2025, 8, 21)), d(2025, 8, 18));
        // 周一不变
        assert_eq!(week_start(d(2025, 8, 18)), d(2025, 8, 18));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("1,200"), Some(1200.0));
        assert_eq!(parse_quantity("800.5"), Some(800.5));
        assert_eq!(parse_quantity("0"), Some(0.0));
        assert_eq!(parse_quantity("abc"), None);
    }
}
