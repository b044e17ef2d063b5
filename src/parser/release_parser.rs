// ==========================================
// 客户释放单看板系统 - 释放单文本解析器
// ==========================================
// 职责: 纯函数 text → (headers, lines), 不落库不排序
// 口径: 输出顺序与文件顺序一致; 计划行日期非法记软错误并继续
// ==========================================

use regex::Regex;
use tracing::warn;

use crate::calendar::{parse_date_lenient, parse_quantity};
use crate::domain::order::{ParseOutcome, ParsedHeader, ParsedLine};
use crate::domain::types::OrderType;

// ==========================================
// 标量头字段集合
// ==========================================
// 块级字段 (供应商下、首个料号前) 与料号级字段分开保存:
// 料号切换时继承块级字段, 料号级字段清空重记
#[derive(Debug, Clone, Default)]
struct HeaderFields {
    purchase_order: Option<String>,
    release_id: Option<String>,
    release_date: Option<chrono::NaiveDate>,
    receipt_quantity: Option<f64>,
    cum_received: Option<f64>,
}

impl HeaderFields {
    /// 料号级字段优先, 缺失处回落块级字段
    fn merged_over(&self, block: &HeaderFields) -> HeaderFields {
        HeaderFields {
            purchase_order: self.purchase_order.clone().or_else(|| block.purchase_order.clone()),
            release_id: self.release_id.clone().or_else(|| block.release_id.clone()),
            release_date: self.release_date.or(block.release_date),
            receipt_quantity: self.receipt_quantity.or(block.receipt_quantity),
            cum_received: self.cum_received.or(block.cum_received),
        }
    }
}

// ==========================================
// ReleaseParser - 释放单解析器
// ==========================================
pub struct ReleaseParser {
    re_supplier: Regex,
    re_ship_to: Regex,
    re_item: Regex,
    re_purchase_order: Regex,
    re_release_id: Regex,
    re_release_date: Regex,
    re_receipt_qty: Regex,
    re_cum_received: Regex,
    re_schedule_line: Regex,
}

impl Default for ReleaseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseParser {
    pub fn new() -> Self {
        // 模式均在构造时编译一次; num = [0-9][0-9,]*(\.\d+)?
        Self {
            re_supplier: Regex::new(r"(?i:supplier):\s*([A-Za-z0-9-]+)").unwrap(),
            re_ship_to: Regex::new(r"(?i:ship-to):").unwrap(),
            re_item: Regex::new(r"(?i:item number):\s*([A-Z0-9-]+)").unwrap(),
            re_purchase_order: Regex::new(r"(?i:purchase order):\s*([A-Z0-9-]+)").unwrap(),
            re_release_id: Regex::new(r"(?i:release id):\s*([\w-]+)").unwrap(),
            re_release_date: Regex::new(r"(?i:release date):\s*(\d{1,2}/\d{1,2}/\d{2,4})").unwrap(),
            re_receipt_qty: Regex::new(r"(?i:receipt quantity):\s*([0-9][0-9,]*(?:\.\d+)?)")
                .unwrap(),
            re_cum_received: Regex::new(r"(?i:cum received):\s*([0-9][0-9,]*(?:\.\d+)?)").unwrap(),
            re_schedule_line: Regex::new(
                r"^\s*(?:(?i:Daily|Weekly|Monthly)\s+)?(\d{1,2}/\d{1,2}/\d{2,4})\s+([FPfp])\s+([0-9][0-9,]*(?:\.\d+)?)(?:\s.*)?$",
            )
            .unwrap(),
        }
    }

    /// 解析释放单文本
    ///
    /// 全文件无供应商标记时返回空结果, 由导入引擎报 "无有效订单"。
    pub fn parse(&self, text: &str) -> ParseOutcome {
        let mut out = ParseOutcome::default();

        // ===== 扫描器状态 =====
        let mut supplier_code: Option<String> = None;
        let mut supplier_name: Option<String> = None;
        let mut awaiting_name = false;
        let mut item_number: Option<String> = None;
        let mut block = HeaderFields::default();
        let mut item_fields = HeaderFields::default();

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim_end();
            if line.trim().is_empty() {
                continue;
            }

            // ===== 供应商标记: 关闭上一块 =====
            // 同一行可携带其他标量字段, 重置状态后继续向下扫描
            if let Some(cap) = self.re_supplier.captures(line) {
                Self::flush_header(
                    &mut out,
                    &supplier_code,
                    &supplier_name,
                    &mut item_number,
                    &block,
                    &mut item_fields,
                );
                supplier_code = Some(cap[1].to_string());
                supplier_name = None;
                awaiting_name = true;
                item_number = None;
                block = HeaderFields::default();
                item_fields = HeaderFields::default();
            }

            // ===== 供应商名称: 供应商标记后、Ship-To 前的首个非空行 =====
            if awaiting_name {
                if self.re_ship_to.is_match(line) {
                    awaiting_name = false;
                } else if !self.is_any_marker(line) {
                    supplier_name = Some(line.trim().to_string());
                    awaiting_name = false;
                    continue;
                }
            }

            // ===== 料号标记: 关闭当前头记录并切换料号 =====
            if let Some(cap) = self.re_item.captures(line) {
                Self::flush_header(
                    &mut out,
                    &supplier_code,
                    &supplier_name,
                    &mut item_number,
                    &block,
                    &mut item_fields,
                );
                item_number = Some(cap[1].to_string());
                item_fields = HeaderFields::default();
            }

            // ===== 标量头字段: 同一行可与其他模式共存 =====
            // 首个料号出现前记入块级, 之后记入料号级
            {
                let target = if item_number.is_none() { &mut block } else { &mut item_fields };
                if let Some(cap) = self.re_purchase_order.captures(line) {
                    target.purchase_order = Some(cap[1].to_string());
                }
                if let Some(cap) = self.re_release_id.captures(line) {
                    target.release_id = Some(cap[1].to_string());
                }
                if let Some(cap) = self.re_release_date.captures(line) {
                    match parse_date_lenient(&cap[1]) {
                        Some(d) => target.release_date = Some(d),
                        None => out
                            .soft_errors
                            .push(format!("第{}行: 释放日期无法解析: {}", line_no, &cap[1])),
                    }
                }
                if let Some(cap) = self.re_receipt_qty.captures(line) {
                    target.receipt_quantity = parse_quantity(&cap[1]);
                }
                if let Some(cap) = self.re_cum_received.captures(line) {
                    target.cum_received = parse_quantity(&cap[1]);
                }
            }

            // ===== 计划行 =====
            if let Some(cap) = self.re_schedule_line.captures(line) {
                let (supplier, item) = match (&supplier_code, &item_number) {
                    (Some(s), Some(i)) => (s.clone(), i.clone()),
                    _ => {
                        out.soft_errors.push(format!(
                            "第{}行: 计划行出现在供应商/料号之外, 已跳过",
                            line_no
                        ));
                        continue;
                    }
                };

                let delivery_date = match parse_date_lenient(&cap[1]) {
                    Some(d) => d,
                    None => {
                        // 软错误: 跳过该行但继续解析
                        out.soft_errors
                            .push(format!("第{}行: 交付日期无法解析: {}", line_no, &cap[1]));
                        continue;
                    }
                };

                let qty = match parse_quantity(&cap[3]) {
                    Some(q) => q,
                    None => {
                        out.soft_errors
                            .push(format!("第{}行: 数量无法解析: {}", line_no, &cap[3]));
                        continue;
                    }
                };

                out.lines.push(ParsedLine {
                    supplier_code: supplier,
                    item_number: item,
                    delivery_date,
                    order_type: OrderType::from_db_str(&cap[2]),
                    qty,
                });
            }
        }

        // 文件截断: 最后一个打开的头记录正常关闭
        Self::flush_header(
            &mut out,
            &supplier_code,
            &supplier_name,
            &mut item_number,
            &block,
            &mut item_fields,
        );

        if !out.soft_errors.is_empty() {
            warn!(
                soft_errors = out.soft_errors.len(),
                "释放单解析存在软错误, 相关行已跳过"
            );
        }

        out
    }

    /// 关闭当前打开的头记录 (供应商+料号齐备时才产出)
    fn flush_header(
        out: &mut ParseOutcome,
        supplier_code: &Option<String>,
        supplier_name: &Option<String>,
        item_number: &mut Option<String>,
        block: &HeaderFields,
        item_fields: &mut HeaderFields,
    ) {
        let (supplier, item) = match (supplier_code, item_number.take()) {
            (Some(s), Some(i)) => (s.clone(), i),
            _ => return,
        };

        let merged = item_fields.merged_over(block);
        out.headers.push(ParsedHeader {
            supplier_code: supplier,
            supplier_name: supplier_name.clone(),
            item_number: item,
            purchase_order: merged.purchase_order,
            release_id: merged.release_id,
            release_date: merged.release_date,
            receipt_quantity: merged.receipt_quantity,
            cum_received: merged.cum_received,
        });
        *item_fields = HeaderFields::default();
    }

    /// 判断行是否命中任一字段标记 (供应商名称候选行排除用)
    fn is_any_marker(&self, line: &str) -> bool {
        self.re_supplier.is_match(line)
            || self.re_ship_to.is_match(line)
            || self.re_item.is_match(line)
            || self.re_purchase_order.is_match(line)
            || self.re_release_id.is_match(line)
            || self.re_release_date.is_match(line)
            || self.re_receipt_qty.is_match(line)
            || self.re_cum_received.is_match(line)
            || self.re_schedule_line.is_match(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const SAMPLE: &str = "\
Supplier: ACME

ACME CORP
Ship-To: X
Purchase Order: PO-1
Release Date: 08/21/25
Release ID: R-9
Item Number: PN-001
08/25/25 F 1,200
09/01/25 P 800.5
";

    #[test]
    fn test_single_block_parse() {
        let parser = ReleaseParser::new();
        let out = parser.parse(SAMPLE);

        assert_eq!(out.headers.len(), 1);
        let h = &out.headers[0];
        assert_eq!(h.supplier_code, "ACME");
        assert_eq!(h.supplier_name.as_deref(), Some("ACME CORP"));
        assert_eq!(h.item_number, "PN-001");
        assert_eq!(h.purchase_order.as_deref(), Some("PO-1"));
        assert_eq!(h.release_id.as_deref(), Some("R-9"));
        assert_eq!(h.release_date, Some(d(2025, 8, 21)));

        assert_eq!(out.lines.len(), 2);
        assert_eq!(out.lines[0].delivery_date, d(2025, 8, 25));
        assert_eq!(out.lines[0].order_type, OrderType::Firm);
        assert_eq!(out.lines[0].qty, 1200.0);
        assert_eq!(out.lines[1].delivery_date, d(2025, 9, 1));
        assert_eq!(out.lines[1].order_type, OrderType::Forecast);
        assert_eq!(out.lines[1].qty, 800.5);
        assert!(out.soft_errors.is_empty());
    }

    #[test]
    fn test_item_change_inherits_block_headers() {
        let text = "\
Supplier: ACME
ACME CORP
Ship-To: X
Purchase Order: PO-1
Item Number: PN-001
Release ID: R-1
08/25/25 F 100
Item Number: PN-002
09/01/25 P 50
";
        let out = ReleaseParser::new().parse(text);
        assert_eq!(out.headers.len(), 2);

        // PN-001: 块级 PO + 料号级 Release ID
        assert_eq!(out.headers[0].item_number, "PN-001");
        assert_eq!(out.headers[0].purchase_order.as_deref(), Some("PO-1"));
        assert_eq!(out.headers[0].release_id.as_deref(), Some("R-1"));

        // PN-002: 继承块级 PO, 料号级字段清空
        assert_eq!(out.headers[1].item_number, "PN-002");
        assert_eq!(out.headers[1].purchase_order.as_deref(), Some("PO-1"));
        assert_eq!(out.headers[1].release_id, None);
    }

    #[test]
    fn test_supplier_line_carries_scalar_fields() {
        // 供应商标记与标量字段同行: 两者都要被识别
        let text = "\
Supplier: ACME Purchase Order: PO-9
ACME CORP
Item Number: PN-001
08/25/25 F 100
";
        let out = ReleaseParser::new().parse(text);
        assert_eq!(out.headers.len(), 1);
        let h = &out.headers[0];
        assert_eq!(h.supplier_code, "ACME");
        assert_eq!(h.supplier_name.as_deref(), Some("ACME CORP"));
        assert_eq!(h.purchase_order.as_deref(), Some("PO-9"));
        assert_eq!(out.lines.len(), 1);
    }

    #[test]
    fn test_malformed_date_is_soft_error() {
        let text = "\
Supplier: ACME
ACME CORP
Item Number: PN-001
13/45/25 F 100
08/25/25 F 200
";
        let out = ReleaseParser::new().parse(text);
        assert_eq!(out.lines.len(), 1);
        assert_eq!(out.lines[0].qty, 200.0);
        assert_eq!(out.soft_errors.len(), 1);
    }

    #[test]
    fn test_unparsable_file_yields_empty() {
        let out = ReleaseParser::new().parse("nothing to see here\njust noise\n");
        assert!(out.headers.is_empty());
        assert!(out.lines.is_empty());
    }

    #[test]
    fn test_truncated_block_flushes_open_header() {
        let text = "\
Supplier: ACME
ACME CORP
Item Number: PN-001
Purchase Order: PO-9";
        let out = ReleaseParser::new().parse(text);
        assert_eq!(out.headers.len(), 1);
        assert_eq!(out.headers[0].purchase_order.as_deref(), Some("PO-9"));
        assert_eq!(out.headers[0].release_id, None);
    }

    #[test]
    fn test_schedule_line_with_frequency_prefix() {
        let text = "\
Supplier: ACME
ACME CORP
Item Number: PN-001
Weekly 08/25/25 f 1,000.25 trailing note
";
        let out = ReleaseParser::new().parse(text);
        assert_eq!(out.lines.len(), 1);
        assert_eq!(out.lines[0].order_type, OrderType::Firm);
        assert_eq!(out.lines[0].qty, 1000.25);
    }

    #[test]
    fn test_output_order_matches_file_order() {
        let text = "\
Supplier: ZULU
ZULU LTD
Item Number: B-2
08/25/25 F 1
Supplier: ACME
ACME CORP
Item Number: A-1
08/25/25 F 2
";
        let out = ReleaseParser::new().parse(text);
        assert_eq!(out.headers[0].supplier_code, "ZULU");
        assert_eq!(out.headers[1].supplier_code, "ACME");
        assert_eq!(out.lines[0].qty, 1.0);
        assert_eq!(out.lines[1].qty, 2.0);
    }
}
