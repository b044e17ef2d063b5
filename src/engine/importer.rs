// ==========================================
// 客户释放单看板系统 - 释放单导入引擎
// ==========================================
// 职责: 读文件 → 解析 → 分组 → 单事务落库
// 口径: 订单头按 (供应商, ISO 周) 分组; OrderYear 取该周代表交付日的 ISO 年度
// 红线: 解析为空时只记 FAILED 版本行, 不产生任何订单数据
// ==========================================

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info};

use crate::calendar;
use crate::domain::order::{NewOrder, NewOrderLine, ParseOutcome, ParsedHeader};
use crate::parser::ReleaseParser;
use crate::repository::{
    ImportVersionRepository, OrderRepository, RepositoryError, RepositoryResult,
};

/// 导入结果摘要
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub import_id: i64,
    pub order_count: i64,
    pub line_count: i64,
    /// 解析阶段的软错误 (跳过的计划行等)
    pub soft_errors: Vec<String>,
}

// ==========================================
// ReleaseImporter - 导入引擎
// ==========================================
pub struct ReleaseImporter<'a> {
    parser: ReleaseParser,
    order_repo: &'a OrderRepository,
    import_repo: &'a ImportVersionRepository,
}

impl<'a> ReleaseImporter<'a> {
    pub fn new(order_repo: &'a OrderRepository, import_repo: &'a ImportVersionRepository) -> Self {
        Self {
            parser: ReleaseParser::new(),
            order_repo,
            import_repo,
        }
    }

    /// 导入一份释放单文本文件
    ///
    /// 文件按 UTF-8 宽容解码 (非法字节替换)。解析为空时落 FAILED
    /// 版本行并返回错误; 成功时单事务写入全部订单数据。
    pub fn import_release(
        &self,
        path: &Path,
        imported_by: Option<&str>,
    ) -> RepositoryResult<ImportReport> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let bytes = std::fs::read(path).map_err(|e| {
            RepositoryError::InternalError(format!("读取文件失败 {}: {}", path.display(), e))
        })?;
        let text = String::from_utf8_lossy(&bytes);

        self.import_text(&file_name, &text, imported_by)
    }

    /// 导入已就绪的文本 (测试与内嵌调用入口)
    pub fn import_text(
        &self,
        file_name: &str,
        text: &str,
        imported_by: Option<&str>,
    ) -> RepositoryResult<ImportReport> {
        let outcome = self.parser.parse(text);

        if outcome.lines.is_empty() {
            let message = "无有效订单";
            error!(file = %file_name, "导入失败: {}", message);
            self.import_repo
                .insert_failed(file_name, imported_by, message)?;
            return Err(RepositoryError::ValidationError(message.to_string()));
        }

        let orders = Self::group_orders(&outcome);
        let (import_id, order_count, line_count) =
            self.order_repo
                .persist_import(file_name, imported_by, &orders)?;

        info!(
            file = %file_name,
            import_id,
            order_count,
            line_count,
            soft_errors = outcome.soft_errors.len(),
            "导入完成"
        );

        Ok(ImportReport {
            import_id,
            order_count,
            line_count,
            soft_errors: outcome.soft_errors,
        })
    }

    // ==========================================
    // 分组: 解析结果 → 待落库订单
    // ==========================================

    /// 按 (供应商, 料号, ISO 周) 分组计划行
    ///
    /// 头键年度取自该周任一交付日 (同一 ISO 周内年度一致);
    /// 头标量字段来自该 (供应商, 料号) 的解析头。
    fn group_orders(outcome: &ParseOutcome) -> Vec<NewOrder> {
        // 键含周一锚点, 跨年同号周 (如 2025/2026 各自的 CW01) 不会合并
        let mut groups: BTreeMap<(String, String, NaiveDate), Vec<&crate::domain::order::ParsedLine>> =
            BTreeMap::new();
        for line in &outcome.lines {
            let anchor = calendar::week_start(line.delivery_date);
            groups
                .entry((line.supplier_code.clone(), line.item_number.clone(), anchor))
                .or_default()
                .push(line);
        }

        let mut orders = Vec::with_capacity(groups.len());
        for ((supplier_code, item_number, anchor), lines) in groups {
            let header = Self::header_for(outcome, &supplier_code, &item_number);
            let calendar_week = calendar::cw_label(anchor);
            let order_year = calendar::iso_year(anchor);

            let new_lines = lines
                .iter()
                .map(|l| NewOrderLine {
                    item_number: l.item_number.clone(),
                    delivery_date: l.delivery_date,
                    calendar_week: calendar::cw_label(l.delivery_date),
                    order_type: l.order_type,
                    required_qty: l.qty,
                })
                .collect();

            orders.push(NewOrder {
                order_number: format!("{}_{}_{}", supplier_code, item_number, calendar_week),
                supplier_code: supplier_code.clone(),
                supplier_name: header.and_then(|h| h.supplier_name.clone()),
                calendar_week,
                order_year,
                release_date: header.and_then(|h| h.release_date),
                release_id: header.and_then(|h| h.release_id.clone()),
                purchase_order: header.and_then(|h| h.purchase_order.clone()),
                receipt_quantity: header.and_then(|h| h.receipt_quantity),
                cum_received: header.and_then(|h| h.cum_received),
                lines: new_lines,
            });
        }
        orders
    }

    fn header_for<'o>(
        outcome: &'o ParseOutcome,
        supplier_code: &str,
        item_number: &str,
    ) -> Option<&'o ParsedHeader> {
        outcome
            .headers
            .iter()
            .find(|h| h.supplier_code == supplier_code && h.item_number == item_number)
    }
}
