// ==========================================
// 客户释放单看板系统 - 网格导出
// ==========================================
// 职责: GridModel → CSV (单表, 首行为压平表头)
// 口径: 数量按原始 f64 输出, 取整交给消费方
// ==========================================

use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::domain::grid::{GridCell, GridModel, RowKey};
use crate::repository::{RepositoryError, RepositoryResult};

/// 底部汇总行的行标签
const TOTAL_LABEL: &str = "TOTAL";

// ==========================================
// ExportFormatter - 导出格式化器
// ==========================================
pub struct ExportFormatter;

impl ExportFormatter {
    /// 网格写为 CSV 文件
    pub fn write_csv_file(grid: &GridModel, path: &Path) -> RepositoryResult<()> {
        let file = std::fs::File::create(path).map_err(|e| {
            RepositoryError::InternalError(format!("创建导出文件失败 {}: {}", path.display(), e))
        })?;
        Self::write_csv(grid, file)?;
        info!(path = %path.display(), rows = grid.rows.len(), "网格导出完成");
        Ok(())
    }

    /// 网格写入任意 Write (测试走内存缓冲)
    pub fn write_csv<W: Write>(grid: &GridModel, writer: W) -> RepositoryResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        // ===== 首行: 行键列 + 压平表头 =====
        let mut header: Vec<String> = vec![
            "项目".to_string(),
            "供应商".to_string(),
            "料号".to_string(),
        ];
        header.extend(grid.columns.iter().map(|c| c.header_text()));
        wtr.write_record(&header)
            .map_err(|e| RepositoryError::InternalError(format!("CSV 写入失败: {}", e)))?;

        // ===== 数据行 =====
        for row in &grid.rows {
            let mut record: Vec<String> = vec![
                row.project.clone(),
                row.key.supplier_code().to_string(),
                row.key.part_number().to_string(),
            ];
            if let RowKey::Item { .. } = row.key {
                record[1].clear();
            }
            record.extend(row.cells.iter().map(Self::format_cell));
            wtr.write_record(&record)
                .map_err(|e| RepositoryError::InternalError(format!("CSV 写入失败: {}", e)))?;
        }

        // ===== TOTAL 行 =====
        if !grid.total_row.is_empty() {
            let mut record: Vec<String> =
                vec![String::new(), String::new(), TOTAL_LABEL.to_string()];
            record.extend(grid.total_row.iter().map(Self::format_cell));
            wtr.write_record(&record)
                .map_err(|e| RepositoryError::InternalError(format!("CSV 写入失败: {}", e)))?;
        }

        wtr.flush()
            .map_err(|e| RepositoryError::InternalError(format!("CSV 刷写失败: {}", e)))?;
        Ok(())
    }

    fn format_cell(cell: &GridCell) -> String {
        match cell {
            GridCell::Empty => String::new(),
            _ => {
                let v = cell.value();
                // 整数值不带小数点, 其余保留原值
                if v.fract() == 0.0 {
                    format!("{}", v as i64)
                } else {
                    format!("{}", v)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::{GridColumn, GridRow};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let grid = GridModel {
            day_mode: false,
            columns: vec![
                GridColumn::week_of(d(2025, 8, 18)),
                GridColumn::YearSum { year: 2025 },
                GridColumn::Total,
            ],
            rows: vec![GridRow {
                key: RowKey::SupplierItem {
                    supplier_code: "ACME".to_string(),
                    item_number: "PN-001".to_string(),
                },
                project: "凤凰".to_string(),
                cells: vec![
                    GridCell::Qty { qty: 1200.0, firm: Some(true) },
                    GridCell::Subtotal { qty: 1200.0 },
                    GridCell::Subtotal { qty: 1200.0 },
                ],
            }],
            total_row: vec![
                GridCell::Subtotal { qty: 1200.0 },
                GridCell::Subtotal { qty: 1200.0 },
                GridCell::Subtotal { qty: 1200.0 },
            ],
            week_anchors: vec![],
        };

        let mut buf: Vec<u8> = Vec::new();
        ExportFormatter::write_csv(&grid, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("CW34 2025"));
        assert!(lines[0].contains("2025 小计"));
        assert!(lines[0].ends_with("总计"));
        assert!(lines[1].starts_with("凤凰,ACME,PN-001,1200"));
        assert!(lines[2].contains("TOTAL"));
    }

    #[test]
    fn test_decimal_passthrough() {
        assert_eq!(
            ExportFormatter::format_cell(&GridCell::Qty { qty: 800.5, firm: None }),
            "800.5"
        );
        assert_eq!(
            ExportFormatter::format_cell(&GridCell::Qty { qty: 800.0, firm: None }),
            "800"
        );
        assert_eq!(ExportFormatter::format_cell(&GridCell::Empty), "");
    }
}
