// ==========================================
// 客户释放单看板系统 - 导入 API
// ==========================================
// 职责: 释放单导入 / 版本查询 / 整版删除
// ==========================================

use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::app::AppState;
use crate::domain::order::ImportVersion;
use crate::engine::ReleaseImporter;
use crate::repository::RepositoryError;

/// 导入成功的响应载荷
#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub import_id: i64,
    pub order_count: i64,
    pub line_count: i64,
    pub soft_errors: Vec<String>,
}

/// 导入一份释放单文件
pub fn import_release(
    state: &AppState,
    path: &str,
    imported_by: Option<&str>,
) -> ApiResult<ImportResponse> {
    let importer = ReleaseImporter::new(&state.order_repo, &state.import_repo);
    let report = importer
        .import_release(Path::new(path), imported_by)
        .map_err(|e| match e {
            RepositoryError::ValidationError(msg) => ApiError::ImportFailed(msg),
            other => ApiError::from(other),
        })?;

    Ok(ImportResponse {
        import_id: report.import_id,
        order_count: report.order_count,
        line_count: report.line_count,
        soft_errors: report.soft_errors,
    })
}

/// 删除一个导入版本 (级联清除其订单)
pub fn delete_import(state: &AppState, import_id: i64) -> ApiResult<()> {
    state.import_repo.delete(import_id)?;
    info!(import_id, "导入版本已删除");
    Ok(())
}

/// 导入历史, 最新在前
pub fn list_imports(state: &AppState) -> ApiResult<Vec<ImportVersion>> {
    Ok(state.import_repo.history()?)
}
