// ==========================================
// 客户释放单看板系统 - API 层错误类型
// ==========================================
// 红线: 核心边界不向外抛 panic, 所有错误折叠为可读消息
// ==========================================

use serde::Serialize;
use thiserror::Error;

use crate::engine::BomError;
use crate::repository::RepositoryError;

/// API 层错误类型
#[derive(Error, Debug, Serialize)]
pub enum ApiError {
    #[error("参数错误: {0}")]
    InvalidArgument(String),

    #[error("记录未找到: {0}")]
    NotFound(String),

    #[error("导入失败: {0}")]
    ImportFailed(String),

    #[error("计算失败: {0}")]
    ComputeFailed(String),

    #[error("存储错误: {0}")]
    Storage(String),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} ({})", entity, id))
            }
            RepositoryError::ValidationError(msg)
            | RepositoryError::BusinessRuleViolation(msg) => ApiError::InvalidArgument(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidArgument(format!("{}: {}", field, message))
            }
            other => ApiError::Storage(other.to_string()),
        }
    }
}

impl From<BomError> for ApiError {
    fn from(err: BomError) -> Self {
        match err {
            BomError::CyclicBom { .. } => ApiError::ComputeFailed(err.to_string()),
            BomError::Repository(e) => e.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
