// ==========================================
// 客户释放单看板系统 - 命令响应封装
// ==========================================
// 口径: 边界统一返回 (ok, message, data) 三元组
// ==========================================

use serde::Serialize;

use crate::api::{ApiError, ApiResult};

// ==========================================
// CommandResponse - 统一响应
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse<T: Serialize> {
    pub ok: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> CommandResponse<T> {
    pub fn success(data: T) -> Self {
        CommandResponse {
            ok: true,
            message: "成功".to_string(),
            data: Some(data),
        }
    }

    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        CommandResponse {
            ok: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(err: &ApiError) -> Self {
        CommandResponse {
            ok: false,
            message: err.to_string(),
            data: None,
        }
    }
}

impl<T: Serialize> From<ApiResult<T>> for CommandResponse<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => CommandResponse::success(data),
            Err(e) => CommandResponse::failure(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_from_result() {
        let ok: CommandResponse<i64> = Ok(42).into();
        assert!(ok.ok);
        assert_eq!(ok.data, Some(42));

        let err: CommandResponse<i64> =
            Err(ApiError::InvalidArgument("排程名称不能为空".to_string())).into();
        assert!(!err.ok);
        assert!(err.message.contains("排程名称不能为空"));
        assert_eq!(err.data, None);
    }
}
