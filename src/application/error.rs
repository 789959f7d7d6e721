//! 应用层错误定义
//!
//! 所有失败都只作用于触发它的那次操作：
//! - 校验错误：同步拒绝，不发网络请求
//! - 可恢复的请求失败：本次操作中止，状态仍可用
//! - 辅助操作失败（自动保存、可选文件）不会走到这里，只记日志

use thiserror::Error;

use crate::application::ports::ApiError;
use crate::domain::batch::BatchRejection;
use crate::domain::template::TemplateError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 缺少必填输入
    #[error("{0}")]
    ValidationError(String),

    /// 当前状态不允许该操作
    #[error("{0}")]
    InvalidState(String),

    /// 后端请求失败
    #[error("{context}: {source}")]
    ApiFailure {
        context: String,
        #[source]
        source: ApiError,
    },

    /// 业务步骤失败（后端拒绝、没有可用章节等）
    #[error("{0}")]
    OperationFailed(String),

    /// 编辑器内容不是合法 JSON
    #[error("JSON格式错误: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 包装后端错误并附带操作说明
    pub fn api(context: impl Into<String>, source: ApiError) -> Self {
        Self::ApiFailure {
            context: context.into(),
            source,
        }
    }

    /// 创建业务失败错误
    pub fn failed(message: impl Into<String>) -> Self {
        Self::OperationFailed(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }
}

impl From<TemplateError> for ApplicationError {
    fn from(err: TemplateError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<BatchRejection> for ApplicationError {
    fn from(err: BatchRejection) -> Self {
        Self::InvalidState(err.to_string())
    }
}
