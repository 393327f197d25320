//! 错误类型定义
//!
//! 所有错误都在 Reconciler 边界被记录并消化，不会继续向上传播。

use thiserror::Error;

/// 安装后端（list / add）返回的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// 清单下载失败（传输层）
    #[error("网络错误: {0}")]
    Network(String),

    /// 清单 JSON 格式错误或缺少字段
    #[error("清单解析失败: {0}")]
    Parse(String),

    #[error("后端错误: {0}")]
    Backend(#[from] BackendError),

    /// 操作超过时限仍未完成
    #[error("{operation} 超时 ({seconds} 秒)")]
    Timeout { operation: String, seconds: u64 },

    /// 已有操作在进行中，新的请求被拒绝
    #[error("已有操作正在进行: {active}")]
    ConcurrencyRejected { active: String },

    #[error("清单中不存在软件包: {0}")]
    UnknownPackage(String),
}

impl From<serde_json::Error> for TrackerError {
    fn from(e: serde_json::Error) -> Self {
        TrackerError::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(e: reqwest::Error) -> Self {
        TrackerError::Network(e.to_string())
    }
}
