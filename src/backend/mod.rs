//! 安装后端模块 — 列出已安装软件包、安装/更新软件包

pub mod command;
pub mod parser;
pub mod request;

pub use command::CommandBackend;
pub use request::{Completer, Request, RequestStatus};

/// 后端报告的已安装软件包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
}

impl InstalledPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// 长时间运行的后端操作，调用立即返回句柄，由调用方轮询完成
pub trait InstallBackend: Send + Sync {
    fn list_installed(&self) -> Request<Vec<InstalledPackage>>;

    /// 安装与更新走同一个入口
    fn add(&self, source_reference: &str) -> Request<()>;
}

/// 由清单地址构造后端可识别的源引用，例如 `git+https://...`
pub fn source_reference(url: &str, scheme: &str) -> String {
    if url.starts_with(scheme) {
        url.to_string()
    } else {
        format!("{scheme}{url}")
    }
}
