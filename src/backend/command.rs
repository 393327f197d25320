//! 通过外部命令实现的安装后端

use super::parser::{error_summary, parse_installed_list};
use super::{InstallBackend, InstalledPackage, Request};
use crate::config::BackendConfig;
use crate::error::BackendError;
use std::process::Output;

#[derive(Debug, Clone)]
pub struct CommandBackend {
    list_command: Vec<String>,
    add_command: Vec<String>,
}

impl CommandBackend {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            list_command: config.list_command.clone(),
            add_command: config.add_command.clone(),
        }
    }
}

/// 阻塞执行命令，非零退出码转为 BackendError
fn run_command(argv: &[String]) -> Result<Output, BackendError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| BackendError::new("后端命令未配置"))?;

    let output = duct::cmd(program.as_str(), args)
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .map_err(|e| BackendError::new(format!("无法执行 {}: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        return Err(BackendError::new(error_summary(&stderr, &stdout)));
    }
    Ok(output)
}

impl InstallBackend for CommandBackend {
    fn list_installed(&self) -> Request<Vec<InstalledPackage>> {
        let (completer, request) = Request::channel();
        let argv = self.list_command.clone();

        tokio::task::spawn_blocking(move || {
            let result = run_command(&argv)
                .map(|output| parse_installed_list(&String::from_utf8_lossy(&output.stdout)));
            completer.finish(result);
        });

        request
    }

    fn add(&self, source_reference: &str) -> Request<()> {
        let (completer, request) = Request::channel();
        let mut argv = self.add_command.clone();
        argv.push(source_reference.to_string());

        tokio::task::spawn_blocking(move || {
            completer.finish(run_command(&argv).map(|_| ()));
        });

        request
    }
}
