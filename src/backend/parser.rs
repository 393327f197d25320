//! 后端输出解析函数

use super::InstalledPackage;

/// 解析 list 命令输出：每行 "名称 版本"，多余的列忽略
pub fn parse_installed_list(output: &str) -> Vec<InstalledPackage> {
    let mut packages = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(name), Some(version)) => {
                packages.push(InstalledPackage::new(name, version));
            }
            _ => {
                log::debug!("跳过无法解析的行: {}", trimmed);
            }
        }
    }

    packages
}

/// 从命令的 stderr/stdout 中提取一条简短的错误信息
pub fn error_summary(stderr: &str, stdout: &str) -> String {
    let pick = |s: &str| {
        s.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .map(str::to_string)
    };
    pick(stderr)
        .or_else(|| pick(stdout))
        .unwrap_or_else(|| "命令执行失败".to_string())
}
