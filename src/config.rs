use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MANIFEST_URL: &str = "https://packages.example.com/manifest/packages.json";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// 清单地址的环境变量覆盖
const MANIFEST_URL_ENV: &str = "PKGWATCH_MANIFEST_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub manifest_url: String,
    pub operation_timeout_seconds: u64,
    /// HTTP 代理，仅用于下载清单
    pub proxy: Option<String>,
    pub backend: BackendConfig,
}

/// 外部安装后端的命令行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// 输出 "名称 版本" 每行一个
    pub list_command: Vec<String>,
    /// 末尾追加源引用作为参数
    pub add_command: Vec<String>,
    /// 源引用前缀，如 git+
    pub source_scheme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            operation_timeout_seconds: DEFAULT_TIMEOUT_SECS,
            proxy: None,
            backend: BackendConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            list_command: vec!["pkgwatch-backend".to_string(), "list".to_string()],
            add_command: vec!["pkgwatch-backend".to_string(), "add".to_string()],
            source_scheme: "git+".to_string(),
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/pkgwatch/config.toml")
    }

    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env_override(std::env::var(MANIFEST_URL_ENV).ok());
        Ok(config)
    }

    /// 文件中未显式配置时才使用环境变量
    fn apply_env_override(&mut self, env_url: Option<String>) {
        if let Some(url) = env_url {
            if !url.trim().is_empty() && self.manifest_url == DEFAULT_MANIFEST_URL {
                self.manifest_url = url;
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.operation_timeout_seconds == 0 {
            bail!("operation_timeout_seconds 必须大于 0");
        }
        if self.backend.list_command.is_empty() {
            bail!("backend.list_command 不能为空");
        }
        if self.backend.add_command.is_empty() {
            bail!("backend.add_command 不能为空");
        }
        Ok(())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config = Config::from_toml(r#"manifest_url = "https://example.org/p.json""#).unwrap();
        assert_eq!(config.manifest_url, "https://example.org/p.json");
        assert_eq!(config.operation_timeout(), Duration::from_secs(60));
        assert_eq!(config.backend, BackendConfig::default());
        assert!(config.proxy.is_none());
    }

    #[test]
    fn backend_section_is_read() {
        let config = Config::from_toml(
            r#"
operation_timeout_seconds = 15

[backend]
list_command = ["upm", "ls"]
add_command = ["upm", "install"]
source_scheme = "hg+"
"#,
        )
        .unwrap();
        assert_eq!(config.operation_timeout_seconds, 15);
        assert_eq!(config.backend.list_command, ["upm", "ls"]);
        assert_eq!(config.backend.add_command, ["upm", "install"]);
        assert_eq!(config.backend.source_scheme, "hg+");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Config::from_toml("operation_timeout_seconds = 0").is_err());
    }

    #[test]
    fn env_url_fills_in_default() {
        let mut config = Config::default();
        config.apply_env_override(Some("https://mirror.test/p.json".to_string()));
        assert_eq!(config.manifest_url, "https://mirror.test/p.json");
    }

    #[test]
    fn file_url_wins_over_env() {
        let mut config =
            Config::from_toml(r#"manifest_url = "https://example.org/p.json""#).unwrap();
        config.apply_env_override(Some("https://mirror.test/p.json".to_string()));
        assert_eq!(config.manifest_url, "https://example.org/p.json");
    }

    #[test]
    fn blank_or_missing_env_keeps_default() {
        let mut config = Config::default();
        config.apply_env_override(Some("  ".to_string()));
        assert_eq!(config.manifest_url, DEFAULT_MANIFEST_URL);
        config.apply_env_override(None);
        assert_eq!(config.manifest_url, DEFAULT_MANIFEST_URL);
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(Config::from_toml("[backend]\nlist_command = []").is_err());
    }
}
