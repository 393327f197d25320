//! 远程清单：下载与解析

use crate::catalog::Package;
use crate::error::TrackerError;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Manifest {
    packages: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    name: String,
    version: String,
    url: String,
}

/// 解析清单 JSON，所有软件包初始状态为 Unknown
pub fn parse_manifest(bytes: &[u8]) -> Result<Vec<Package>, TrackerError> {
    let manifest: Manifest = serde_json::from_slice(bytes)?;
    Ok(manifest
        .packages
        .into_iter()
        .map(|e| Package::new(e.name, e.version, e.url))
        .collect())
}

/// 清单来源
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TrackerError>;
}

pub struct HttpManifestSource {
    client: Client,
}

impl HttpManifestSource {
    pub fn new(proxy: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("pkgwatch/", env!("CARGO_PKG_VERSION")));
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl ManifestSource for HttpManifestSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TrackerError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(TrackerError::Network(format!(
                "请求 {} 失败 (状态码 {})",
                url,
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
