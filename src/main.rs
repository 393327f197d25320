mod backend;
mod catalog;
mod config;
mod error;
mod manifest;
mod poller;
mod reconciler;
#[cfg(test)]
mod testing;
mod tui;

use anyhow::Result;
use backend::CommandBackend;
use manifest::HttpManifestSource;
use reconciler::Reconciler;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 加载配置
    let config = config::Config::load_or_default()?;
    log::info!("清单地址: {}", config.manifest_url);

    let source = Arc::new(HttpManifestSource::new(config.proxy.as_deref())?);
    let backend = Arc::new(CommandBackend::new(&config.backend));
    let reconciler = Reconciler::new(&config, source, backend);

    tui::run(reconciler, config).await?;

    Ok(())
}
