//! 状态协调器
//!
//! 合并远程清单与后端报告的已安装软件包，计算每个软件包的状态，
//! 并串行化 list / install / update 操作：同一时刻最多一个操作在进行，
//! 其余请求直接拒绝，不排队。
//!
//! 所有方法都在同一个逻辑线程（TUI 主循环）上调用，清单下载和后端命令
//! 在别处执行，结果只通过 `tick` 采样后才生效。

use crate::backend::{source_reference, InstallBackend, InstalledPackage};
use crate::catalog::{Catalog, Package, PackageStatus};
use crate::config::Config;
use crate::error::{BackendError, TrackerError};
use crate::manifest::{parse_manifest, ManifestSource};
use crate::poller::{Outcome, Poller};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    ListInstalled,
    Install(String),
    Update(String),
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::ListInstalled => write!(f, "更新软件包状态"),
            OperationKind::Install(name) => write!(f, "安装 {}", name),
            OperationKind::Update(name) => write!(f, "更新 {}", name),
        }
    }
}

/// 当前进行中的操作
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationState {
    pub in_progress: bool,
    pub message: String,
    pub kind: Option<OperationKind>,
    pub started_at: Option<Instant>,
    pub deadline: Option<Instant>,
}

impl OperationState {
    fn begin(&mut self, kind: OperationKind, now: Instant, timeout: Duration) {
        self.in_progress = true;
        self.message = format!("正在{}...", kind);
        self.kind = Some(kind);
        self.started_at = Some(now);
        self.deadline = Some(now + timeout);
    }

    fn finish(&mut self) {
        *self = OperationState::default();
    }

    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.started_at.map(|t| now.saturating_duration_since(t))
    }
}

/// 协调器持有的全部可观察状态，视图只读
#[derive(Debug, Default)]
pub struct TrackerState {
    pub catalog: Catalog,
    pub operation: OperationState,
    pub last_refreshed: Option<DateTime<Local>>,
    /// 最近一次警告或错误，成功完成操作后清除
    pub notice: Option<String>,
    /// 安装/更新失败的提示在随后的自动刷新中保留，直到用户发起下一个命令
    notice_held: bool,
    repaint: bool,
    refresh_requested: bool,
}

impl TrackerState {
    fn apply_installed(&mut self, installed: Vec<InstalledPackage>) {
        let versions: HashMap<String, String> = installed
            .into_iter()
            .map(|p| (p.name, p.version))
            .collect();

        for package in self.catalog.iter_mut() {
            let installed_version = versions.get(&package.name).map(String::as_str);
            package.status = PackageStatus::derive(&package.version, installed_version);
        }

        log::info!(
            "软件包状态: {} 个最新, {} 个可更新, {} 个未安装",
            self.catalog.count(PackageStatus::UpToDate),
            self.catalog.count(PackageStatus::Outdated),
            self.catalog.count(PackageStatus::NotInstalled)
        );
    }

    fn report(&mut self, err: &TrackerError) {
        log::error!("{}", err);
        self.notice = Some(err.to_string());
    }

    fn clear_notice(&mut self) {
        if !self.notice_held {
            self.notice = None;
        }
    }
}

type FetchResult = Result<Vec<Package>, TrackerError>;

pub struct Reconciler {
    state: TrackerState,
    poller: Poller<TrackerState>,
    source: Arc<dyn ManifestSource>,
    backend: Arc<dyn InstallBackend>,
    manifest_url: String,
    source_scheme: String,
    timeout: Duration,
    fetch_tx: mpsc::UnboundedSender<FetchResult>,
    fetch_rx: mpsc::UnboundedReceiver<FetchResult>,
    fetches_in_flight: usize,
}

impl Reconciler {
    pub fn new(
        config: &Config,
        source: Arc<dyn ManifestSource>,
        backend: Arc<dyn InstallBackend>,
    ) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        Self {
            state: TrackerState::default(),
            poller: Poller::new(),
            source,
            backend,
            manifest_url: config.manifest_url.clone(),
            source_scheme: config.backend.source_scheme.clone(),
            timeout: config.operation_timeout(),
            fetch_tx,
            fetch_rx,
            fetches_in_flight: 0,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.state.catalog
    }

    pub fn operation(&self) -> &OperationState {
        &self.state.operation
    }

    pub fn is_busy(&self) -> bool {
        self.state.operation.in_progress
    }

    pub fn is_refreshing(&self) -> bool {
        self.fetches_in_flight > 0
    }

    /// 取走重绘请求
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.state.repaint)
    }

    /// 异步下载清单。不受单操作限制，结果在之后的 `tick` 中生效。
    pub fn refresh_catalog(&mut self) {
        self.state.notice_held = false;
        self.start_fetch();
    }

    fn start_fetch(&mut self) {
        let source = Arc::clone(&self.source);
        let url = self.manifest_url.clone();
        let tx = self.fetch_tx.clone();
        self.fetches_in_flight += 1;

        log::debug!("开始下载清单: {}", url);
        tokio::spawn(async move {
            let fetch = tokio::spawn(async move {
                source.fetch(&url).await.and_then(|bytes| parse_manifest(&bytes))
            });
            // 下载任务 panic 时也要回报
            let result = match fetch.await {
                Ok(result) => result,
                Err(e) => Err(TrackerError::Network(format!("清单下载任务异常退出: {}", e))),
            };
            let _ = tx.send(result);
        });
    }

    /// 向后端请求已安装列表并据此更新所有软件包状态
    pub fn reconcile_installed_status(&mut self) -> Result<(), TrackerError> {
        self.state.notice_held = false;
        self.start_list()
    }

    fn start_list(&mut self) -> Result<(), TrackerError> {
        self.ensure_idle()?;

        let now = Instant::now();
        self.state
            .operation
            .begin(OperationKind::ListInstalled, now, self.timeout);
        let request = self.backend.list_installed();
        let seconds = self.timeout.as_secs();

        self.poller.watch(request, now, self.timeout, move |outcome, state: &mut TrackerState| {
            match outcome {
                Outcome::Succeeded(installed) => {
                    state.apply_installed(installed);
                    state.clear_notice();
                }
                Outcome::Failed(message) => {
                    state.report(&BackendError::new(message).into());
                }
                Outcome::TimedOut => {
                    state.report(&TrackerError::Timeout {
                        operation: OperationKind::ListInstalled.to_string(),
                        seconds,
                    });
                }
            }
            // 失败或超时时保留原有状态
            state.operation.finish();
            state.repaint = true;
        });

        Ok(())
    }

    pub fn install_package(&mut self, name: &str) -> Result<(), TrackerError> {
        self.add_package(name, OperationKind::Install)
    }

    pub fn update_package(&mut self, name: &str) -> Result<(), TrackerError> {
        self.add_package(name, OperationKind::Update)
    }

    /// 安装和更新都是调用后端的 add
    fn add_package(
        &mut self,
        name: &str,
        kind: fn(String) -> OperationKind,
    ) -> Result<(), TrackerError> {
        self.state.notice_held = false;
        self.ensure_idle()?;

        let Some(package) = self.state.catalog.find_by_name(name) else {
            let err = TrackerError::UnknownPackage(name.to_string());
            log::warn!("{}", err);
            self.state.notice = Some(err.to_string());
            return Err(err);
        };
        let reference = source_reference(&package.url, &self.source_scheme);
        let kind = kind(package.name.clone());

        let now = Instant::now();
        self.state.operation.begin(kind.clone(), now, self.timeout);
        log::info!("{}: {}", kind, reference);
        let request = self.backend.add(&reference);
        let seconds = self.timeout.as_secs();

        self.poller.watch(request, now, self.timeout, move |outcome, state: &mut TrackerState| {
            match outcome {
                Outcome::Succeeded(()) => {
                    log::info!("{} 成功", kind);
                    state.notice = None;
                }
                Outcome::Failed(message) => {
                    state.report(&TrackerError::Backend(BackendError::new(format!(
                        "{} 失败: {}",
                        kind, message
                    ))));
                    state.notice_held = true;
                }
                Outcome::TimedOut => {
                    state.report(&TrackerError::Timeout {
                        operation: kind.to_string(),
                        seconds,
                    });
                    state.notice_held = true;
                }
            }
            state.operation.finish();
            // 无论结果如何都重新下载清单并比对
            state.refresh_requested = true;
            state.repaint = true;
        });

        Ok(())
    }

    fn ensure_idle(&mut self) -> Result<(), TrackerError> {
        if self.state.operation.in_progress {
            let err = TrackerError::ConcurrencyRejected {
                active: self.state.operation.message.clone(),
            };
            log::warn!("{}", err);
            self.state.notice = Some(err.to_string());
            return Err(err);
        }
        Ok(())
    }

    /// 调度周期：应用已完成的下载，采样进行中的操作，处理后续刷新
    pub fn tick(&mut self) {
        while let Ok(result) = self.fetch_rx.try_recv() {
            self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
            self.apply_fetch(result);
        }

        self.poller.tick(Instant::now(), &mut self.state);

        if std::mem::take(&mut self.state.refresh_requested) {
            self.start_fetch();
        }
    }

    fn apply_fetch(&mut self, result: FetchResult) {
        match result {
            Ok(packages) => {
                log::info!("清单已更新，共 {} 个软件包", packages.len());
                self.state.catalog.replace_all(packages);
                self.state.last_refreshed = Some(Local::now());
                self.state.repaint = true;
                // 被拒绝时已记录日志，保持 Unknown
                let _ = self.start_list();
            }
            Err(err) => {
                // 保留原有目录
                self.state.report(&err);
                self.state.repaint = true;
            }
        }
    }
}
