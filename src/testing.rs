//! 测试用的清单来源与安装后端

use crate::backend::{Completer, InstallBackend, InstalledPackage, Request};
use crate::error::TrackerError;
use crate::manifest::ManifestSource;
use crate::reconciler::Reconciler;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct FakeSource {
    response: Mutex<Result<Vec<u8>, TrackerError>>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(manifest: &str) -> Self {
        Self {
            response: Mutex::new(Ok(manifest.as_bytes().to_vec())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_manifest(&self, manifest: &str) {
        *self.response.lock().expect("source lock") = Ok(manifest.as_bytes().to_vec());
    }

    pub fn set_error(&self, err: TrackerError) {
        *self.response.lock().expect("source lock") = Err(err);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestSource for FakeSource {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, TrackerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.lock().expect("source lock").clone()
    }
}

#[derive(Debug, Clone)]
pub enum ListBehavior {
    Reply(Vec<InstalledPackage>),
    Fail(String),
    /// 永不完成
    Hang,
}

#[derive(Debug, Clone)]
pub enum AddBehavior {
    Succeed,
    Fail(String),
    Hang,
}

pub struct FakeBackend {
    list: Mutex<ListBehavior>,
    add: Mutex<AddBehavior>,
    list_calls: AtomicUsize,
    add_calls: Mutex<Vec<String>>,
    // 挂起的请求需要保持 completer 存活，否则会被视为失败
    held_lists: Mutex<Vec<Completer<Vec<InstalledPackage>>>>,
    held_adds: Mutex<Vec<Completer<()>>>,
}

impl FakeBackend {
    pub fn new(list: ListBehavior) -> Self {
        Self {
            list: Mutex::new(list),
            add: Mutex::new(AddBehavior::Succeed),
            list_calls: AtomicUsize::new(0),
            add_calls: Mutex::new(Vec::new()),
            held_lists: Mutex::new(Vec::new()),
            held_adds: Mutex::new(Vec::new()),
        }
    }

    pub fn set_list(&self, behavior: ListBehavior) {
        *self.list.lock().expect("backend lock") = behavior;
    }

    pub fn set_add(&self, behavior: AddBehavior) {
        *self.add.lock().expect("backend lock") = behavior;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn add_calls(&self) -> Vec<String> {
        self.add_calls.lock().expect("backend lock").clone()
    }
}

impl InstallBackend for FakeBackend {
    fn list_installed(&self) -> Request<Vec<InstalledPackage>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let (completer, request) = Request::channel();
        match self.list.lock().expect("backend lock").clone() {
            ListBehavior::Reply(packages) => completer.succeed(packages),
            ListBehavior::Fail(message) => completer.fail(message),
            ListBehavior::Hang => self.held_lists.lock().expect("backend lock").push(completer),
        }
        request
    }

    fn add(&self, source_reference: &str) -> Request<()> {
        self.add_calls
            .lock()
            .expect("backend lock")
            .push(source_reference.to_string());
        let (completer, request) = Request::channel();
        match self.add.lock().expect("backend lock").clone() {
            AddBehavior::Succeed => completer.succeed(()),
            AddBehavior::Fail(message) => completer.fail(message),
            AddBehavior::Hang => self.held_adds.lock().expect("backend lock").push(completer),
        }
        request
    }
}

/// 让出执行权给已派生的下载任务，并推进若干调度周期
pub async fn settle(reconciler: &mut Reconciler) {
    for _ in 0..10 {
        tokio::task::yield_now().await;
        reconciler.tick();
    }
}
