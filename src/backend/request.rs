//! 后端请求句柄
//!
//! 后端立即返回 `Request`，实际工作在别处进行，完成后通过 `Completer` 回报。
//! 调用方只能轮询，没有回调。

use crate::error::BackendError;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

#[derive(Debug, PartialEq, Eq)]
pub enum RequestStatus<T> {
    InProgress,
    Success(T),
    Failure(String),
}

#[derive(Debug)]
pub struct Request<T> {
    rx: oneshot::Receiver<Result<T, BackendError>>,
}

#[derive(Debug)]
pub struct Completer<T> {
    tx: oneshot::Sender<Result<T, BackendError>>,
}

impl<T> Request<T> {
    pub fn channel() -> (Completer<T>, Request<T>) {
        let (tx, rx) = oneshot::channel();
        (Completer { tx }, Request { rx })
    }

    /// 采样一次完成状态。结果只会被取出一次，之后再调用视为失败。
    pub fn poll_status(&mut self) -> RequestStatus<T> {
        match self.rx.try_recv() {
            Ok(Ok(value)) => RequestStatus::Success(value),
            Ok(Err(e)) => RequestStatus::Failure(e.message),
            Err(TryRecvError::Empty) => RequestStatus::InProgress,
            Err(TryRecvError::Closed) => {
                RequestStatus::Failure("后端在完成前放弃了该请求".to_string())
            }
        }
    }
}

impl<T> Completer<T> {
    pub fn finish(self, result: Result<T, BackendError>) {
        // 接收方已超时放弃时发送失败，忽略即可
        let _ = self.tx.send(result);
    }

    #[cfg(test)]
    pub fn succeed(self, value: T) {
        self.finish(Ok(value));
    }

    #[cfg(test)]
    pub fn fail(self, message: impl Into<String>) {
        self.finish(Err(BackendError::new(message)));
    }
}
