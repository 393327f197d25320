//! 操作轮询器
//!
//! 每个调度周期调用一次 `tick`，对所有登记的请求采样完成状态和耗时。
//! 请求完成或超时（先到者为准）时调用完成回调，并在同一周期内注销。
//! 回调是 `FnOnce`，同一请求不会触发两次。没有重试。

use crate::backend::{Request, RequestStatus};
use std::time::Duration;
use tokio::time::Instant;

/// 操作的终态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Succeeded(T),
    Failed(String),
    /// 超时时请求仍未完成
    TimedOut,
}

type Handler<T, S> = Box<dyn FnOnce(Outcome<T>, &mut S)>;

trait Watch<S> {
    /// 返回 true 表示已触发，应当注销
    fn sample(&mut self, now: Instant, state: &mut S) -> bool;
}

struct Pending<T, S> {
    request: Request<T>,
    registered_at: Instant,
    timeout: Duration,
    on_complete: Option<Handler<T, S>>,
}

impl<T, S> Watch<S> for Pending<T, S> {
    fn sample(&mut self, now: Instant, state: &mut S) -> bool {
        let Some(handler) = self.on_complete.take() else {
            return true;
        };

        // 先看是否完成，超时与完成同时满足时以完成为准
        let outcome = match self.request.poll_status() {
            RequestStatus::Success(value) => Outcome::Succeeded(value),
            RequestStatus::Failure(message) => Outcome::Failed(message),
            RequestStatus::InProgress => {
                if now.saturating_duration_since(self.registered_at) > self.timeout {
                    Outcome::TimedOut
                } else {
                    self.on_complete = Some(handler);
                    return false;
                }
            }
        };

        handler(outcome, state);
        true
    }
}

/// `S` 是交给完成回调的可变状态
pub struct Poller<S> {
    watches: Vec<Box<dyn Watch<S>>>,
}

impl<S: 'static> Poller<S> {
    pub fn new() -> Self {
        Self {
            watches: Vec::new(),
        }
    }

    pub fn watch<T: 'static>(
        &mut self,
        request: Request<T>,
        registered_at: Instant,
        timeout: Duration,
        on_complete: impl FnOnce(Outcome<T>, &mut S) + 'static,
    ) {
        log::debug!("登记轮询请求，超时 {:?}", timeout);
        self.watches.push(Box::new(Pending {
            request,
            registered_at,
            timeout,
            on_complete: Some(Box::new(on_complete)),
        }));
    }

    /// 采样所有登记的请求，返回本周期触发的回调数
    pub fn tick(&mut self, now: Instant, state: &mut S) -> usize {
        let before = self.watches.len();
        self.watches.retain_mut(|w| !w.sample(now, state));
        let fired = before - self.watches.len();
        if fired > 0 {
            log::debug!("本周期完成 {} 个请求", fired);
        }
        fired
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.watches.len()
    }
}

impl<S: 'static> Default for Poller<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(60);

    /// 回调收到的所有终态
    type Log = Vec<Outcome<u32>>;

    fn record(outcome: Outcome<u32>, log: &mut Log) {
        log.push(outcome);
    }

    #[test]
    fn fires_once_on_success() {
        let start = Instant::now();
        let mut poller = Poller::<Log>::new();
        let mut log = Log::new();
        let (completer, request) = Request::channel();
        poller.watch(request, start, TIMEOUT, record);

        assert_eq!(poller.tick(start, &mut log), 0);
        assert!(log.is_empty());

        completer.succeed(42);
        assert_eq!(poller.tick(start + Duration::from_secs(1), &mut log), 1);
        assert_eq!(poller.pending(), 0);

        // 之后无论多少周期都不再触发
        for i in 2..100 {
            poller.tick(start + Duration::from_secs(i), &mut log);
        }
        assert_eq!(log, vec![Outcome::Succeeded(42)]);
    }

    #[test]
    fn fires_failure_with_message() {
        let start = Instant::now();
        let mut poller = Poller::<Log>::new();
        let mut log = Log::new();
        let (completer, request) = Request::channel();
        poller.watch(request, start, TIMEOUT, record);

        completer.fail("checkout failed");
        poller.tick(start, &mut log);
        poller.tick(start, &mut log);
        assert_eq!(log, vec![Outcome::Failed("checkout failed".to_string())]);
    }

    #[test]
    fn times_out_when_never_completed() {
        let start = Instant::now();
        let mut poller = Poller::<Log>::new();
        let mut log = Log::new();
        let (completer, request) = Request::channel();
        poller.watch(request, start, TIMEOUT, record);

        // 恰好等于时限时尚未超时
        poller.tick(start + TIMEOUT, &mut log);
        assert!(log.is_empty());

        let tick = Duration::from_millis(100);
        poller.tick(start + TIMEOUT + tick, &mut log);
        assert_eq!(log, vec![Outcome::TimedOut]);

        // 超时后才完成，不会再触发
        completer.succeed(1);
        poller.tick(start + TIMEOUT + tick * 2, &mut log);
        assert_eq!(log, vec![Outcome::TimedOut]);
        assert_eq!(poller.pending(), 0);
    }

    #[test]
    fn completion_wins_over_timeout_in_same_tick() {
        let start = Instant::now();
        let mut poller = Poller::<Log>::new();
        let mut log = Log::new();
        let (completer, request) = Request::channel();
        poller.watch(request, start, TIMEOUT, record);

        completer.succeed(5);
        poller.tick(start + TIMEOUT * 2, &mut log);
        assert_eq!(log, vec![Outcome::Succeeded(5)]);
    }

    #[test]
    fn watches_are_independent() {
        let start = Instant::now();
        let mut poller = Poller::<Log>::new();
        let mut log = Log::new();
        let (first, r1) = Request::channel();
        let (_second, r2) = Request::channel();
        poller.watch(r1, start, TIMEOUT, record);
        poller.watch(r2, start + Duration::from_secs(30), TIMEOUT, record);
        assert_eq!(poller.pending(), 2);

        first.succeed(1);
        poller.tick(start + Duration::from_secs(61), &mut log);
        assert_eq!(log, vec![Outcome::Succeeded(1)]);
        assert_eq!(poller.pending(), 1);

        poller.tick(start + Duration::from_secs(91), &mut log);
        assert_eq!(log, vec![Outcome::Succeeded(1), Outcome::TimedOut]);
        assert_eq!(poller.pending(), 0);
    }
}
