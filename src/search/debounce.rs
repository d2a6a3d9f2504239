//! Debounced invocation / 防抖调用
//!
//! Coalesces rapid successive calls into one delayed invocation. Every call
//! cancels the pending timer and schedules a fresh one with the latest
//! arguments, so only the last call in any quiet window of `delay` runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Cancellable timer handle / 可取消的定时器句柄
#[derive(Debug)]
pub struct TimerHandle {
    handle: JoinHandle<()>,
}

impl TimerHandle {
    /// Run `f` after `delay` on the current runtime / 延迟执行
    pub fn schedule<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        });
        Self { handle }
    }

    /// Cancel silently; a no-op once fired / 取消（已触发则无效果）
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Debounced wrapper around a target operation / 防抖包装
///
/// At most one scheduled call exists per invoker. Whether the target itself
/// is still busy with an earlier call is the target's concern.
pub struct DebouncedInvoker<T> {
    delay: Duration,
    target: Arc<dyn Fn(T) + Send + Sync>,
    pending: Option<TimerHandle>,
}

impl<T: Send + 'static> DebouncedInvoker<T> {
    pub fn new<F>(delay: Duration, target: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            delay,
            target: Arc::new(target),
            pending: None,
        }
    }

    /// Request an invocation with `args`, superseding any pending one / 请求调用
    pub fn call(&mut self, args: T) {
        self.cancel();
        let target = Arc::clone(&self.target);
        self.pending = Some(TimerHandle::schedule(self.delay, move || target(args)));
    }

    /// Drop the pending invocation, if any / 取消待执行的调用
    pub fn cancel(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.cancel();
        }
    }

    /// Whether a scheduled call has not fired yet / 是否有待执行的调用
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

impl<T> Drop for DebouncedInvoker<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recording(delay: Duration) -> (DebouncedInvoker<String>, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let invoker = DebouncedInvoker::new(delay, move |term: String| sink.lock().push(term));
        (invoker, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_once_with_last_args() {
        let (mut invoker, calls) = recording(Duration::from_millis(800));

        for term in ["b", "ba", "ban", "bank"] {
            invoker.call(term.to_string());
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert!(calls.lock().is_empty());
        assert!(invoker.is_pending());

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(*calls.lock(), vec!["bank".to_string()]);
        assert!(!invoker.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_each_run() {
        let (mut invoker, calls) = recording(Duration::from_millis(100));

        invoker.call("first".to_string());
        tokio::time::sleep(Duration::from_millis(150)).await;
        invoker.call("second".to_string());
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(*calls.lock(), vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_silent() {
        let (mut invoker, calls) = recording(Duration::from_millis(100));

        invoker.call("gone".to_string());
        invoker.cancel();
        assert!(!invoker.is_pending());
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(calls.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending() {
        let (mut invoker, calls) = recording(Duration::from_millis(100));

        invoker.call("gone".to_string());
        drop(invoker);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(calls.lock().is_empty());
    }
}
