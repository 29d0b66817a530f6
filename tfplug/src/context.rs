//! Request-scoped context
//!
//! Every trait method receives a [`Context`] as its first parameter. It carries
//! an optional deadline, a cancellation signal and arbitrary typed values.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::{self, Instant};

/// Context carries request-scoped values like cancellation signals, timeouts, and metadata
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    values: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    done: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        let (done_tx, done_rx) = watch::channel(false);

        Self {
            inner: Arc::new(ContextInner {
                deadline: None,
                values: RwLock::new(HashMap::new()),
                done: done_rx,
                done_tx,
            }),
        }
    }

    /// Returns a child context that is cancelled once `timeout` elapses.
    /// Values stored on the parent are carried over.
    pub async fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let deadline = match self.inner.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };

        let (done_tx, done_rx) = watch::channel(false);
        let timer_tx = done_tx.clone();
        tokio::spawn(async move {
            time::sleep_until(deadline).await;
            let _ = timer_tx.send(true);
        });

        let values = self.inner.values.read().await.clone();

        Self {
            inner: Arc::new(ContextInner {
                deadline: Some(deadline),
                values: RwLock::new(values),
                done: done_rx,
                done_tx,
            }),
        }
    }

    pub async fn with_value<T: Send + Sync + 'static>(self, key: &str, value: T) -> Self {
        self.inner
            .values
            .write()
            .await
            .insert(key.to_string(), Arc::new(value));
        self
    }

    pub async fn get_value<T>(&self, key: &str) -> Option<T>
    where
        T: Send + Sync + Clone + 'static,
    {
        let values = self.inner.values.read().await;
        values.get(key).and_then(|v| v.downcast_ref::<T>()).cloned()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.done.borrow()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline, or None when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The smaller of `default` and the time left on this context
    pub fn bounded(&self, default: Duration) -> Duration {
        match self.remaining() {
            Some(left) => left.min(default),
            None => default,
        }
    }

    /// Returns a channel that flips to true when work done on behalf of this
    /// context should stop
    pub fn done(&self) -> watch::Receiver<bool> {
        self.inner.done.clone()
    }

    pub fn cancel(&self) {
        let _ = self.inner.done_tx.send(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn context_stores_and_retrieves_values() {
        let ctx = Context::new();
        let ctx = ctx.with_value("region", "jp1".to_string()).await;

        let value: Option<String> = ctx.get_value("region").await;
        assert_eq!(value, Some("jp1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn context_timeout_cancels() {
        let ctx = Context::new().with_timeout(Duration::from_millis(100)).await;

        assert!(!ctx.is_cancelled());

        sleep(Duration::from_millis(150)).await;

        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn context_manual_cancel() {
        let ctx = Context::new();

        assert!(!ctx.is_cancelled());

        ctx.cancel();

        assert!(ctx.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_uses_the_shorter_duration() {
        let ctx = Context::new();
        assert_eq!(ctx.bounded(Duration::from_secs(600)), Duration::from_secs(600));

        let ctx = ctx.with_timeout(Duration::from_secs(30)).await;
        assert!(ctx.bounded(Duration::from_secs(600)) <= Duration::from_secs(30));
        assert_eq!(ctx.bounded(Duration::from_secs(5)), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn child_context_keeps_parent_values() {
        let ctx = Context::new()
            .with_value("request_id", 7_u32)
            .await
            .with_timeout(Duration::from_secs(1))
            .await;

        assert_eq!(ctx.get_value::<u32>("request_id").await, Some(7));
        assert!(ctx.deadline().is_some());
    }
}
