//! One-shot result delivery between the engine and callers

use commentguard_core::{ClassificationOutcome, Error, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

type Delivery = Result<ClassificationOutcome>;

/// Engine-side half of a caller's pending result.
///
/// Resolves at most once; later calls are no-ops.
#[derive(Debug)]
pub struct Waiter {
    tx: Option<oneshot::Sender<Delivery>>,
}

impl Waiter {
    /// Create a waiter and the handle its caller awaits
    pub fn channel(key: impl Into<String>) -> (Self, ResultHandle) {
        let (tx, rx) = oneshot::channel();
        (
            Self { tx: Some(tx) },
            ResultHandle {
                key: key.into(),
                rx,
            },
        )
    }

    /// Deliver a result. Returns false if this waiter was already resolved.
    ///
    /// A caller that dropped its handle still counts as resolved.
    pub fn resolve(&mut self, result: Delivery) -> bool {
        match self.tx.take() {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.is_none()
    }
}

/// Caller-held future that yields the classification for one submission
#[derive(Debug)]
pub struct ResultHandle {
    key: String,
    rx: oneshot::Receiver<Delivery>,
}

impl ResultHandle {
    /// Dedup key the submission was buffered under
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Future for ResultHandle {
    type Output = Delivery;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(Error::Closed)))
    }
}
