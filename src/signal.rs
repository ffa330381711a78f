//! Cancellation messages between a front end and a scan worker.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Front-end side: asks the worker to stop at the next frame boundary.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Sender<()>,
}

impl CancelHandle {
    /// Request cancellation. Repeated calls are harmless.
    pub fn cancel(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Worker side: polled once per frame.
///
/// Dropping every [`CancelHandle`] also counts as cancellation, so a worker
/// never outlives the front end that started it.
#[derive(Debug)]
pub struct CancelToken {
    rx: Receiver<()>,
    cancelled: bool,
}

impl CancelToken {
    /// A token nobody can cancel.
    pub fn never() -> Self {
        Self {
            rx: crossbeam_channel::never(),
            cancelled: false,
        }
    }

    /// Check for a pending request without blocking.
    pub fn is_cancelled(&mut self) -> bool {
        if !self.cancelled {
            self.cancelled = match self.rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => true,
                Err(TryRecvError::Empty) => false,
            };
        }
        self.cancelled
    }
}

/// Create a connected handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (
        CancelHandle { tx },
        CancelToken {
            rx,
            cancelled: false,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_observed_and_sticky() {
        let (handle, mut token) = cancel_pair();
        assert!(!token.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(token.is_cancelled());
    }

    #[test]
    fn dropping_all_handles_cancels() {
        let (handle, mut token) = cancel_pair();
        let clone = handle.clone();
        drop(handle);
        assert!(!token.is_cancelled());
        drop(clone);
        assert!(token.is_cancelled());
    }

    #[test]
    fn never_token_stays_live() {
        let mut token = CancelToken::never();
        assert!(!token.is_cancelled());
    }
}
