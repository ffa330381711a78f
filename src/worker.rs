//! Background scans.
//!
//! A [`ScanWorker`] opens its source on a dedicated thread, so the camera
//! handle never leaves that thread, and streams [`ScanEvent`]s back to the
//! front end. Stopping is a message: [`ScanWorker::cancel`] is observed at
//! the next frame boundary.

use crate::decoder::{DecodeInvoker, Decoder};
use crate::error::{Result, ScanError};
use crate::models::{ScanRecord, SourceKind};
use crate::pipeline::{ScanSummary, run_scan};
use crate::session::SharedSession;
use crate::signal::{CancelHandle, cancel_pair};
use crate::source::{CameraProvider, SourceRequest};
use crossbeam_channel::{Receiver, unbounded};
use log::{error, info};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Progress reported by a worker, in order.
#[derive(Debug)]
pub enum ScanEvent {
    /// The source opened and frames are flowing
    Started(SourceKind),
    /// A record was added to the session
    Detected(ScanRecord),
    /// The scan ended normally or by cancellation; the source is released
    Finished(ScanSummary),
    /// The scan could not start or was refused
    Failed(ScanError),
}

/// Where and how a worker scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Downscale frames above this size
    pub max_dimension: Option<u32>,
    /// Decode directories on the rayon pool
    pub parallel: bool,
}

/// Handle to a scan running on its own thread.
///
/// Dropping the handle cancels the scan and waits for the thread.
pub struct ScanWorker {
    handle: Option<JoinHandle<()>>,
    cancel: CancelHandle,
    events: Receiver<ScanEvent>,
}

impl ScanWorker {
    /// Start scanning `request` into `session`.
    pub fn spawn<D>(
        request: SourceRequest,
        settings: WorkerSettings,
        invoker: Arc<DecodeInvoker<D>>,
        cameras: Arc<dyn CameraProvider>,
        session: SharedSession,
    ) -> Result<Self>
    where
        D: Decoder + 'static,
    {
        let (cancel, token) = cancel_pair();
        let (tx, events) = unbounded();

        let handle = thread::Builder::new()
            .name("qr-scan-worker".into())
            .spawn(move || {
                let kind = request.kind();
                let outcome = request
                    .open(settings.max_dimension, cameras.as_ref(), token)
                    .and_then(|mut source| {
                        let _ = tx.send(ScanEvent::Started(kind));
                        run_scan(
                            &mut source,
                            &*invoker,
                            &session,
                            settings.parallel,
                            |report| {
                                for record in &report.added {
                                    let _ = tx.send(ScanEvent::Detected(record.clone()));
                                }
                            },
                        )
                    });
                let event = match outcome {
                    Ok(summary) => ScanEvent::Finished(summary),
                    Err(err) => {
                        error!("{kind} scan failed: {err}");
                        ScanEvent::Failed(err)
                    }
                };
                let _ = tx.send(event);
            })
            .map_err(|err| ScanError::Worker(format!("failed to spawn scan thread: {err}")))?;

        Ok(Self {
            handle: Some(handle),
            cancel,
            events,
        })
    }

    /// Ask the scan to stop at the next frame.
    pub fn cancel(&self) {
        info!("Cancel requested for scan worker");
        self.cancel.cancel();
    }

    /// Cancel handle that can outlive a borrow of the worker
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Progress events; the channel disconnects once the thread exits.
    pub fn events(&self) -> &Receiver<ScanEvent> {
        &self.events
    }

    /// True once the thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the thread without cancelling it.
    pub fn join(mut self) -> Result<()> {
        self.wait()
    }

    fn wait(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ScanError::Worker("scan thread panicked".into())),
            None => Ok(()),
        }
    }
}

impl Drop for ScanWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
            if let Err(err) = self.wait() {
                error!("{err}");
            }
        }
    }
}
