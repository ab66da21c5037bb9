//! Background sticker runs and the state machine around them.
//!
//! `Idle -> Processing -> {Succeeded, Failed}`. One run at a time per
//! orchestrator; a submit while a run is active is rejected with
//! [`Error::Busy`]. The finished sticker stays held in `Succeeded` until it is
//! taken or replaced, and exporting it is a separate action that does not
//! change state.
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, trace, warn};

use crate::core::params::StickerParams;
use crate::core::processing::pipeline::{StickerImage, run_pipeline};
use crate::error::{Error, Result};
use crate::io::export::{StickerArtifact, StickerExporter};
use crate::segmentation::{OracleError, Segmenter};
use crate::types::RasterImage;

/// Snapshot of the orchestrator state, also sent on the completion channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    Idle,
    Processing,
    Succeeded,
    Failed { kind: &'static str, message: String },
}

impl PipelineStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStatus::Succeeded | PipelineStatus::Failed { .. })
    }
}

#[derive(Debug)]
enum RunState {
    Idle,
    Processing,
    Succeeded(StickerImage),
    Failed(Error),
}

impl RunState {
    fn status(&self) -> PipelineStatus {
        match self {
            RunState::Idle => PipelineStatus::Idle,
            RunState::Processing => PipelineStatus::Processing,
            RunState::Succeeded(_) => PipelineStatus::Succeeded,
            RunState::Failed(e) => PipelineStatus::Failed {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

pub struct StickerOrchestrator {
    segmenter: Arc<dyn Segmenter>,
    params: StickerParams,
    state: Arc<Mutex<RunState>>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl StickerOrchestrator {
    pub fn new(segmenter: Arc<dyn Segmenter>, params: StickerParams) -> Self {
        Self {
            segmenter,
            params,
            state: Arc::new(Mutex::new(RunState::Idle)),
            cancel: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn params(&self) -> &StickerParams {
        &self.params
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a run on a background thread.
    ///
    /// The returned receiver yields the terminal status once the run ends. Any
    /// sticker held from a previous run is discarded.
    pub fn submit(&mut self, image: RasterImage) -> Result<Receiver<PipelineStatus>> {
        {
            let mut state = self.lock();
            if matches!(*state, RunState::Processing) {
                debug!("Run already in progress, rejecting submit");
                return Err(Error::Busy);
            }
            *state = RunState::Processing;
        }

        // The previous worker has already published its result; reap it.
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Arc::clone(&cancel);

        let (tx, rx) = mpsc::channel();
        let segmenter = Arc::clone(&self.segmenter);
        let params = self.params.clone();
        let state = Arc::clone(&self.state);

        info!(
            "Sticker run started for {}x{} image",
            image.width(),
            image.height()
        );
        self.worker = Some(thread::spawn(move || {
            trace!("Sticker worker started");
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                run_pipeline(&segmenter, image, &params, &cancel)
            }))
            .unwrap_or_else(|payload| {
                Err(OracleError::Inference(format!(
                    "sticker worker panicked: {}",
                    panic_message(payload.as_ref())
                ))
                .into())
            });
            let next = match outcome {
                Ok(sticker) => RunState::Succeeded(sticker),
                Err(Error::Cancelled) => {
                    info!("Sticker run cancelled");
                    RunState::Failed(Error::Cancelled)
                }
                Err(e) => {
                    error!("Sticker run failed: {}", e);
                    RunState::Failed(e)
                }
            };
            let status = next.status();
            *state.lock().unwrap_or_else(PoisonError::into_inner) = next;
            let _ = tx.send(status);
        }));

        Ok(rx)
    }

    pub fn status(&self) -> PipelineStatus {
        self.lock().status()
    }

    pub fn is_processing(&self) -> bool {
        matches!(*self.lock(), RunState::Processing)
    }

    /// Request cancellation of the active run. The worker stops at its next
    /// stage boundary and the run ends as `Failed(Cancelled)`.
    pub fn cancel(&self) {
        if self.is_processing() {
            debug!("Cancellation requested");
            self.cancel.store(true, Ordering::Release);
        }
    }

    /// Consume a terminal outcome, returning the orchestrator to `Idle`.
    ///
    /// Returns `None` while idle or processing.
    pub fn take_outcome(&self) -> Option<Result<StickerImage>> {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, RunState::Idle) {
            RunState::Succeeded(sticker) => Some(Ok(sticker)),
            RunState::Failed(e) => Some(Err(e)),
            other => {
                *state = other;
                None
            }
        }
    }

    /// A copy of the held sticker, if the last run succeeded.
    pub fn sticker(&self) -> Option<StickerImage> {
        match &*self.lock() {
            RunState::Succeeded(sticker) => Some(sticker.clone()),
            _ => None,
        }
    }

    /// Export the held sticker. State is left unchanged either way.
    pub fn export(&self, exporter: &StickerExporter) -> Result<StickerArtifact> {
        let sticker = self.sticker().ok_or(Error::NoSticker)?;
        exporter.save(&sticker)
    }
}

impl Drop for StickerOrchestrator {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("Sticker worker panicked");
            }
        }
        self.segmenter.close();
        debug!("Segmenter closed");
    }
}
