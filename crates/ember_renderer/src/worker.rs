//! Background render thread.
//!
//! The host keeps its own thread responsive: it starts a job, polls
//! [`RenderEvent`]s off a channel and may raise the cancel flag at any time.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ember_core::Camera;

use crate::{PixelBuffer, RenderError, RenderOutcome, Renderer};

/// Messages from the render thread to the host.
#[derive(Debug)]
pub enum RenderEvent {
    /// Percentage of the current job done.
    Progress(f32),
    Finished {
        image: PixelBuffer,
        elapsed: Duration,
    },
    /// The job was abandoned; `previous` is the last completed image.
    Cancelled { previous: Option<PixelBuffer> },
    Failed(RenderError),
}

/// Runs one render at a time on a named background thread.
///
/// Every job gets a fresh channel whose only sender lives on the render
/// thread, so the receiver disconnects once the job's final event is out.
pub struct RenderWorker {
    renderer: Arc<Mutex<Renderer>>,
    cancel: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    receiver: Receiver<RenderEvent>,
}

/// Clears the busy flag however the render thread exits.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RenderWorker {
    pub fn new(renderer: Renderer) -> Self {
        // Disconnected until the first job starts.
        let (_, receiver) = mpsc::channel();
        Self {
            renderer: Arc::new(Mutex::new(renderer)),
            cancel: Arc::new(AtomicBool::new(false)),
            busy: Arc::new(AtomicBool::new(false)),
            handle: None,
            receiver,
        }
    }

    /// Start rendering `camera` in the background.
    ///
    /// Fails with [`RenderError::Busy`] while a previous job is still running.
    pub fn start(&mut self, camera: Camera) -> Result<(), RenderError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(RenderError::Busy);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        if let Some(previous) = self.handle.take() {
            if previous.join().is_err() {
                log::warn!("Previous render thread panicked");
            }
        }
        self.cancel.store(false, Ordering::Release);

        let renderer = Arc::clone(&self.renderer);
        let cancel = Arc::clone(&self.cancel);
        let (sender, receiver) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("ember-render".into())
            .spawn(move || {
                let _guard = guard;
                let mut renderer = renderer.lock().unwrap_or_else(PoisonError::into_inner);

                let progress_sender = sender.clone();
                let on_progress = move |percent: f32| {
                    // The host may have dropped the receiver; nothing to do then.
                    let _ = progress_sender.send(RenderEvent::Progress(percent));
                };

                let event = run_job(|| renderer.render_with(&camera, &cancel, &on_progress));
                let _ = sender.send(event);
            })?;

        self.receiver = receiver;
        self.handle = Some(handle);
        Ok(())
    }

    /// Ask the running job to stop at its next frame boundary.
    pub fn cancel(&self) {
        if self.is_busy() {
            log::info!("Cancelling render");
        }
        self.cancel.store(true, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn try_event(&self) -> Option<RenderEvent> {
        self.receiver.try_recv().ok()
    }

    /// Block until the next event, `None` once the current job has ended and
    /// every event has been taken.
    pub fn recv_event(&self) -> Option<RenderEvent> {
        self.receiver.recv().ok()
    }

    /// Block until the running job, if any, has ended.
    pub fn wait(&mut self) -> Result<(), RenderError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| RenderError::WorkerPanicked),
            None => Ok(()),
        }
    }

    /// Access the renderer between jobs, for example to swap the scene.
    ///
    /// Blocks while a job is running.
    pub fn with_renderer<R>(&self, f: impl FnOnce(&mut Renderer) -> R) -> R {
        let mut renderer = self.renderer.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut renderer)
    }
}

/// Run one job and turn its result, or its panic, into the final event.
fn run_job(job: impl FnOnce() -> Result<RenderOutcome, RenderError>) -> RenderEvent {
    let start = Instant::now();
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(Ok(RenderOutcome::Completed(image))) => RenderEvent::Finished {
            image,
            elapsed: start.elapsed(),
        },
        Ok(Ok(RenderOutcome::Cancelled { previous })) => RenderEvent::Cancelled { previous },
        Ok(Err(err)) => {
            log::warn!("Render failed: {err}");
            RenderEvent::Failed(err)
        }
        Err(_) => {
            log::error!("Render job panicked");
            RenderEvent::Failed(RenderError::WorkerPanicked)
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
