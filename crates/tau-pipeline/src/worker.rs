//! Background frame processing.
//!
//! The worker owns the tracker list while idle. Submitting a frame moves the
//! list into a blocking task together with the frame; the task sends the
//! list back with its result. No list, no submission: at most one frame is
//! ever in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tau_core::{Error, RawJointFrame, Result};
use tau_tracking::TrackerStates;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::driver::{FrameBundle, FrameRejected, PipelineDriver};

/// Outcome of one submitted frame
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Completed(Box<FrameBundle>),
    /// Validation failed; trackers were not touched
    Rejected(Error),
    /// Cancelled before the job started; trackers were not touched
    Cancelled,
}

/// What a job hands back over the channel
#[derive(Debug)]
enum JobOutcome {
    Completed {
        bundle: Box<FrameBundle>,
        trackers: TrackerStates,
    },
    Rejected(FrameRejected),
    Cancelled(TrackerStates),
}

struct InFlight {
    rx: mpsc::Receiver<JobOutcome>,
    cancelled: Arc<AtomicBool>,
}

pub struct PipelineWorker {
    driver: PipelineDriver,
    /// `None` while a job holds the list
    trackers: Option<TrackerStates>,
    in_flight: Option<InFlight>,
}

impl PipelineWorker {
    pub fn new(driver: PipelineDriver) -> Self {
        Self::with_trackers(driver, TrackerStates::new())
    }

    /// Resume from an existing tracker list
    pub fn with_trackers(driver: PipelineDriver, trackers: TrackerStates) -> Self {
        Self {
            driver,
            trackers: Some(trackers),
            in_flight: None,
        }
    }

    pub fn driver(&self) -> &PipelineDriver {
        &self.driver
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The tracker list, available only while idle
    pub fn trackers(&self) -> Option<&TrackerStates> {
        self.trackers.as_ref()
    }

    /// Start processing `raw` on the blocking pool.
    ///
    /// Fails with [`Error::NoRuntime`] outside a tokio runtime, keeping the
    /// tracker list.
    pub fn submit(&mut self, raw: RawJointFrame, dt: f64) -> Result<()> {
        if self.in_flight.is_some() {
            return Err(Error::WorkerBusy);
        }
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let trackers = self.trackers.take().ok_or(Error::WorkerBusy)?;

        let (tx, rx) = mpsc::channel(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let driver = self.driver.clone();

        runtime.spawn_blocking(move || {
            let outcome = run_job(&driver, raw, dt, trackers, &flag);
            // A dropped worker no longer wants the result.
            let _ = tx.blocking_send(outcome);
        });

        self.in_flight = Some(InFlight { rx, cancelled });
        Ok(())
    }

    /// Ask the in-flight job not to start. Returns false when idle.
    ///
    /// A job that already started runs to completion.
    pub fn cancel(&self) -> bool {
        match &self.in_flight {
            Some(job) => {
                job.cancelled.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Non-blocking check for the in-flight job's result.
    ///
    /// `Ok(None)` when idle or still running.
    pub fn poll(&mut self) -> Result<Option<WorkerEvent>> {
        let Some(job) = self.in_flight.as_mut() else {
            return Ok(None);
        };

        let received = job.rx.try_recv();
        match received {
            Ok(outcome) => Ok(Some(self.finish(outcome))),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(self.lost()),
        }
    }

    /// Wait for the in-flight job's result; `Ok(None)` when idle.
    pub async fn next(&mut self) -> Result<Option<WorkerEvent>> {
        let Some(job) = self.in_flight.as_mut() else {
            return Ok(None);
        };

        let received = job.rx.recv().await;
        match received {
            Some(outcome) => Ok(Some(self.finish(outcome))),
            None => Err(self.lost()),
        }
    }

    /// Drop all tracker state; the next frame seeds afresh.
    pub fn reset(&mut self) -> Result<()> {
        if self.is_busy() {
            return Err(Error::WorkerBusy);
        }
        self.trackers = Some(TrackerStates::new());
        Ok(())
    }

    fn finish(&mut self, outcome: JobOutcome) -> WorkerEvent {
        self.in_flight = None;

        match outcome {
            JobOutcome::Completed { bundle, trackers } => {
                self.trackers = Some(trackers);
                WorkerEvent::Completed(bundle)
            }
            JobOutcome::Rejected(FrameRejected { error, trackers }) => {
                self.trackers = Some(trackers);
                WorkerEvent::Rejected(error)
            }
            JobOutcome::Cancelled(trackers) => {
                self.trackers = Some(trackers);
                WorkerEvent::Cancelled
            }
        }
    }

    /// The job died without reporting back; its trackers are gone.
    fn lost(&mut self) -> Error {
        tracing::warn!("Pipeline job ended without a result, tracker state reset");
        self.in_flight = None;
        self.trackers = Some(TrackerStates::new());
        Error::WorkerClosed
    }
}

fn run_job(
    driver: &PipelineDriver,
    raw: RawJointFrame,
    dt: f64,
    trackers: TrackerStates,
    cancelled: &AtomicBool,
) -> JobOutcome {
    if cancelled.load(Ordering::Acquire) {
        tracing::debug!("Pipeline job cancelled before start");
        return JobOutcome::Cancelled(trackers);
    }

    match driver.process_raw(raw, dt, trackers) {
        Ok(output) => JobOutcome::Completed {
            bundle: Box::new(output.bundle),
            trackers: output.trackers,
        },
        Err(rejected) => JobOutcome::Rejected(rejected),
    }
}
