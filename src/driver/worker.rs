//! Pose poll loop
//!
//! Runs on its own OS thread. While a device index is assigned the loop
//! samples at the configured fine interval with a plain thread sleep, so
//! sub-millisecond intervals hold. The idle wait is raced against the
//! activation's [`CancellationToken`] on a current-thread tokio runtime.
//! Deactivation cancels the token and joins the thread, which hands the
//! sampler and pose publisher back to the driver.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{Local, TimeDelta};
use tokio::runtime::Runtime;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::config::PollingConfig;
use crate::error::InitError;
use crate::host::{ServerDriverHost, TrackedDeviceIndex};
use crate::input::{AxisSource, Sample};
use crate::pose::{DriverPose, PosePublisher};

const THREAD_NAME: &str = "glyph-pose-poll";

pub(crate) struct PoseWorker {
    object_id: TrackedDeviceIndex,
    sampler: Box<dyn AxisSource>,
    publisher: PosePublisher,
    host: Arc<dyn ServerDriverHost>,
    polling: PollingConfig,
    time_offset: f64,
}

#[cfg(test)]
impl std::fmt::Debug for PoseWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoseWorker")
            .field("object_id", &self.object_id)
            .finish_non_exhaustive()
    }
}

/// Failed start; the worker comes back so its sampler is not lost
pub(crate) type SpawnError = (InitError, PoseWorker);

/// Running poll thread of one activation
pub(crate) struct PollerHandle {
    cancel: CancellationToken,
    thread: JoinHandle<Option<PoseWorker>>,
}

impl PollerHandle {
    /// Cancels the loop and waits for the thread; `None` if it panicked.
    pub fn stop(self) -> Option<PoseWorker> {
        self.cancel.cancel();
        match self.thread.join() {
            Ok(worker) => worker,
            Err(_) => {
                error!("Pose poll thread panicked");
                None
            }
        }
    }
}

impl PoseWorker {
    pub fn new(
        object_id: TrackedDeviceIndex,
        sampler: Box<dyn AxisSource>,
        publisher: PosePublisher,
        host: Arc<dyn ServerDriverHost>,
        polling: PollingConfig,
        time_offset: f64,
    ) -> Self {
        Self {
            object_id,
            sampler,
            publisher,
            host,
            polling,
            time_offset,
        }
    }

    pub fn into_parts(self) -> (Box<dyn AxisSource>, PosePublisher) {
        (self.sampler, self.publisher)
    }

    pub fn spawn(self) -> Result<PollerHandle, SpawnError> {
        self.spawn_on(thread::Builder::new().name(THREAD_NAME.to_string()))
    }

    // The worker is handed over only after the thread exists, so every
    // failure path still owns it
    fn spawn_on(self, builder: thread::Builder) -> Result<PollerHandle, SpawnError> {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to build poll runtime: {}", e);
                return Err((InitError::DriverFailed(e.to_string()), self));
            }
        };

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let (handoff, inbox) = mpsc::sync_channel::<PoseWorker>(1);

        let thread = match builder.spawn(move || {
            let mut worker = inbox.recv().ok()?;
            worker.poll_loop(&runtime, &token);
            Some(worker)
        }) {
            Ok(thread) => thread,
            Err(e) => {
                error!("Error starting head tracking thread: {}", e);
                return Err((InitError::DriverFailed(e.to_string()), self));
            }
        };

        if let Err(mpsc::SendError(worker)) = handoff.send(self) {
            error!("Head tracking thread exited before start");
            return Err((
                InitError::DriverFailed("poll thread exited".to_string()),
                worker,
            ));
        }

        debug!("Spawned {} thread", THREAD_NAME);
        Ok(PollerHandle { cancel, thread })
    }

    fn poll_loop(&mut self, runtime: &Runtime, cancel: &CancellationToken) {
        info!(
            "Starting pose poll loop for {} on {}",
            self.object_id,
            self.sampler.describe()
        );

        let mut published: u64 = 0;
        let mut last_log_time = Local::now();
        let log_interval =
            TimeDelta::from_std(self.polling.stats_interval()).unwrap_or(TimeDelta::seconds(10));
        let log_secs = log_interval.num_seconds().max(1);

        while !cancel.is_cancelled() {
            if self.object_id.is_valid() {
                if self.tick() {
                    published += 1;
                }
                thread::sleep(self.polling.interval());
            } else {
                let idle = self.polling.idle_interval();
                let cancelled = runtime.block_on(async {
                    tokio::select! {
                        _ = cancel.cancelled() => true,
                        _ = sleep(idle) => false,
                    }
                });
                if cancelled {
                    break;
                }
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Pose poll stats: published {} poses in last {} seconds (avg {:.2}/sec)",
                    published,
                    log_secs,
                    published as f64 / log_secs as f64
                );
                published = 0;
                last_log_time = now;
            }
        }

        info!("Pose poll loop for {} stopped", self.object_id);
    }

    // Samples once and publishes on success
    fn tick(&mut self) -> bool {
        match self.sampler.poll() {
            Sample::Fresh(raw) => {
                let pose = DriverPose::from_raw(&raw, self.time_offset);
                self.publisher.publish(pose);
                self.host.tracked_device_pose_updated(self.object_id, &pose);
                true
            }
            Sample::Cached(_) => {
                trace!(
                    "Sample unavailable, keeping {:?}",
                    self.sampler.last_state()
                );
                false
            }
        }
    }
}
