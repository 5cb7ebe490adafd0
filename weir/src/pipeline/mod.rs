//! Pipeline run handle.
//!
//! A [`Pipeline`] owns the one piece of state every stage in a run shares:
//! the [`CancellationSignal`]. It also tracks the task handle of each stage
//! it spawned, so a caller can await full quiescence and surface worker
//! panics, and it carries a run id that tags every stage's log output.


use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::sequence::{self, Sequence, SequenceSender};
use crate::signal::CancellationSignal;
use parking_lot::Mutex;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{debug, debug_span, warn, Instrument};
use uuid::Uuid;

/// A single pipeline run.
///
/// Created once per run; stage constructors take a reference to it, spawn
/// their worker task through it, and share its signal. If any stage panics,
/// the remaining stages are cancelled when the panic is observed in
/// [`join`](Self::join).
pub struct Pipeline {
    /// Unique id for this run, attached to every stage's tracing span.
    run_id: Uuid,
    /// The cancellation signal shared by every stage in the run.
    signal: CancellationSignal,
    /// Channel and shutdown tunables.
    config: PipelineConfig,
    /// Handles of spawned stage workers, with their stage names.
    handles: Mutex<Vec<(String, JoinHandle<()>)>>,
}

impl Pipeline {
    /// Creates a pipeline run with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Creates a pipeline run with the given configuration.
    #[must_use]
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            signal: CancellationSignal::new(),
            config,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Returns this run's id.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns a handle to this run's cancellation signal.
    #[must_use]
    pub fn signal(&self) -> CancellationSignal {
        self.signal.clone()
    }

    /// Returns this run's configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fires the run's cancellation signal.
    ///
    /// Idempotent; every stage stops producing within one pending operation.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.signal.fire(reason);
    }

    /// Creates a sequence bounded by the configured channel capacity.
    ///
    /// The returned sender is the sequence's sole end capability; hold it in
    /// the stage that produces into the sequence.
    #[must_use]
    pub fn channel<T>(&self) -> (SequenceSender<T>, Sequence<T>) {
        self.channel_with_capacity(self.config.channel_capacity)
    }

    /// Creates a sequence with an explicit buffer bound.
    #[must_use]
    pub fn channel_with_capacity<T>(&self, capacity: usize) -> (SequenceSender<T>, Sequence<T>) {
        sequence::channel(&self.signal, capacity)
    }

    /// Spawns a stage worker and registers its handle under `stage`.
    ///
    /// The worker must honor the run's signal at every blocking operation;
    /// all stages built by this crate do.
    pub fn spawn<F>(&self, stage: impl Into<String>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let stage = stage.into();
        let span = debug_span!("stage", run_id = %self.run_id, stage = %stage);
        let handle = tokio::spawn(
            async move {
                debug!("stage running");
                task.await;
                debug!("stage ended");
            }
            .instrument(span),
        );
        self.handles.lock().push((stage, handle));
    }

    /// Returns the number of stage workers not yet joined.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.handles.lock().len()
    }

    /// Waits for every spawned stage to finish.
    ///
    /// A panicked stage cancels the rest of the run and is reported as the
    /// first error; joining continues so no worker is leaked. Stages only
    /// finish once their sequences end, so call this after the terminal
    /// sequence has been drained, or use [`shutdown`](Self::shutdown).
    pub async fn join(&self) -> Result<(), PipelineError> {
        let handles: Vec<(String, JoinHandle<()>)> = {
            let mut lock = self.handles.lock();
            std::mem::take(&mut *lock)
        };

        let mut first_error = None;
        for (stage, handle) in handles {
            if let Err(join_error) = handle.await {
                if join_error.is_panic() {
                    warn!(stage = %stage, "stage worker panicked");
                    if first_error.is_none() {
                        self.signal.fire(format!("stage `{stage}` panicked"));
                        first_error = Some(PipelineError::StagePanicked { stage });
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Fires the signal, then waits for quiescence within the configured
    /// shutdown timeout.
    pub async fn shutdown(&self, reason: impl Into<String>) -> Result<(), PipelineError> {
        self.signal.fire(reason);

        let timeout = self.config.shutdown_timeout;
        match tokio::time::timeout(timeout, self.join()).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::ShutdownTimeout { timeout }),
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("run_id", &self.run_id)
            .field("stage_count", &self.stage_count())
            .field("cancelled", &self.signal.is_fired())
            .finish()
    }
}
