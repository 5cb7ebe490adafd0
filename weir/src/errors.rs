//! Error types for the weir toolkit.
//!
//! Cancellation is deliberately absent from this taxonomy: it is a normal
//! termination path, observed as an ended sequence, never as an error.
//! Error-carrying values produced upstream (for example `Result` items)
//! travel through stages as ordinary data for the terminal consumer to
//! interpret.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced when joining a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage worker panicked; the rest of the pipeline was cancelled.
    #[error("stage `{stage}` panicked")]
    StagePanicked {
        /// Name the stage was spawned under.
        stage: String,
    },

    /// Stage tasks did not reach quiescence within the shutdown timeout.
    #[error("pipeline did not quiesce within {timeout:?}")]
    ShutdownTimeout {
        /// The configured quiescence bound.
        timeout: Duration,
    },
}
