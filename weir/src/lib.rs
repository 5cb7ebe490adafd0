//! # Weir
//!
//! Composable, cancellation-aware streaming pipeline primitives.
//!
//! Weir builds data pipelines out of independently running stages connected
//! by bounded sequences, with support for:
//!
//! - **One-shot cancellation**: a broadcast [`signal::CancellationSignal`]
//!   shared by every stage in a run, mergeable with [`signal::or`]
//! - **Typed sequence ownership**: only the stage that creates a sequence
//!   can end it; consumers hold a read-only view
//! - **Stage composition**: sources, mapping stages, fan-out/fan-in, tee,
//!   bridge, and or-done wrappers that nest freely
//! - **Liveness reporting**: best-effort heartbeat pulses that never block
//!   the data path
//! - **Deterministic shutdown**: every blocking operation races the signal,
//!   so no stage can block past cancellation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use weir::prelude::*;
//!
//! let pipeline = Pipeline::new();
//!
//! let numbers = from_iter(&pipeline, 1..=4);
//! let doubled = map(&pipeline, numbers, |v| v * 2);
//! let mut bounded = take(&pipeline, doubled, 3);
//!
//! while let Some(value) = bounded.recv().await {
//!     println!("{value}");
//! }
//!
//! pipeline.shutdown("done").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod pipeline;
pub mod sequence;
pub mod signal;
pub mod stages;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::errors::PipelineError;
    pub use crate::pipeline::Pipeline;
    pub use crate::sequence::{Sequence, SequenceSender};
    pub use crate::signal::{or, CancellationSignal};
    pub use crate::stages::{
        apply_transform, bridge, fan_in, fan_out, flat_map, from_iter, heartbeat, map, or_done,
        repeat, repeat_with, take, FnTransform, HeartbeatMode, Pulse, Transform,
    };
}
