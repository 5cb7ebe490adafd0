//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables shared by every stage a [`Pipeline`](crate::pipeline::Pipeline)
/// constructs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Buffer bound for data sequences.
    ///
    /// The default of 1 is the closest bounded equivalent of an unbuffered
    /// rendezvous channel: a producer can run at most one value ahead of its
    /// consumer.
    pub channel_capacity: usize,
    /// Buffer bound for heartbeat pulse sequences.
    pub heartbeat_capacity: usize,
    /// How long [`Pipeline::shutdown`](crate::pipeline::Pipeline::shutdown)
    /// waits for all stage tasks to finish after firing the signal.
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1,
            heartbeat_capacity: 1,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}
