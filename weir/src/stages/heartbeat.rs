//! Liveness reporting for long-running stages.

use crate::pipeline::Pipeline;
use crate::sequence::{Sequence, SequenceSender};
use crate::signal::CancellationSignal;
use crate::stages::Transform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// When a heartbeat-wrapped stage emits liveness pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatMode {
    /// Pulse on a fixed wall-clock interval, regardless of work progress.
    Interval(Duration),
    /// Pulse once at the start of each unit of work.
    PerItem,
}

/// A single liveness pulse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pulse {
    /// Monotonic pulse number within the stage; gaps mean dropped pulses.
    pub sequence: u64,
    /// Wall-clock emission time.
    pub at: DateTime<Utc>,
}

/// Wraps a transform so the stage also reports liveness on a side sequence.
///
/// Pulses are best-effort: when no consumer is ready the pulse is dropped
/// rather than blocking the data path, so wrapping a stage never changes
/// its throughput. A caller that sees neither a pulse nor a result within
/// its own timeout should treat the stage as unresponsive and apply its own
/// policy; the toolkit never restarts or kills stages. Ignoring the pulse
/// sequence entirely is always safe.
pub fn heartbeat<T>(
    pipeline: &Pipeline,
    input: Sequence<T::In>,
    transform: Arc<T>,
    mode: HeartbeatMode,
) -> (Sequence<T::Out>, Sequence<Pulse>)
where
    T: Transform + 'static,
{
    let signal = pipeline.signal();
    let (out_tx, out_rx) = pipeline.channel();
    let (pulse_tx, pulse_rx) =
        pipeline.channel_with_capacity(pipeline.config().heartbeat_capacity);

    match mode {
        HeartbeatMode::Interval(period) => {
            pipeline.spawn(
                "heartbeat",
                run_interval(signal, input, transform, out_tx, pulse_tx, period),
            );
        }
        HeartbeatMode::PerItem => {
            pipeline.spawn(
                "heartbeat",
                run_per_item(signal, input, transform, out_tx, pulse_tx),
            );
        }
    }

    (out_rx, pulse_rx)
}

async fn run_per_item<T>(
    signal: CancellationSignal,
    mut input: Sequence<T::In>,
    transform: Arc<T>,
    out_tx: SequenceSender<T::Out>,
    pulse_tx: SequenceSender<Pulse>,
) where
    T: Transform,
{
    let mut emitted = 0;
    while let Some(value) = input.recv_or_cancelled(&signal).await {
        emit_pulse(&pulse_tx, &mut emitted);
        for out in transform.apply(value).await {
            if !out_tx.send(out).await {
                return;
            }
        }
    }
}

async fn run_interval<T>(
    signal: CancellationSignal,
    mut input: Sequence<T::In>,
    transform: Arc<T>,
    out_tx: SequenceSender<T::Out>,
    pulse_tx: SequenceSender<Pulse>,
    period: Duration,
) where
    T: Transform,
{
    let start = tokio::time::Instant::now() + period;
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut emitted = 0;

    loop {
        tokio::select! {
            () = signal.cancelled() => return,
            _ = ticker.tick() => emit_pulse(&pulse_tx, &mut emitted),
            maybe = input.recv() => {
                let Some(value) = maybe else { return };
                for out in transform.apply(value).await {
                    // Keep pulsing while blocked on a slow result consumer.
                    let mut pending = Some(out);
                    while let Some(out) = pending.take() {
                        tokio::select! {
                            () = signal.cancelled() => return,
                            _ = ticker.tick() => {
                                emit_pulse(&pulse_tx, &mut emitted);
                                pending = Some(out);
                            }
                            permit = out_tx.reserve() => {
                                match permit {
                                    Some(permit) => permit.send(out),
                                    None => return,
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn emit_pulse(pulse_tx: &SequenceSender<Pulse>, emitted: &mut u64) {
    *emitted += 1;
    let pulse = Pulse {
        sequence: *emitted,
        at: Utc::now(),
    };
    if !pulse_tx.offer(pulse) {
        debug!(sequence = *emitted, "no ready pulse consumer, pulse dropped");
    }
}
