//! Cancellation-safe sequence wrapper.

use crate::pipeline::Pipeline;
use crate::sequence::Sequence;

/// Wraps a sequence so its consumers stop the moment cancellation fires,
/// even mid-send.
///
/// Termination through cancellation is a normal, silent completion: the
/// wrapped output simply ends, indistinguishable from exhaustion unless the
/// caller inspects the signal separately. No consumer of the output ever
/// blocks indefinitely past cancellation.
pub fn or_done<T>(pipeline: &Pipeline, mut input: Sequence<T>) -> Sequence<T>
where
    T: Send + 'static,
{
    let signal = pipeline.signal();
    let (tx, rx) = pipeline.channel();
    pipeline.spawn("or_done", async move {
        while let Some(value) = input.recv_or_cancelled(&signal).await {
            if !tx.send(value).await {
                return;
            }
        }
    });
    rx
}
