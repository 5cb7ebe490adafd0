//! Flattening of a sequence of sequences.

use crate::pipeline::Pipeline;
use crate::sequence::Sequence;

/// Flattens a sequence whose values are themselves sequences.
///
/// Each inner sequence is drained to exhaustion before the next outer value
/// is requested, so the flattened output is the concatenation of the inner
/// sequences in outer order. The output ends when the outer sequence ends,
/// or immediately when cancellation fires mid-drain or between inner
/// sequences.
pub fn bridge<T>(pipeline: &Pipeline, mut inputs: Sequence<Sequence<T>>) -> Sequence<T>
where
    T: Send + 'static,
{
    let signal = pipeline.signal();
    let (tx, rx) = pipeline.channel();

    pipeline.spawn("bridge", async move {
        while let Some(mut inner) = inputs.recv_or_cancelled(&signal).await {
            while let Some(value) = inner.recv_or_cancelled(&signal).await {
                if !tx.send(value).await {
                    return;
                }
            }
            // Inner drain stops on both exhaustion and cancellation; only
            // exhaustion may advance to the next outer value.
            if signal.is_fired() {
                return;
            }
        }
    });
    rx
}
