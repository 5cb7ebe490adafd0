//! Source stages and the bounded-consumption stage.

use crate::pipeline::Pipeline;
use crate::sequence::Sequence;

/// A finite source producing the given values in order.
///
/// The sequence is buffered to the input length, so a fast consumer never
/// waits on the source task. Ends on exhaustion or cancellation.
pub fn from_iter<I>(pipeline: &Pipeline, values: I) -> Sequence<I::Item>
where
    I: IntoIterator,
    I::Item: Send + 'static,
{
    let values: Vec<I::Item> = values.into_iter().collect();
    let (tx, rx) = pipeline.channel_with_capacity(values.len().max(1));
    pipeline.spawn("from_iter", async move {
        for value in values {
            if !tx.send(value).await {
                return;
            }
        }
    });
    rx
}

/// An infinite source cycling through the given values.
///
/// An empty value set ends the sequence immediately. Pair with [`take`] to
/// bound consumption.
pub fn repeat<T>(pipeline: &Pipeline, values: Vec<T>) -> Sequence<T>
where
    T: Clone + Send + Sync + 'static,
{
    let (tx, rx) = pipeline.channel();
    pipeline.spawn("repeat", async move {
        if values.is_empty() {
            return;
        }
        loop {
            for value in &values {
                if !tx.send(value.clone()).await {
                    return;
                }
            }
        }
    });
    rx
}

/// An infinite source calling `func` once per produced value.
pub fn repeat_with<T, F>(pipeline: &Pipeline, mut func: F) -> Sequence<T>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    let (tx, rx) = pipeline.channel();
    pipeline.spawn("repeat_with", async move {
        loop {
            if !tx.send(func()).await {
                return;
            }
        }
    });
    rx
}

/// Forwards at most `count` values, then ends its output.
///
/// Ending the output releases the upstream source: its next send fails and
/// it shuts down, so an infinite source wrapped in `take` does not leak.
/// Ends early when the upstream ends or cancellation fires.
pub fn take<T>(pipeline: &Pipeline, mut input: Sequence<T>, count: usize) -> Sequence<T>
where
    T: Send + 'static,
{
    let signal = pipeline.signal();
    let (tx, rx) = pipeline.channel();
    pipeline.spawn("take", async move {
        for _ in 0..count {
            let Some(value) = input.recv_or_cancelled(&signal).await else {
                return;
            };
            if !tx.send(value).await {
                return;
            }
        }
    });
    rx
}
