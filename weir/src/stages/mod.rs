//! Pipeline stages.
//!
//! Stages are the units of work in a pipeline: each consumes a sequence
//! (or none, for a source), produces a sequence (or two, for tee), and runs
//! as its own worker task honoring the run's cancellation signal.

mod bridge;
mod fan;
mod heartbeat;
mod or_done;
mod sources;
mod tee;

pub use bridge::bridge;
pub use fan::{fan_in, fan_out};
pub use heartbeat::{heartbeat, HeartbeatMode, Pulse};
pub use or_done::or_done;
pub use sources::{from_iter, repeat, repeat_with, take};
pub use tee::tee;

use crate::pipeline::Pipeline;
use crate::sequence::Sequence;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

/// Trait for per-value transformations.
///
/// A transform maps one input value to zero or more output values. Stage
/// constructors run it inside a worker task, so implementations may await
/// (network fetches, disk reads) without blocking other stages.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Input value type.
    type In: Send + 'static;
    /// Output value type.
    type Out: Send + 'static;

    /// Transforms one input value into zero or more outputs.
    async fn apply(&self, value: Self::In) -> Vec<Self::Out>;
}

/// A one-to-one transform backed by a plain closure.
pub struct FnTransform<F, In, Out> {
    func: F,
    _marker: PhantomData<fn(In) -> Out>,
}

impl<F, In, Out> FnTransform<F, In, Out>
where
    F: Fn(In) -> Out + Send + Sync,
{
    /// Creates a new closure-based transform.
    pub fn new(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

impl<F, In, Out> std::fmt::Debug for FnTransform<F, In, Out> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransform").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, In, Out> Transform for FnTransform<F, In, Out>
where
    F: Fn(In) -> Out + Send + Sync,
    In: Send + 'static,
    Out: Send + 'static,
{
    type In = In;
    type Out = Out;

    async fn apply(&self, value: In) -> Vec<Out> {
        vec![(self.func)(value)]
    }
}

/// Runs a [`Transform`] as a pipeline stage.
///
/// The worker reads `input` until it ends or the signal fires, applying the
/// transform to each value and forwarding every output downstream.
pub fn apply_transform<T>(
    pipeline: &Pipeline,
    mut input: Sequence<T::In>,
    transform: Arc<T>,
) -> Sequence<T::Out>
where
    T: Transform + 'static,
{
    let signal = pipeline.signal();
    let (tx, rx) = pipeline.channel();
    pipeline.spawn("transform", async move {
        while let Some(value) = input.recv_or_cancelled(&signal).await {
            for out in transform.apply(value).await {
                if !tx.send(out).await {
                    return;
                }
            }
        }
    });
    rx
}

/// A one-to-one mapping stage over a plain closure.
pub fn map<In, Out, F>(pipeline: &Pipeline, mut input: Sequence<In>, mut func: F) -> Sequence<Out>
where
    In: Send + 'static,
    Out: Send + 'static,
    F: FnMut(In) -> Out + Send + 'static,
{
    let signal = pipeline.signal();
    let (tx, rx) = pipeline.channel();
    pipeline.spawn("map", async move {
        while let Some(value) = input.recv_or_cancelled(&signal).await {
            if !tx.send(func(value)).await {
                return;
            }
        }
    });
    rx
}

/// A zero-or-more mapping stage: each input value expands to any number of
/// output values, in order.
pub fn flat_map<In, Out, F>(
    pipeline: &Pipeline,
    mut input: Sequence<In>,
    mut func: F,
) -> Sequence<Out>
where
    In: Send + 'static,
    Out: Send + 'static,
    F: FnMut(In) -> Vec<Out> + Send + 'static,
{
    let signal = pipeline.signal();
    let (tx, rx) = pipeline.channel();
    pipeline.spawn("flat_map", async move {
        while let Some(value) = input.recv_or_cancelled(&signal).await {
            for out in func(value) {
                if !tx.send(out).await {
                    return;
                }
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn drain<T>(mut seq: Sequence<T>) -> Vec<T> {
        let mut values = Vec::new();
        while let Some(v) = seq.recv().await {
            values.push(v);
        }
        values
    }

    #[tokio::test]
    async fn test_map_multiply_then_add_as_multiply() {
        let pipeline = Pipeline::new();

        let source = from_iter(&pipeline, vec![1, 2, 3, 4]);
        let doubled = map(&pipeline, source, |v| v * 2);
        // The "add" stage from the classic pipeline example actually
        // multiplies by its additive; with 1 the stream passes unchanged.
        let additive = 1;
        let result = map(&pipeline, doubled, move |v| v * additive);

        assert_eq!(drain(result).await, vec![2, 4, 6, 8]);
        pipeline.join().await.expect("all stages should finish");
    }

    #[tokio::test]
    async fn test_map_chain_is_deterministic() {
        let pipeline = Pipeline::new();

        let source = from_iter(&pipeline, vec![1, 2, 3, 4]);
        let first = map(&pipeline, source, |v| v * 2);
        let second = map(&pipeline, first, |v| v * 2);

        assert_eq!(drain(second).await, vec![4, 8, 12, 16]);
        pipeline.join().await.expect("all stages should finish");
    }

    #[tokio::test]
    async fn test_flat_map_expands_and_drops() {
        let pipeline = Pipeline::new();

        let source = from_iter(&pipeline, vec![1, 2, 3, 4]);
        // Drop odd values, duplicate even ones.
        let result = flat_map(&pipeline, source, |v| {
            if v % 2 == 0 {
                vec![v, v]
            } else {
                Vec::new()
            }
        });

        assert_eq!(drain(result).await, vec![2, 2, 4, 4]);
        pipeline.join().await.expect("all stages should finish");
    }

    #[tokio::test]
    async fn test_apply_transform_with_async_transform() {
        struct Doubler;

        #[async_trait]
        impl Transform for Doubler {
            type In = u32;
            type Out = u32;

            async fn apply(&self, value: u32) -> Vec<u32> {
                tokio::task::yield_now().await;
                vec![value * 2]
            }
        }

        let pipeline = Pipeline::new();
        let source = from_iter(&pipeline, vec![1, 2, 3]);
        let result = apply_transform(&pipeline, source, Arc::new(Doubler));

        assert_eq!(drain(result).await, vec![2, 4, 6]);
        pipeline.join().await.expect("all stages should finish");
    }

    #[tokio::test]
    async fn test_fn_transform_wraps_closure() {
        let transform = FnTransform::new(|v: u32| v + 1);
        assert_eq!(transform.apply(41).await, vec![42]);
    }
}
