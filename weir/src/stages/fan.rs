//! Worker replication and sequence merging.

use crate::pipeline::Pipeline;
use crate::sequence::Sequence;
use crate::stages::Transform;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::warn;

/// Starts `workers` concurrent instances of a transform against one input.
///
/// Each input value goes to whichever worker is ready first, so output order
/// across workers is unspecified; use only for order-independent work.
/// Returns one output sequence per worker, typically handed straight to
/// [`fan_in`].
pub fn fan_out<T>(
    pipeline: &Pipeline,
    input: Sequence<T::In>,
    workers: usize,
    transform: Arc<T>,
) -> Vec<Sequence<T::Out>>
where
    T: Transform + 'static,
{
    let input = Arc::new(Mutex::new(input));

    (0..workers)
        .map(|worker| {
            let input = input.clone();
            let transform = transform.clone();
            let signal = pipeline.signal();
            let (tx, rx) = pipeline.channel();

            pipeline.spawn(format!("fan_out_{worker}"), async move {
                loop {
                    // Hold the input lock only for the read itself, so a
                    // worker busy transforming never starves the others.
                    let value = {
                        let mut input = input.lock().await;
                        input.recv_or_cancelled(&signal).await
                    };
                    let Some(value) = value else { return };

                    for out in transform.apply(value).await {
                        if !tx.send(out).await {
                            return;
                        }
                    }
                }
            });
            rx
        })
        .collect()
}

/// Merges any number of sequences into one.
///
/// Interleaving across inputs is race-determined, but values from the same
/// input keep that input's relative order. The merged output ends only
/// after every input has ended (or cancellation fired) and every forwarder
/// has been awaited, so completion is never signalled while a forwarder is
/// still writing.
pub fn fan_in<T>(pipeline: &Pipeline, inputs: Vec<Sequence<T>>) -> Sequence<T>
where
    T: Send + 'static,
{
    let signal = pipeline.signal();
    let (tx, rx) = pipeline.channel();

    pipeline.spawn("fan_in", async move {
        let mut forwarders = JoinSet::new();
        for mut input in inputs {
            let tx = tx.clone();
            let signal = signal.clone();
            forwarders.spawn(async move {
                while let Some(value) = input.recv_or_cancelled(&signal).await {
                    if !tx.send(value).await {
                        return;
                    }
                }
            });
        }

        while let Some(result) = forwarders.join_next().await {
            if let Err(join_error) = result {
                if join_error.is_panic() {
                    warn!("fan-in forwarder panicked");
                }
            }
        }
        // All forwarder senders are gone; dropping ours ends the output.
    });
    rx
}
