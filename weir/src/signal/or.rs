//! Or-combinator over cancellation signals.

use super::CancellationSignal;

/// Inputs are grouped three per tree node, as in the classic or-channel
/// composition, bounding waiter tasks to O(n) and tree depth to O(log n).
const GROUP_SIZE: usize = 3;

/// Merges any number of signals into one derived signal that fires as soon
/// as any input fires.
///
/// Zero inputs yield a signal that never fires. A single input is returned
/// unchanged. Larger sets are combined through an iterative tree of waiter
/// tasks rather than recursion, so arbitrarily wide merges never nest task
/// creation arbitrarily deep. Every waiter also watches the derived root, so
/// no helper outlives the first firing branch.
///
/// Merging two or more signals must happen within a Tokio runtime.
#[must_use]
pub fn or<I>(signals: I) -> CancellationSignal
where
    I: IntoIterator<Item = CancellationSignal>,
{
    let mut level: Vec<CancellationSignal> = signals.into_iter().collect();

    if level.is_empty() {
        return CancellationSignal::new();
    }
    if level.len() == 1 {
        return level.remove(0);
    }

    let root = CancellationSignal::new();
    while level.len() > GROUP_SIZE {
        let mut next = Vec::with_capacity(level.len().div_ceil(GROUP_SIZE));
        for group in level.chunks(GROUP_SIZE) {
            let node = CancellationSignal::new();
            spawn_waiter(group.to_vec(), node.clone(), root.clone());
            next.push(node);
        }
        level = next;
    }
    spawn_waiter(level, root.clone(), root.clone());
    root
}

/// Waits for any input in one tree node to fire, then propagates the firing
/// reason into `node`. Exits without firing when the derived root fires
/// through another branch.
fn spawn_waiter(
    inputs: Vec<CancellationSignal>,
    node: CancellationSignal,
    root: CancellationSignal,
) {
    tokio::spawn(async move {
        tokio::select! {
            () = wait_any(&inputs) => {
                let reason = inputs
                    .iter()
                    .find(|signal| signal.is_fired())
                    .and_then(|signal| signal.reason())
                    .unwrap_or_else(|| "merged signal fired".to_string());
                node.fire(reason);
            }
            () = root.cancelled() => {}
        }
    });
}

async fn wait_any(signals: &[CancellationSignal]) {
    match signals {
        [] => std::future::pending::<()>().await,
        [a] => a.cancelled().await,
        [a, b] => {
            tokio::select! {
                () = a.cancelled() => {}
                () = b.cancelled() => {}
            }
        }
        [a, b, c] => {
            tokio::select! {
                () = a.cancelled() => {}
                () = b.cancelled() => {}
                () = c.cancelled() => {}
            }
        }
        _ => {
            let waits: Vec<_> = signals
                .iter()
                .map(|signal| Box::pin(signal.cancelled()))
                .collect();
            let _ = futures::future::select_all(waits).await;
        }
    }
}
