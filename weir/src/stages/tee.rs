//! Sequence duplication.

use crate::pipeline::Pipeline;
use crate::sequence::Sequence;

/// Duplicates one sequence into two independently consumable branches.
///
/// The stage reads one value at a time and offers it to both branches; it
/// does not read the next value until each branch has accepted the current
/// one (or cancellation preempted the offer), so neither branch can race
/// more than one pending value ahead of the other. Which branch accepts
/// first is race-determined. A branch whose consumer is gone stops
/// receiving offers; the other branch keeps going. Both branches end
/// together when the input ends or cancellation fires.
pub fn tee<T>(pipeline: &Pipeline, mut input: Sequence<T>) -> (Sequence<T>, Sequence<T>)
where
    T: Clone + Send + 'static,
{
    let signal = pipeline.signal();
    let (tx_a, rx_a) = pipeline.channel();
    let (tx_b, rx_b) = pipeline.channel();

    pipeline.spawn("tee", async move {
        let mut a_open = true;
        let mut b_open = true;

        while let Some(value) = input.recv_or_cancelled(&signal).await {
            // Offer each branch exactly once per value; a satisfied offer
            // disables that branch's select arm for the rest of the value.
            let mut a_done = !a_open;
            let mut b_done = !b_open;

            while !(a_done && b_done) {
                tokio::select! {
                    () = signal.cancelled() => return,
                    permit = tx_a.reserve(), if !a_done => {
                        match permit {
                            Some(permit) => permit.send(value.clone()),
                            None => a_open = false,
                        }
                        a_done = true;
                    }
                    permit = tx_b.reserve(), if !b_done => {
                        match permit {
                            Some(permit) => permit.send(value.clone()),
                            None => b_open = false,
                        }
                        b_done = true;
                    }
                }
            }

            if !a_open && !b_open {
                return;
            }
        }
    });

    (rx_a, rx_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{from_iter, repeat};
    use std::time::Duration;

    #[tokio::test]
    async fn test_both_branches_receive_the_same_values_in_order() {
        let pipeline = Pipeline::new();
        let source = from_iter(&pipeline, vec![1, 2, 3, 4, 5]);
        let (mut branch_a, mut branch_b) = tee(&pipeline, source);

        // Branches must be consumed concurrently; they advance in lockstep.
        let collect_a = tokio::spawn(async move {
            let mut values = Vec::new();
            while let Some(v) = branch_a.recv().await {
                values.push(v);
            }
            values
        });
        let collect_b = tokio::spawn(async move {
            let mut values = Vec::new();
            while let Some(v) = branch_b.recv().await {
                values.push(v);
            }
            values
        });

        let values_a = collect_a.await.expect("collector should not panic");
        let values_b = collect_b.await.expect("collector should not panic");
        assert_eq!(values_a, vec![1, 2, 3, 4, 5]);
        assert_eq!(values_b, vec![1, 2, 3, 4, 5]);

        pipeline.join().await.expect("tee should finish");
    }

    #[tokio::test]
    async fn test_branches_advance_in_lockstep() {
        let pipeline = Pipeline::new();
        let source = from_iter(&pipeline, vec![1, 2, 3, 4]);
        let (mut branch_a, mut branch_b) = tee(&pipeline, source);

        // One buffered value of slack per branch, then the unconsumed
        // branch stalls the tee.
        assert_eq!(branch_a.recv().await, Some(1));
        assert_eq!(branch_a.recv().await, Some(2));

        let stalled =
            tokio::time::timeout(Duration::from_millis(100), branch_a.recv()).await;
        assert!(stalled.is_err(), "branch a must stall until branch b catches up");

        assert_eq!(branch_b.recv().await, Some(1));
        let next_a = tokio::time::timeout(Duration::from_secs(1), branch_a.recv())
            .await
            .expect("branch a should resume once branch b consumed a value");
        assert_eq!(next_a, Some(3));
    }

    #[tokio::test]
    async fn test_cancellation_ends_both_branches() {
        let pipeline = Pipeline::new();
        let source = repeat(&pipeline, vec![9]);
        let (mut branch_a, mut branch_b) = tee(&pipeline, source);

        assert_eq!(branch_a.recv().await, Some(9));
        assert_eq!(branch_b.recv().await, Some(9));

        pipeline.cancel("stop");

        let ended = tokio::time::timeout(Duration::from_secs(1), async {
            while branch_a.recv().await.is_some() {}
            while branch_b.recv().await.is_some() {}
        })
        .await;
        assert!(ended.is_ok(), "both branches must end after cancellation");

        pipeline.join().await.expect("workers should finish");
    }

    #[tokio::test]
    async fn test_dropped_branch_does_not_block_the_other() {
        let pipeline = Pipeline::new();
        let source = from_iter(&pipeline, vec![1, 2, 3]);
        let (mut branch_a, branch_b) = tee(&pipeline, source);
        drop(branch_b);

        let mut values = Vec::new();
        let completed = tokio::time::timeout(Duration::from_secs(1), async {
            while let Some(v) = branch_a.recv().await {
                values.push(v);
            }
        })
        .await;
        assert!(completed.is_ok(), "surviving branch must not be blocked");
        assert_eq!(values, vec![1, 2, 3]);

        pipeline.join().await.expect("tee should finish");
    }
}
