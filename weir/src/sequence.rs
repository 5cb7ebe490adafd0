//! Ordered, single-pass value sequences with an explicit end marker.
//!
//! A sequence is the conduit between two pipeline stages. The producer half,
//! [`SequenceSender`], is held only by the stage that constructed the
//! sequence and is the sole end capability: the sequence ends when every
//! sender is dropped. The consumer half, [`Sequence`], is a read-only view;
//! a consumer can stop reading, but can never end the sequence itself.

use crate::signal::CancellationSignal;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Creates a bounded sequence tied to a cancellation signal.
pub(crate) fn channel<T>(
    signal: &CancellationSignal,
    capacity: usize,
) -> (SequenceSender<T>, Sequence<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        SequenceSender {
            tx,
            signal: signal.clone(),
        },
        Sequence { rx },
    )
}

/// Producer half of a sequence.
///
/// Dropping the last sender marks the sequence ended; consumers observe the
/// end marker as `None`, distinct from any value of `T`.
pub struct SequenceSender<T> {
    tx: mpsc::Sender<T>,
    signal: CancellationSignal,
}

impl<T> SequenceSender<T> {
    /// Sends a value, racing the cancellation signal.
    ///
    /// Returns `false` when the signal fired before the value was accepted,
    /// or when the consumer stopped reading. Either way the producer should
    /// stop; the value is discarded.
    pub async fn send(&self, value: T) -> bool {
        tokio::select! {
            result = self.tx.send(value) => result.is_ok(),
            () = self.signal.cancelled() => false,
        }
    }

    /// Offers a value without blocking.
    ///
    /// Returns `false` when no buffer slot is free or the consumer is gone;
    /// the value is dropped. This is the lossy path used for liveness pulses.
    pub fn offer(&self, value: T) -> bool {
        self.tx.try_send(value).is_ok()
    }

    /// Reserves a send slot without committing a value.
    ///
    /// Returns `None` when the consumer is gone.
    pub(crate) async fn reserve(&self) -> Option<mpsc::Permit<'_, T>> {
        self.tx.reserve().await.ok()
    }
}

impl<T> Clone for SequenceSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            signal: self.signal.clone(),
        }
    }
}

impl<T> std::fmt::Debug for SequenceSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Consumer half of a sequence.
pub struct Sequence<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Sequence<T> {
    /// Receives the next value, or `None` once the sequence has ended.
    ///
    /// Values buffered before the sequence ended are still delivered; no
    /// value is ever delivered after `None` has been observed.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Receives the next value, racing the cancellation signal.
    ///
    /// Returns `None` as soon as the signal fires, even when values remain
    /// buffered. Cancel-safe: a value is never lost by abandoning this call.
    pub async fn recv_or_cancelled(&mut self, signal: &CancellationSignal) -> Option<T> {
        tokio::select! {
            value = self.rx.recv() => value,
            () = signal.cancelled() => None,
        }
    }
}

impl<T> futures::Stream for Sequence<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T> std::fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence").finish_non_exhaustive()
    }
}
