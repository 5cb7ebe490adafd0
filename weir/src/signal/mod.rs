//! Cancellation signalling.
//!
//! This module provides:
//! - [`CancellationSignal`] for one-shot, broadcastable stop notifications
//! - [`or`] for merging any number of signals into one derived signal

mod or;
mod token;

pub use or::or;
pub use token::CancellationSignal;
