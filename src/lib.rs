//! rs2-duplex - a dual pull/push stream core
//!
//! Two stream models share one vocabulary of combinators and one termination signal:
//!
//! - [`pull`]: synchronous streams, driven by the consumer calling the producer.
//! - [`push`]: asynchronous streams, driven by the producer calling a registered sink,
//!   with Tokio timers behind `interval`, `wait`, `interruptable_wait` and `timeout`.
//!
//! Neither model has an error channel: a delivery is a value or [`Signal::Done`].

pub mod error;
pub mod signal;
pub mod stream_configuration;

pub mod pipe;

pub mod pull;
pub mod push;

pub use error::{StreamError, StreamResult};
pub use signal::{end_of_transmission, is_done, Signal};
pub use stream_configuration::{IntervalConfig, TapConfig};
