//! Shared fixtures for `srmp` integration tests.
//!
//! Provides a serialised handle to the global [`logtest::Logger`], helpers
//! for building and slicing SRMP byte streams, and a thin wrapper around
//! `metrics-util`'s debugging recorder.
//!
//! ```rust
//! use srmp::DefaultMessage;
//! use srmp_testing::{encode_stream, split_every};
//!
//! let wire = encode_stream(&[DefaultMessage::new("a"), DefaultMessage::new("b")]);
//! assert_eq!(split_every(&wire, 3).len(), 4);
//! ```

mod logging;
mod recorder;
mod streams;

pub use logging::{LoggerHandle, logger};
pub use recorder::{CounterTotals, counter_total, counter_totals, with_recorder};
pub use streams::{encode_envelopes, encode_stream, split_every};
