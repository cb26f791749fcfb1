//! Deterministic random streams.
//!
//! Every stage that needs randomness receives a `&mut dyn RandomStream`
//! explicitly; there is no process-wide generator.

mod stream;

pub use stream::{RandomStream, ScriptedStream, SeededStream};
