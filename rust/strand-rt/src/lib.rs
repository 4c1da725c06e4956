//! Strand RT — coroutine execution engine for the Strand runtime.
//!
//! Provides the generator facade and its two suspension strategies: the
//! continuation engine (saved register-machine frames, no extra thread) and
//! the thread coroutine engine (a dedicated helper thread whose call stack
//! *is* the suspended state).
#![warn(clippy::all)]

pub mod context;
pub mod coroutine;
pub mod frame;
pub mod machine;

// Re-export core types so consumers only need one runtime dependency.
pub use strand_core::{outcome, values, Outcome, Step, Thrown, Value};
