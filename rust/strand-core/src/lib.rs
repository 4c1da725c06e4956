//! Strand Core
//!
//! Shared value and outcome types used across the compiler, register
//! machine, and coroutine runtime.

pub mod outcome;
pub mod values;

pub use outcome::{Outcome, Step, Thrown};
pub use values::Value;
