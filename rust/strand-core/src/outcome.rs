//! Value-or-thrown-error results exchanged between a routine and its caller.
//!
//! Every resume of a suspended routine produces an [`Outcome`]: either a
//! value the routine handed back, or a language-level error it threw. The
//! caller-visible shape is a [`Step`] pairing the value with the terminal
//! flag.

use crate::values::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A language-level thrown error.
///
/// This is a routine *throwing a value*, not an engine failure — the payload
/// is ordinary runtime data (typically an error object in the source
/// language).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("routine threw: {0}")]
pub struct Thrown(pub Value);

/// The result of giving a routine the chance to run: a produced value or a
/// thrown error.
pub type Outcome = Result<Value, Thrown>;

/// Caller-visible result of `next`/`throw`/`early_return` on a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub value: Value,
    pub done: bool,
}

impl Step {
    /// A yield: the routine produced `value` and remains resumable.
    pub fn yielded(value: Value) -> Self {
        Step { value, done: false }
    }

    /// Completion: the routine produced `value` and cannot be resumed.
    pub fn finished(value: Value) -> Self {
        Step { value, done: true }
    }

    /// The idempotent terminal answer for an already-done generator.
    pub fn terminal() -> Self {
        Step {
            value: Value::Undefined,
            done: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thrown_displays_payload() {
        let t = Thrown(Value::String("boom".into()));
        assert_eq!(t.to_string(), "routine threw: boom");
    }

    #[test]
    fn terminal_step_is_undefined_done() {
        let s = Step::terminal();
        assert!(s.done);
        assert!(s.value.is_undefined());
    }
}
