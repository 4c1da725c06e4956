//! Execution-context plumbing shared by both suspension strategies.
//!
//! A generator captures its [`ExecutionContext`] once at creation and
//! reinstates it on every resume. The interpreter's own context stack is an
//! external collaborator; crossing into or out of a suspended routine goes
//! through the [`ContextHooks`] seam so the surrounding runtime can keep its
//! bookkeeping consistent while the routine is parked.

use crate::frame::EnvironmentId;
use serde::{Deserialize, Serialize};
use strand_core::Value;

/// The caller-visible execution context captured when a generator is
/// created: the bound `this` value and the active environment record.
///
/// Created once per generator and immutable from the engine's point of
/// view; only the routine itself mutates the environment it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub this_value: Value,
    pub environment: EnvironmentId,
}

impl ExecutionContext {
    pub fn new(this_value: Value, environment: EnvironmentId) -> Self {
        Self {
            this_value,
            environment,
        }
    }

    /// Context with no `this` binding, as for a routine whose captured
    /// environment provides none.
    pub fn detached_this(environment: EnvironmentId) -> Self {
        Self::new(Value::Undefined, environment)
    }
}

/// Interpreter-level push/pop of execution-context bookkeeping.
///
/// `push` is called just before routine code runs on behalf of a resume;
/// `pop` just after it suspends or completes. For the thread coroutine
/// engine these calls happen on the helper thread, so implementations must
/// be shareable across threads.
pub trait ContextHooks: Send + Sync {
    fn push(&self, context: &ExecutionContext);
    fn pop(&self, context: &ExecutionContext);
}

/// No-op hooks for callers with no interpreter bookkeeping to maintain.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHooks;

impl ContextHooks for NullHooks {
    fn push(&self, _context: &ExecutionContext) {}
    fn pop(&self, _context: &ExecutionContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_this_is_undefined() {
        let ctx = ExecutionContext::detached_this(EnvironmentId(3));
        assert!(ctx.this_value.is_undefined());
        assert_eq!(ctx.environment, EnvironmentId(3));
    }
}
