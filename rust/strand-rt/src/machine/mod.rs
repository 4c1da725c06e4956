//! Register-machine interface consumed by the continuation engine.
//!
//! The instruction semantics live in the surrounding interpreter; this
//! module defines only the seam the coroutine runtime needs: re-enter a
//! compiled routine at a basic block with a saved frame, and get back the
//! produced value, the next resume point, and the new frame.
//!
//! The resume point is a first-class sum type ([`Resumption`]) rather than
//! a marker smuggled through the value channel, so "is this value actually
//! a continuation token" is unrepresentable.

pub mod scripted;

use crate::frame::RegisterFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use strand_core::{Outcome, Value};

/// Identifies a basic block within a compiled routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Where a suspended routine picks up, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resumption {
    /// The routine has run to completion; there is nothing to resume.
    Done,
    /// Re-enter the routine at this block.
    ResumeAt(BlockId),
}

impl Resumption {
    pub fn is_done(&self) -> bool {
        matches!(self, Resumption::Done)
    }
}

/// Handle to a compiled routine: enough shape to validate resume points.
///
/// The instruction stream itself stays with the interpreter; the engine
/// only needs to know which block ids are real.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executable {
    pub name: String,
    pub block_count: u32,
}

impl Executable {
    pub fn new(name: impl Into<String>, block_count: u32) -> Self {
        Self {
            name: name.into(),
            block_count,
        }
    }

    pub fn contains(&self, block: BlockId) -> bool {
        block.0 < self.block_count
    }
}

/// What the machine hands back after re-entering a routine: the value the
/// routine produced (or threw), the next resume point, and the frame
/// checkpoint taken at the new suspension (absent once the routine is done).
#[derive(Debug)]
pub struct ResumedFrame {
    pub outcome: Outcome,
    pub resume_point: Resumption,
    pub frame: Option<RegisterFrame>,
}

/// The register-machine interpreter, seen from the coroutine runtime.
pub trait RegisterMachine {
    /// Re-enter `executable` at `block` with `frame` reinstated, running
    /// until the routine suspends, completes, or throws.
    fn resume_at(
        &mut self,
        executable: &Executable,
        block: BlockId,
        frame: Option<RegisterFrame>,
    ) -> ResumedFrame;

    /// Overwrite the accumulator register. Used when a resume argument is
    /// injected into a routine that saved no frame, and to reset the
    /// accumulator when an error is injected.
    fn set_accumulator(&mut self, value: Value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executable_contains_only_real_blocks() {
        let exe = Executable::new("routine", 3);
        assert!(exe.contains(BlockId(0)));
        assert!(exe.contains(BlockId(2)));
        assert!(!exe.contains(BlockId(3)));
    }

    #[test]
    fn resumption_done_flag() {
        assert!(Resumption::Done.is_done());
        assert!(!Resumption::ResumeAt(BlockId(1)).is_done());
    }
}
