//! Scripted register machine for testing continuation-based generators.
//!
//! Plays back a fixed sequence of suspension steps instead of interpreting
//! bytecode, and records every resume argument it observes so tests can
//! verify injection. Block `k` of the scripted executable performs step `k`
//! of the script.

use crate::frame::RegisterFrame;
use crate::machine::{BlockId, Executable, RegisterMachine, ResumedFrame, Resumption};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use strand_core::{Thrown, Value};

/// One scripted suspension step.
#[derive(Debug, Clone)]
pub enum ScriptedOp {
    /// Suspend yielding this value; the next resume runs the next step.
    Yield(Value),
    /// Run to completion producing this value.
    Finish(Value),
    /// Throw this value out of the routine.
    Throw(Value),
}

/// Shared log of the resume arguments a [`ScriptedMachine`] observed.
pub type ResumeLog = Rc<RefCell<Vec<Value>>>;

/// A register machine that executes a canned script.
///
/// Scripts must end with a [`ScriptedOp::Finish`] or [`ScriptedOp::Throw`];
/// every earlier step must be a [`ScriptedOp::Yield`].
pub struct ScriptedMachine {
    ops: Vec<ScriptedOp>,
    accumulator: Value,
    register_count: usize,
    received: ResumeLog,
}

impl ScriptedMachine {
    pub fn new(ops: Vec<ScriptedOp>) -> Self {
        debug_assert!(
            matches!(ops.last(), Some(ScriptedOp::Finish(_) | ScriptedOp::Throw(_))),
            "scripts must end with Finish or Throw"
        );
        Self {
            ops,
            accumulator: Value::Undefined,
            register_count: 4,
            received: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The executable shape this script pretends to be.
    pub fn executable(&self) -> Arc<Executable> {
        Arc::new(Executable::new("scripted", self.ops.len() as u32))
    }

    /// Resume point for the first `next()`: the script's first block.
    pub fn entry(&self) -> Resumption {
        Resumption::ResumeAt(BlockId(0))
    }

    /// Frame the routine would have checkpointed at creation.
    pub fn initial_frame(&self) -> RegisterFrame {
        RegisterFrame::new(self.register_count)
    }

    /// Handle to the log of observed resume arguments; clone before boxing
    /// the machine into a generator.
    pub fn resume_log(&self) -> ResumeLog {
        Rc::clone(&self.received)
    }
}

impl RegisterMachine for ScriptedMachine {
    fn resume_at(
        &mut self,
        executable: &Executable,
        block: BlockId,
        frame: Option<RegisterFrame>,
    ) -> ResumedFrame {
        assert!(executable.contains(block), "scripted block out of range");

        // Observe the injected argument the way a real routine would: the
        // frame's argument slot, or the accumulator when no frame exists.
        let observed = match &frame {
            Some(f) => f.argument().clone(),
            None => std::mem::take(&mut self.accumulator),
        };
        self.received.borrow_mut().push(observed);

        let idx = block.0 as usize;
        match self.ops[idx].clone() {
            ScriptedOp::Yield(value) => ResumedFrame {
                outcome: Ok(value),
                resume_point: Resumption::ResumeAt(BlockId(block.0 + 1)),
                frame: Some(frame.unwrap_or_else(|| RegisterFrame::new(self.register_count))),
            },
            ScriptedOp::Finish(value) => ResumedFrame {
                outcome: Ok(value),
                resume_point: Resumption::Done,
                frame: None,
            },
            ScriptedOp::Throw(error) => ResumedFrame {
                outcome: Err(Thrown(error)),
                resume_point: Resumption::Done,
                frame: None,
            },
        }
    }

    fn set_accumulator(&mut self, value: Value) {
        self.accumulator = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_plays_back_in_block_order() {
        let mut machine = ScriptedMachine::new(vec![
            ScriptedOp::Yield(Value::Int(1)),
            ScriptedOp::Finish(Value::Int(2)),
        ]);
        let exe = machine.executable();
        let frame = machine.initial_frame();

        let first = machine.resume_at(&exe, BlockId(0), Some(frame));
        assert_eq!(first.outcome, Ok(Value::Int(1)));
        assert_eq!(first.resume_point, Resumption::ResumeAt(BlockId(1)));

        let second = machine.resume_at(&exe, BlockId(1), first.frame);
        assert_eq!(second.outcome, Ok(Value::Int(2)));
        assert!(second.resume_point.is_done());
        assert!(second.frame.is_none());
    }

    #[test]
    fn records_arguments_from_frame_and_accumulator() {
        let mut machine = ScriptedMachine::new(vec![
            ScriptedOp::Yield(Value::Int(1)),
            ScriptedOp::Finish(Value::Int(2)),
        ]);
        let exe = machine.executable();
        let log = machine.resume_log();

        let mut frame = machine.initial_frame();
        frame.set_argument(Value::String("from-frame".into()));
        machine.resume_at(&exe, BlockId(0), Some(frame));

        machine.set_accumulator(Value::String("from-acc".into()));
        machine.resume_at(&exe, BlockId(1), None);

        assert_eq!(
            *log.borrow(),
            vec![
                Value::String("from-frame".into()),
                Value::String("from-acc".into())
            ]
        );
    }
}
