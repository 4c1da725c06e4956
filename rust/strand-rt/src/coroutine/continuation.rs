//! Continuation-based suspension: resume a saved register-machine frame.
//!
//! No thread, no blocking. A suspended routine is a `(value, resume point,
//! frame)` triple; resuming consumes the checkpoint, re-enters the machine
//! at the saved block, and stores whatever checkpoint the machine hands
//! back. Error injection never re-enters the machine — the error is raised
//! to the caller as if the suspension point had thrown, and the machine's
//! own unwind handling is a collaborator concern.

use crate::context::{ContextHooks, ExecutionContext};
use crate::coroutine::Injected;
use crate::frame::RegisterFrame;
use crate::machine::{Executable, RegisterMachine, Resumption};
use std::sync::Arc;
use strand_core::{Thrown, Value};

pub(crate) struct ContinuationEngine {
    machine: Box<dyn RegisterMachine>,
    executable: Arc<Executable>,
    /// The value produced at the most recent suspension.
    previous_value: Value,
    resume_point: Resumption,
    /// The most recent checkpoint; consumed by every resume.
    frame: Option<RegisterFrame>,
}

impl ContinuationEngine {
    pub(crate) fn new(
        machine: Box<dyn RegisterMachine>,
        executable: Arc<Executable>,
        initial_value: Value,
        resume_point: Resumption,
        frame: RegisterFrame,
    ) -> Self {
        Self {
            machine,
            executable,
            previous_value: initial_value,
            resume_point,
            frame: Some(frame),
        }
    }

    /// Resume the routine, returning the produced value and whether the
    /// routine is now finished.
    pub(crate) fn resume(
        &mut self,
        context: &ExecutionContext,
        hooks: &dyn ContextHooks,
        injected: Injected,
    ) -> Result<(Value, bool), Thrown> {
        let block = match self.resume_point {
            // No resume point left: the routine fell off its end at the
            // previous suspension. Report its last value as final.
            Resumption::Done => {
                self.frame = None;
                return Ok((std::mem::take(&mut self.previous_value), true));
            }
            Resumption::ResumeAt(block) => block,
        };

        // A resume point outside the compiled routine means the executable
        // is corrupted; nothing dynamic can recover that.
        assert!(
            self.executable.contains(block),
            "resume point {} out of range for routine '{}'",
            block,
            self.executable.name,
        );

        let value = match injected {
            Injected::Throw(error) => {
                // Raise as if the yield expression threw. The accumulator
                // must not leak the previously yielded value.
                self.machine.set_accumulator(Value::Undefined);
                return Err(Thrown(error));
            }
            Injected::Return(value) => {
                // Early completion: bypass the remaining routine logic.
                self.resume_point = Resumption::Done;
                self.frame = None;
                self.previous_value = Value::Undefined;
                return Ok((value, true));
            }
            Injected::Next(value) => value,
        };

        // The injected value becomes the result of the yield expression:
        // argument slot when a frame was checkpointed, accumulator when
        // the routine suspended without one.
        let frame = match self.frame.take() {
            Some(mut frame) => {
                frame.set_argument(value);
                Some(frame)
            }
            None => {
                self.machine.set_accumulator(value);
                None
            }
        };

        hooks.push(context);
        let resumed = self.machine.resume_at(&self.executable, block, frame);
        hooks.pop(context);

        self.resume_point = resumed.resume_point;
        self.frame = resumed.frame;

        let value = resumed.outcome?;
        let done = self.resume_point.is_done();
        self.previous_value = value.clone();
        Ok((value, done))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NullHooks;
    use crate::frame::EnvironmentId;
    use crate::machine::scripted::{ScriptedMachine, ScriptedOp};
    use crate::machine::BlockId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> ExecutionContext {
        ExecutionContext::detached_this(EnvironmentId(0))
    }

    fn engine_for(machine: ScriptedMachine) -> ContinuationEngine {
        let executable = machine.executable();
        let entry = machine.entry();
        let frame = machine.initial_frame();
        ContinuationEngine::new(
            Box::new(machine),
            executable,
            Value::Undefined,
            entry,
            frame,
        )
    }

    #[test]
    fn injected_values_reach_the_routine_through_the_frame() {
        let machine = ScriptedMachine::new(vec![
            ScriptedOp::Yield(Value::Int(1)),
            ScriptedOp::Yield(Value::Int(2)),
            ScriptedOp::Finish(Value::Int(3)),
        ]);
        let log = machine.resume_log();
        let mut engine = engine_for(machine);

        engine
            .resume(&ctx(), &NullHooks, Injected::Next(Value::Undefined))
            .unwrap();
        engine
            .resume(&ctx(), &NullHooks, Injected::Next(Value::String("a".into())))
            .unwrap();
        engine
            .resume(&ctx(), &NullHooks, Injected::Next(Value::String("b".into())))
            .unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                Value::Undefined,
                Value::String("a".into()),
                Value::String("b".into())
            ]
        );
    }

    #[test]
    fn fallen_off_end_reports_last_value_once() {
        let machine = ScriptedMachine::new(vec![ScriptedOp::Finish(Value::Int(3))]);
        let executable = machine.executable();
        let frame = machine.initial_frame();
        // Prologue already ran the routine to completion.
        let mut engine = ContinuationEngine::new(
            Box::new(machine),
            executable,
            Value::Int(42),
            Resumption::Done,
            frame,
        );
        let (value, done) = engine
            .resume(&ctx(), &NullHooks, Injected::Next(Value::Undefined))
            .unwrap();
        assert_eq!(value, Value::Int(42));
        assert!(done);
    }

    #[test]
    fn throw_injection_raises_without_entering_the_machine() {
        let machine = ScriptedMachine::new(vec![
            ScriptedOp::Yield(Value::Int(1)),
            ScriptedOp::Finish(Value::Int(2)),
        ]);
        let log = machine.resume_log();
        let mut engine = engine_for(machine);

        engine
            .resume(&ctx(), &NullHooks, Injected::Next(Value::Undefined))
            .unwrap();
        let err = engine
            .resume(&ctx(), &NullHooks, Injected::Throw(Value::Int(8)))
            .unwrap_err();
        assert_eq!(err, Thrown(Value::Int(8)));
        // Only the first resume reached the machine.
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn context_is_pushed_and_popped_around_each_machine_entry() {
        struct CountingHooks {
            pushes: AtomicUsize,
            pops: AtomicUsize,
        }
        impl ContextHooks for CountingHooks {
            fn push(&self, _context: &ExecutionContext) {
                self.pushes.fetch_add(1, Ordering::SeqCst);
            }
            fn pop(&self, _context: &ExecutionContext) {
                self.pops.fetch_add(1, Ordering::SeqCst);
            }
        }

        let hooks = CountingHooks {
            pushes: AtomicUsize::new(0),
            pops: AtomicUsize::new(0),
        };
        let machine = ScriptedMachine::new(vec![
            ScriptedOp::Yield(Value::Int(1)),
            ScriptedOp::Finish(Value::Int(2)),
        ]);
        let mut engine = engine_for(machine);

        engine
            .resume(&ctx(), &hooks, Injected::Next(Value::Undefined))
            .unwrap();
        engine
            .resume(&ctx(), &hooks, Injected::Next(Value::Undefined))
            .unwrap();

        assert_eq!(hooks.pushes.load(Ordering::SeqCst), 2);
        assert_eq!(hooks.pops.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn stale_resume_point_is_fatal() {
        let machine = ScriptedMachine::new(vec![ScriptedOp::Finish(Value::Int(1))]);
        let executable = machine.executable();
        let frame = machine.initial_frame();
        let mut engine = ContinuationEngine::new(
            Box::new(machine),
            executable,
            Value::Undefined,
            Resumption::ResumeAt(BlockId(99)),
            frame,
        );
        let _ = engine.resume(&ctx(), &NullHooks, Injected::Next(Value::Undefined));
    }
}
