//! Generators — suspendable routine invocations.
//!
//! A [`Generator`] is the public state machine over one of two suspension
//! strategies, fixed at creation time:
//!
//! - the **continuation engine** re-enters the register machine at a saved
//!   block with a saved frame; suspension is pure data, never control flow;
//! - the **thread coroutine engine** keeps the routine's literal call stack
//!   parked on a dedicated helper thread and passes the run baton back and
//!   forth over rendezvous channels.
//!
//! Both present the same protocol: `next` injects a value, `throw` injects
//! an error, `early_return` injects completion, and every call reports
//! `(value, done)`. Once `done`, a generator is terminal forever.
//!
//! # Invariants
//!
//! 1. Exactly one engine variant exists per generator; there is no
//!    uninitialized state.
//! 2. An error raised during a resume propagates to that specific call and
//!    permanently finishes the generator.
//! 3. Dropping a generator with a live helper thread joins it before any
//!    shared state is released.

pub mod continuation;
pub mod threaded;

use self::continuation::ContinuationEngine;
use self::threaded::{RoutineBody, ThreadCoroutine};
use crate::context::{ContextHooks, ExecutionContext};
use crate::frame::RegisterFrame;
use crate::machine::{Executable, RegisterMachine, Resumption};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strand_core::{Step, Thrown, Value};
use thiserror::Error;

// ---------------------------------------------------------------------------
// GeneratorId
// ---------------------------------------------------------------------------

/// Unique identifier for a generator instance; also names its helper
/// thread (`coroutine-{id}`) when the stackful strategy is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorId(u64);

static NEXT_GENERATOR_ID: AtomicU64 = AtomicU64::new(1);

impl GeneratorId {
    pub fn next() -> Self {
        Self(NEXT_GENERATOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Injected payloads and resume errors
// ---------------------------------------------------------------------------

/// What a resume call injects into the suspended routine.
#[derive(Debug, Clone, PartialEq)]
pub enum Injected {
    /// The yield expression evaluates to this value.
    Next(Value),
    /// The yield expression raises this error.
    Throw(Value),
    /// The routine completes early with this value.
    Return(Value),
}

/// Why a resume call failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResumeError {
    /// The routine threw; the payload is the language-level error value.
    #[error(transparent)]
    Thrown(#[from] Thrown),
    /// The helper thread exited without yielding (it panicked or was lost).
    #[error("helper thread for generator {0} exited without yielding")]
    HelperLost(GeneratorId),
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Which suspension strategy backs a generator.
///
/// Exactly these two variants exist; selection is fixed when the
/// generating routine is invoked and never changes.
enum Engine {
    Continuation(ContinuationEngine),
    Threaded(ThreadCoroutine),
}

/// A suspendable invocation of a routine.
pub struct Generator {
    id: GeneratorId,
    done: bool,
    started: bool,
    context: ExecutionContext,
    hooks: Arc<dyn ContextHooks>,
    engine: Engine,
}

impl Generator {
    /// Create a generator backed by the continuation engine.
    ///
    /// `initial_value` and `resume_point` describe the state left by the
    /// routine's prologue: the value it produced at its first suspension
    /// and the block where the body picks up (`Resumption::Done` when the
    /// prologue already ran the routine to completion). `frame` is the
    /// checkpoint taken at that suspension.
    pub fn from_continuation(
        machine: Box<dyn RegisterMachine>,
        executable: Arc<Executable>,
        initial_value: Value,
        resume_point: Resumption,
        frame: RegisterFrame,
        context: ExecutionContext,
        hooks: Arc<dyn ContextHooks>,
    ) -> Self {
        Self {
            id: GeneratorId::next(),
            done: false,
            started: false,
            context,
            hooks,
            engine: Engine::Continuation(ContinuationEngine::new(
                machine,
                executable,
                initial_value,
                resume_point,
                frame,
            )),
        }
    }

    /// Create a generator backed by the thread coroutine engine.
    ///
    /// Spawns the helper thread and waits for it to park; no routine code
    /// runs until the first `next`.
    pub fn from_thread(
        body: RoutineBody,
        context: ExecutionContext,
        hooks: Arc<dyn ContextHooks>,
    ) -> Self {
        let id = GeneratorId::next();
        let engine = ThreadCoroutine::spawn(id, body, context.clone(), Arc::clone(&hooks));
        Self {
            id,
            done: false,
            started: false,
            context,
            hooks,
            engine: Engine::Threaded(engine),
        }
    }

    pub fn id(&self) -> GeneratorId {
        self.id
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The execution context captured when this generator was created.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Resume the routine, making `argument` the value of the suspended
    /// yield expression.
    ///
    /// On a finished generator this returns `{undefined, done: true}`
    /// without executing any routine code.
    pub fn next(&mut self, argument: Option<Value>) -> Result<Step, ResumeError> {
        if self.done {
            return Ok(Step::terminal());
        }
        self.dispatch(Injected::Next(argument.unwrap_or(Value::Undefined)))
    }

    /// Resume the routine by raising `error` at the suspended yield point.
    ///
    /// If the generator never started or is already finished, the error is
    /// re-raised directly without entering the engine, and the generator
    /// is finished thereafter.
    pub fn throw(&mut self, error: Value) -> Result<Step, ResumeError> {
        if !self.started || self.done {
            self.done = true;
            return Err(ResumeError::Thrown(Thrown(error)));
        }
        self.dispatch(Injected::Throw(error))
    }

    /// Finish the routine early, surfacing `value` as its final result and
    /// bypassing any remaining routine logic. Finalizer semantics belong
    /// to the surrounding language runtime, not this engine.
    pub fn early_return(&mut self, value: Value) -> Result<Step, ResumeError> {
        if self.done {
            return Ok(Step::terminal());
        }
        self.dispatch(Injected::Return(value))
    }

    fn dispatch(&mut self, injected: Injected) -> Result<Step, ResumeError> {
        self.started = true;
        let result = match &mut self.engine {
            Engine::Continuation(engine) => engine
                .resume(&self.context, self.hooks.as_ref(), injected)
                .map_err(ResumeError::from),
            Engine::Threaded(engine) => engine.resume(injected),
        };
        match result {
            Ok((value, done)) => {
                self.done = done;
                Ok(Step { value, done })
            }
            Err(err) => {
                // A generator that throws cannot be resumed again.
                self.done = true;
                Err(err)
            }
        }
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = match self.engine {
            Engine::Continuation(_) => "continuation",
            Engine::Threaded(_) => "threaded",
        };
        f.debug_struct("Generator")
            .field("id", &self.id)
            .field("strategy", &strategy)
            .field("started", &self.started)
            .field("done", &self.done)
            .finish()
    }
}
