//! Stackful suspension: the routine's call stack lives on a helper thread.
//!
//! The OS thread is purely a stack-capture mechanism. At every instant
//! exactly one side — the owning caller or the helper — holds the right to
//! run routine code; the zero-capacity channels make each hand-off a
//! rendezvous, so the two threads can never execute routine code
//! concurrently and every write is visible across the hand-off.
//!
//! # Lifecycle
//!
//! `Created → Running(helper) ⇄ Suspended → Done`, plus a detach path from
//! `Created` or `Suspended` when the owner drops the generator. Teardown is
//! the disconnect of the resume channel: the parked helper's `recv` fails,
//! and it exits without re-entering caller-visible state. The owner joins
//! the helper before releasing anything the helper might still be running
//! on.

use crate::context::{ContextHooks, ExecutionContext};
use crate::coroutine::{GeneratorId, Injected, ResumeError};
use crossbeam_channel::{self as cb};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use strand_core::{Outcome, Thrown, Value};

/// Stack reserved for the helper thread, bounding the suspended routine's
/// recursion depth.
pub const HELPER_STACK_SIZE: usize = 256 * 1024;

// ---------------------------------------------------------------------------
// Interrupt and routine body
// ---------------------------------------------------------------------------

/// Non-value outcome of a yield point, unwound through the routine body
/// with `?`.
#[derive(Debug, Clone, PartialEq)]
pub enum Interrupt {
    /// An injected (or internally raised) language-level error.
    Thrown(Value),
    /// Injected early completion: finish now with this value.
    Completed(Value),
    /// The owner dropped the generator; exit without yielding.
    Detached,
}

/// What a routine body evaluates to.
pub type RoutineResult = Result<Value, Interrupt>;

/// The routine invocation entry point the helper thread drives.
///
/// The body receives a [`CoroutineScope`] for its execution context and
/// yield points, and must propagate yield-point interrupts with `?` — that
/// propagation is what lets injected completion and teardown unwind the
/// helper's stack.
pub type RoutineBody = Box<dyn FnOnce(&mut CoroutineScope) -> RoutineResult + Send + 'static>;

/// One yielded (or final) hand-off from the helper to the caller.
struct YieldMessage {
    outcome: Outcome,
    done: bool,
}

// ---------------------------------------------------------------------------
// CoroutineScope
// ---------------------------------------------------------------------------

/// The routine's view of its suspended invocation, alive only on the
/// helper thread.
pub struct CoroutineScope {
    context: ExecutionContext,
    hooks: Arc<dyn ContextHooks>,
    yield_tx: cb::Sender<YieldMessage>,
    resume_rx: cb::Receiver<Injected>,
}

impl CoroutineScope {
    /// The execution context captured at generator creation.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Suspend, handing `value` to the caller; the return value is what
    /// the next resume injects.
    ///
    /// An injected error surfaces as [`Interrupt::Thrown`] — a body may
    /// match on it to emulate language-level catch around the yield —
    /// while early completion and teardown must be propagated with `?`.
    pub fn yield_value(&mut self, value: Value) -> Result<Value, Interrupt> {
        // Interpreter bookkeeping for this routine must not be visible
        // while it is parked, so pop before the baton leaves this thread.
        self.hooks.pop(&self.context);

        if self
            .yield_tx
            .send(YieldMessage {
                outcome: Ok(value),
                done: false,
            })
            .is_err()
        {
            return Err(Interrupt::Detached);
        }

        match self.resume_rx.recv() {
            Err(_) => Err(Interrupt::Detached),
            Ok(injected) => {
                self.hooks.push(&self.context);
                match injected {
                    Injected::Next(value) => Ok(value),
                    Injected::Throw(error) => Err(Interrupt::Thrown(error)),
                    Injected::Return(value) => Err(Interrupt::Completed(value)),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ThreadCoroutine
// ---------------------------------------------------------------------------

/// Caller-side state of a stackful generator: the channel endpoints and
/// the helper's join handle.
pub(crate) struct ThreadCoroutine {
    id: GeneratorId,
    /// `None` only during drop; dropping the sender is the teardown signal.
    resume_tx: Option<cb::Sender<Injected>>,
    yield_rx: cb::Receiver<YieldMessage>,
    helper: Option<JoinHandle<()>>,
}

impl ThreadCoroutine {
    /// Spawn the helper thread and wait for it to park.
    ///
    /// When this returns, the helper has completed its startup handshake
    /// and is blocked waiting for the first resume; no routine code has
    /// run.
    pub(crate) fn spawn(
        id: GeneratorId,
        body: RoutineBody,
        context: ExecutionContext,
        hooks: Arc<dyn ContextHooks>,
    ) -> Self {
        let (resume_tx, resume_rx) = cb::bounded::<Injected>(0);
        let (yield_tx, yield_rx) = cb::bounded::<YieldMessage>(0);
        let (ready_tx, ready_rx) = cb::bounded::<()>(0);

        let helper = thread::Builder::new()
            .name(format!("coroutine-{}", id))
            .stack_size(HELPER_STACK_SIZE)
            .spawn(move || run_helper(body, context, hooks, ready_tx, resume_rx, yield_tx))
            .expect("failed to spawn coroutine helper thread");

        // Startup handshake: the helper signals ready, then parks on the
        // resume channel.
        ready_rx
            .recv()
            .expect("coroutine helper exited before parking");

        Self {
            id,
            resume_tx: Some(resume_tx),
            yield_rx,
            helper: Some(helper),
        }
    }

    /// Hand the baton to the helper with `injected`, then block until the
    /// routine yields, completes, or throws.
    pub(crate) fn resume(&mut self, injected: Injected) -> Result<(Value, bool), ResumeError> {
        let Some(resume_tx) = self.resume_tx.as_ref() else {
            return Err(ResumeError::HelperLost(self.id));
        };
        if resume_tx.send(injected).is_err() {
            // The helper died without taking the baton.
            return Err(ResumeError::HelperLost(self.id));
        }
        match self.yield_rx.recv() {
            Ok(message) => match message.outcome {
                Ok(value) => Ok((value, message.done)),
                Err(thrown) => Err(ResumeError::Thrown(thrown)),
            },
            Err(_) => Err(ResumeError::HelperLost(self.id)),
        }
    }
}

impl Drop for ThreadCoroutine {
    fn drop(&mut self) {
        // Disconnect is the teardown signal: a parked helper observes it
        // and exits instead of resuming the routine.
        self.resume_tx.take();
        // Join before the channels (and anything the helper's stack still
        // references) are released.
        if let Some(helper) = self.helper.take() {
            let _ = helper.join();
        }
    }
}

// ---------------------------------------------------------------------------
// Helper thread main
// ---------------------------------------------------------------------------

fn run_helper(
    body: RoutineBody,
    context: ExecutionContext,
    hooks: Arc<dyn ContextHooks>,
    ready_tx: cb::Sender<()>,
    resume_rx: cb::Receiver<Injected>,
    yield_tx: cb::Sender<YieldMessage>,
) {
    // Startup handshake; `spawn` is blocked on the other end.
    let _ = ready_tx.send(());

    // Park until the first explicit resume. Disconnect here is teardown
    // before the generator ever started.
    let first = match resume_rx.recv() {
        Ok(injected) => injected,
        Err(_) => return,
    };

    let result = match first {
        Injected::Next(_) => {
            // The first resume has no suspended yield expression to
            // observe; its argument is discarded.
            hooks.push(&context);
            let mut scope = CoroutineScope {
                context,
                hooks: Arc::clone(&hooks),
                yield_tx: yield_tx.clone(),
                resume_rx,
            };
            let result = body(&mut scope);
            // On detach the context was already popped at the final yield
            // point before parking.
            if !matches!(result, Err(Interrupt::Detached)) {
                hooks.pop(&scope.context);
            }
            result
        }
        Injected::Throw(error) => Err(Interrupt::Thrown(error)),
        Injected::Return(value) => Err(Interrupt::Completed(value)),
    };

    let message = match result {
        Ok(value) | Err(Interrupt::Completed(value)) => YieldMessage {
            outcome: Ok(value),
            done: true,
        },
        Err(Interrupt::Thrown(error)) => YieldMessage {
            outcome: Err(Thrown(error)),
            done: true,
        },
        // The owner is gone; exit without re-entering caller-visible state.
        Err(Interrupt::Detached) => return,
    };
    let _ = yield_tx.send(message);
}
