//! Register frames — snapshots of a register-machine activation.
//!
//! A suspended routine under the continuation strategy is represented
//! entirely by one of these: the register slots as they were at the yield
//! point, plus the environment-stack markers that must be reinstated before
//! the machine re-enters the routine.

use serde::{Deserialize, Serialize};
use strand_core::Value;

/// Opaque handle to a runtime environment record.
///
/// The environment store itself belongs to the surrounding interpreter;
/// frames only remember which records were live at suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentId(pub u32);

/// Snapshot of a register-machine activation.
///
/// Register slot 0 is the resume-argument slot: the value injected by
/// `next(argument)` is written there before the machine re-enters the
/// routine, so the yield expression evaluates to it. Frames serialize so
/// suspended continuation state can be included in runtime snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterFrame {
    pub registers: Vec<Value>,
    pub saved_lexical_environments: Vec<EnvironmentId>,
    pub saved_variable_environments: Vec<EnvironmentId>,
}

impl RegisterFrame {
    /// Create a frame with `register_count` slots, all `Undefined`.
    pub fn new(register_count: usize) -> Self {
        Self {
            registers: vec![Value::Undefined; register_count],
            saved_lexical_environments: Vec::new(),
            saved_variable_environments: Vec::new(),
        }
    }

    /// Write the injected resume argument into slot 0.
    ///
    /// Grows the frame if the routine was compiled with no registers at
    /// all, so the argument is never silently dropped.
    pub fn set_argument(&mut self, value: Value) {
        if self.registers.is_empty() {
            self.registers.push(value);
        } else {
            self.registers[0] = value;
        }
    }

    /// Read the resume-argument slot.
    pub fn argument(&self) -> &Value {
        self.registers.first().unwrap_or(&Value::Undefined)
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }
}
