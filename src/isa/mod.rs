// Voyager: numeric engine of HP-16C/15C-style programmable calculators.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2024-2026 by the Voyager contributors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Operation catalog and program executor.

mod catalog;
mod exec;
mod opcodes;

pub use catalog::Catalog;
pub use exec::{ExecStep, Executor};

use crate::data::SignMode;
use crate::model::Model;
use crate::CalcError;

/// Argument sentinel: the I register itself.
pub const ARG_INDEX: u8 = 0xfe;

/// Argument sentinel: indirect addressing through the I register.
pub const ARG_INDIRECT: u8 = 0xff;

/// Stack-lift policy applied after an operation completes, controlling
/// whether a following digit entry lifts the stack.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum StackLift {
    /// The next entry lifts (result-producing operations).
    #[display("enable")]
    Enable,
    /// The next entry overwrites X (ENTER, CLX).
    #[display("disable")]
    Disable,
    /// Leave the lift state as it was (mode changes, flags, control flow).
    #[display("neutral")]
    Neutral,
}

/// How the executor treats an instruction beyond its calculation.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum OpKind {
    /// Plain calculation, dispatched by sign mode.
    #[display("calc")]
    Calc,
    /// Digit key; consecutive digits append to the entry in X.
    #[display("digit")]
    Digit,
    /// Branch-target marker; executes as a no-op.
    #[display("label")]
    Label,
    #[display("goto")]
    Goto,
    #[display("gosub")]
    Gosub,
    #[display("return")]
    Return,
    /// Run/stop key: halts the running program.
    #[display("run-stop")]
    RunStop,
    /// Suspends execution long enough for a display update to be seen.
    #[display("pause")]
    Pause,
}

/// Calculation over the model; the optional argument is the register, flag,
/// bit or label number baked into the opcode.
pub type CalcFn = fn(&mut Model, Option<u8>) -> Result<(), CalcError>;

/// One catalog entry: a decoded program instruction.
///
/// Operations carry separate calculations for integer and float sign modes;
/// an operation meaningless in the active mode (a missing calculation while
/// the other mode has one) fails with the arithmetic domain error, and an
/// operation with no calculation at all is a no-op outside its control-flow
/// role.
#[derive(Debug)]
pub struct ProgramOperation {
    pub name: &'static str,
    pub arg: Option<u8>,
    pub lift: StackLift,
    pub kind: OpKind,
    pub(crate) int_calc: Option<CalcFn>,
    pub(crate) float_calc: Option<CalcFn>,
}

impl ProgramOperation {
    /// Runs the mode-appropriate calculation and applies the lift policy.
    pub fn execute(&self, model: &mut Model) -> Result<(), CalcError> {
        let calc = match model.status.sign_mode {
            SignMode::Float => self.float_calc,
            _ => self.int_calc,
        };
        match calc {
            Some(f) => f(model, self.arg)?,
            None if self.int_calc.is_none() && self.float_calc.is_none() => {}
            None => return Err(CalcError::Domain),
        }
        // Consecutive digits extend one entry; anything else ends it.
        model.set_entry_in_progress(self.kind == OpKind::Digit);
        match self.lift {
            StackLift::Enable => model.set_stack_lift(true),
            StackLift::Disable => model.set_stack_lift(false),
            StackLift::Neutral => {}
        }
        Ok(())
    }
}
