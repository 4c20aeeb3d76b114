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

//! Program execution: discrete, synchronous instruction steps.

use core::time::Duration;

use crate::isa::catalog::{Catalog, LABELS};
use crate::isa::{OpKind, ARG_INDEX, ARG_INDIRECT};
use crate::model::Model;
use crate::CalcError;

/// How long a PSE instruction suspends, long enough for a display update to
/// be seen.
pub const PAUSE_INTERVAL: Duration = Duration::from_millis(1200);

/// Outcome of one instruction step.
///
/// A step never blocks: the caller owns the clock, resuming after
/// [`ExecStep::Pause`]'s interval or whenever the user restarts a stopped
/// program. Stepping is re-entrant across these suspensions.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ExecStep {
    /// Continue with the next instruction.
    Next,
    /// Execution halted: R/S, a top-level return, or a stop request.
    Stop,
    /// Suspend for the given interval, then continue stepping.
    Pause(Duration),
}

/// The single logical program executor of a calculator instance.
pub struct Executor<'c> {
    catalog: &'c Catalog,
}

impl<'c> Executor<'c> {
    pub fn new(catalog: &'c Catalog) -> Executor<'c> { Executor { catalog } }

    /// Executes the instruction after the current line.
    ///
    /// A pending stop request is honored before anything else: this is the
    /// instruction boundary where a keypress lands. On failure the current
    /// line stays on the failing instruction and the return stack is left
    /// untouched, so the halted context can be inspected.
    pub fn step(&self, model: &mut Model) -> Result<ExecStep, CalcError> {
        if model.take_stop_request() {
            return Ok(ExecStep::Stop);
        }
        model.memory_mut().increment_current_line();
        let line = model.memory().program().current_line();
        if line == 0 {
            // The phantom slot before line 1 holds an implicit RTN.
            return Ok(self.unwind(model));
        }
        let opcode = model.memory_mut().opcode_at(line)?;
        let op = self.catalog.decode(opcode)?;

        #[cfg(feature = "log")]
        {
            let arg = match op.arg {
                Some(ARG_INDEX) => " I".to_string(),
                Some(ARG_INDIRECT) => " (i)".to_string(),
                Some(n) => format!(" {}", n),
                None => String::new(),
            };
            eprintln!(
                "\x1B[1;35m{:03}\x1B[0m: \x1B[1;32m{}\x1B[0m\x1B[1;33m{}\x1B[0m",
                line, op.name, arg
            );
        }

        op.execute(model)?;
        match op.kind {
            OpKind::Calc | OpKind::Digit | OpKind::Label => Ok(ExecStep::Next),
            OpKind::Return => Ok(self.unwind(model)),
            OpKind::Goto => {
                let target = self.resolve_label(model, op.arg)?;
                model.memory_mut().goto_opcode(target)?;
                Ok(ExecStep::Next)
            }
            OpKind::Gosub => {
                let target = self.resolve_label(model, op.arg)?;
                model.memory_mut().gosub_opcode(target)?;
                Ok(ExecStep::Next)
            }
            OpKind::RunStop => Ok(ExecStep::Stop),
            OpKind::Pause => Ok(ExecStep::Pause(PAUSE_INTERVAL)),
        }
    }

    /// Pops the return stack: a nested return resumes after the recorded
    /// call, a top-level return parks the cursor on line 0 and stops.
    fn unwind(&self, model: &mut Model) -> ExecStep {
        let nested = model.memory().program().return_stack_pos() > 0;
        model.memory_mut().return_from_sub();
        if nested {
            ExecStep::Next
        } else {
            ExecStep::Stop
        }
    }

    /// Maps a GTO/GSB argument to the label opcode to scan for; the I and
    /// (i) sentinels take the label number from the index register (float
    /// mode truncates toward zero).
    fn resolve_label(&self, model: &Model, arg: Option<u8>) -> Result<u16, CalcError> {
        let label = match arg {
            Some(ARG_INDEX) | Some(ARG_INDIRECT) => {
                let addr = model.index_as_address();
                if !(0..LABELS as i64).contains(&addr) {
                    return Err(CalcError::ProgramAddress(addr.max(0) as u16));
                }
                addr as u8
            }
            Some(n) => n,
            None => return Err(CalcError::ProgramAddress(0)),
        };
        self.catalog
            .label_opcode(label)
            .ok_or(CalcError::ProgramAddress(label as u16))
    }

    /// Runs until the program stops, sleeping through pauses. Interactive
    /// frontends drive [`Executor::step`] themselves instead; they should
    /// claim the top-level return slot the same way before the first step.
    pub fn run(&self, model: &mut Model) -> Result<(), CalcError> {
        model.memory_mut().begin_run();
        loop {
            match self.step(model)? {
                ExecStep::Next => {}
                ExecStep::Stop => return Ok(()),
                ExecStep::Pause(interval) => std::thread::sleep(interval),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::Value;

    fn load(model: &mut Model, catalog: &Catalog, listing: &[(&str, Option<u8>)]) {
        for (name, arg) in listing {
            let opcode = catalog.opcode_of(name, *arg).expect(name);
            model.memory_mut().insert_line(opcode).unwrap();
        }
        model.memory_mut().set_current_line(0).unwrap();
    }

    #[test]
    fn straight_line_arithmetic() {
        let catalog = Catalog::new();
        let exec = Executor::new(&catalog);
        let mut model = Model::new();
        load(&mut model, &catalog, &[
            ("LBL", Some(0)),
            ("digit", Some(3)),
            ("ENTER", None),
            ("digit", Some(4)),
            ("+", None),
            ("R/S", None),
        ]);
        exec.run(&mut model).unwrap();
        assert_eq!(model.x().internal(), 7);
        assert_eq!(model.memory().program().current_line(), 6);
    }

    #[test]
    fn digit_entry_spans_steps() {
        let catalog = Catalog::new();
        let exec = Executor::new(&catalog);
        let mut model = Model::new();
        load(&mut model, &catalog, &[
            ("digit", Some(0x1)),
            ("digit", Some(0x2)),
            ("digit", Some(0xf)),
            ("R/S", None),
        ]);
        exec.run(&mut model).unwrap();
        assert_eq!(model.x().internal(), 0x12f);
    }

    #[test]
    fn gosub_and_phantom_return() {
        let catalog = Catalog::new();
        let exec = Executor::new(&catalog);
        let mut model = Model::new();
        // Main: call label 1 twice, then return; the subroutine adds 1 to X.
        load(&mut model, &catalog, &[
            ("GSB", Some(1)),
            ("GSB", Some(1)),
            ("RTN", None),
            ("LBL", Some(1)),
            ("digit", Some(1)),
            ("+", None),
            ("RTN", None),
        ]);
        exec.run(&mut model).unwrap();
        assert_eq!(model.x().internal(), 2);
        assert_eq!(model.memory().program().return_stack_pos(), -1);
    }

    #[test]
    fn goto_through_index_register() {
        let catalog = Catalog::new();
        let exec = Executor::new(&catalog);
        let mut model = Model::new();
        load(&mut model, &catalog, &[
            ("GTO", Some(ARG_INDEX)),
            ("digit", Some(9)),
            ("R/S", None),
            ("LBL", Some(2)),
            ("digit", Some(5)),
            ("R/S", None),
        ]);
        model.set_index(Value::from_internal(2));
        exec.run(&mut model).unwrap();
        assert_eq!(model.x().internal(), 5, "jump skipped the digit 9 line");
    }

    #[test]
    fn pause_suspends_without_consuming_state() {
        let catalog = Catalog::new();
        let exec = Executor::new(&catalog);
        let mut model = Model::new();
        load(&mut model, &catalog, &[
            ("digit", Some(8)),
            ("PSE", None),
            ("digit", Some(9)),
            ("R/S", None),
        ]);
        let mut steps = vec![];
        loop {
            let step = exec.step(&mut model).unwrap();
            steps.push(step);
            if step == ExecStep::Stop {
                break;
            }
        }
        assert!(steps.contains(&ExecStep::Pause(PAUSE_INTERVAL)));
        assert_eq!(model.x().internal(), 0x89);
    }

    #[test]
    fn stop_request_wins_at_instruction_boundary() {
        let catalog = Catalog::new();
        let exec = Executor::new(&catalog);
        let mut model = Model::new();
        load(&mut model, &catalog, &[("digit", Some(1)), ("R/S", None)]);
        model.request_stop();
        assert_eq!(exec.step(&mut model).unwrap(), ExecStep::Stop);
        assert_eq!(model.memory().program().current_line(), 0, "nothing executed");
    }

    #[test]
    fn error_halts_on_the_failing_line() {
        let catalog = Catalog::new();
        let exec = Executor::new(&catalog);
        let mut model = Model::new();
        load(&mut model, &catalog, &[
            ("digit", Some(1)),
            ("ENTER", None),
            ("digit", Some(0)),
            ("÷", None),
            ("R/S", None),
        ]);
        assert_eq!(exec.run(&mut model), Err(CalcError::Domain));
        assert_eq!(model.memory().program().current_line(), 4);
    }
}
