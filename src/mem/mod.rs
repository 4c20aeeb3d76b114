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

//! The shared register/program arena and its two windows.

mod arena;
mod program;
mod registers;

pub use arena::{Arena, ARENA_NYBBLES};
pub use program::{ProgramMemory, ProgramState, EXTENDED_BASE, RETURN_STACK_CAPACITY};

use amplify::hex;

use crate::data::Value;
use crate::CalcError;

/// Owner of the nybble arena, the program store and the index register.
///
/// Registers and program lines are two windows into the single arena;
/// program mutations go through the delegates here so that the register
/// window shrinks and grows consistently.
#[derive(Clone, Debug)]
pub struct Memory {
    arena: Arena,
    program: ProgramMemory,
    index_reg: Value,
}

impl Default for Memory {
    fn default() -> Self { Memory::new() }
}

impl Memory {
    pub fn new() -> Memory { Memory::with_return_stack(RETURN_STACK_CAPACITY) }

    /// A memory with a non-standard return-stack depth, used by tests
    /// exercising the overflow path at small capacities.
    pub fn with_return_stack(capacity: usize) -> Memory {
        Memory {
            arena: Arena::new(),
            program: ProgramMemory::new(capacity),
            index_reg: Value::ZERO,
        }
    }

    #[inline]
    pub fn program(&self) -> &ProgramMemory { &self.program }

    // Program delegates; see [`ProgramMemory`] for semantics.

    pub fn insert_line(&mut self, opcode: u16) -> Result<(), CalcError> {
        self.program.insert(&mut self.arena, opcode)
    }

    pub fn delete_line(&mut self) -> Result<(), CalcError> {
        self.program.delete(&mut self.arena)
    }

    pub fn opcode_at(&mut self, line: u16) -> Result<u16, CalcError> {
        self.program.opcode_at(&self.arena, line)
    }

    pub fn set_current_line(&mut self, line: u16) -> Result<(), CalcError> {
        self.program.set_current_line(line)
    }

    pub fn increment_current_line(&mut self) { self.program.increment_current_line() }

    pub fn do_next_if(&mut self, cond: bool) { self.program.do_next_if(cond) }

    pub fn goto_opcode(&mut self, opcode: u16) -> Result<(), CalcError> {
        self.program.goto_opcode(&self.arena, opcode)
    }

    pub fn gosub_opcode(&mut self, opcode: u16) -> Result<(), CalcError> {
        self.program.gosub_opcode(&self.arena, opcode)
    }

    pub fn begin_run(&mut self) { self.program.begin_run() }

    pub fn return_from_sub(&mut self) { self.program.return_from_sub() }

    pub fn reset_program(&mut self) { self.program.reset(&mut self.arena) }

    // Persistence hooks.

    /// Hex dump of all 406 arena nybbles, the `storage` field of persisted
    /// state.
    pub fn storage_hex(&self) -> String { self.arena.to_hex() }

    pub fn restore_storage(&mut self, s: &str) -> Result<(), hex::Error> {
        self.arena.restore_hex(s)
    }

    pub fn program_state(&self) -> ProgramState { self.program.snapshot() }

    /// Restores program metadata against already-loaded storage; rolls the
    /// program back to empty on inconsistency.
    pub fn restore_program(&mut self, state: ProgramState) -> Result<(), CalcError> {
        self.program.restore(&self.arena, state)
    }

    /// Raw 68-bit index register image, as persisted.
    #[inline]
    pub fn index_raw(&self) -> Value { self.index_reg }

    pub(crate) fn set_index_raw(&mut self, v: Value) { self.index_reg = v; }
}
