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

//! Program storage: variable-width instruction lines at the low end of the
//! arena, a current-line cursor and the bounded return stack.

use serde::{Deserialize, Serialize};

use crate::mem::arena::{Arena, ARENA_NYBBLES};
use crate::CalcError;

/// Return-stack depth of the emulated device.
pub const RETURN_STACK_CAPACITY: usize = 4;

/// Escape nybble pair marking a two-byte instruction.
const ESCAPE: u8 = 0xf;

/// First opcode requiring the extended (escaped) encoding.
pub const EXTENDED_BASE: u16 = 0xff;

/// Hard bound on a label scan, an empirically observed device limit kept
/// even though the arena cannot hold that many lines.
const GOTO_SCAN_BOUND: u16 = 1000;

/// The program store.
///
/// Lines are numbered from 1; cursor position 0 is the phantom slot before
/// the first line, holding an implicit end-of-program return. Addressing is
/// not random-access because lines are 2 or 4 nybbles wide, so a single
/// (line, address) cache memoizes the last resolved position and is walked
/// forward from there.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ProgramMemory {
    lines: u16,
    current_line: u16,
    nybbles: usize,
    cache_line: u16,
    cache_addr: usize,
    return_stack: Vec<u16>,
    return_stack_pos: i32,
}

/// Persisted program metadata; the instruction nybbles themselves live in
/// the arena's `storage` dump.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramState {
    pub lines: u16,
    pub current_line: u16,
    pub return_stack: Vec<u16>,
    pub return_stack_pos: i32,
}

impl ProgramMemory {
    pub fn new(return_stack_capacity: usize) -> ProgramMemory {
        ProgramMemory {
            lines: 0,
            current_line: 0,
            nybbles: 0,
            cache_line: 1,
            cache_addr: 0,
            return_stack: vec![0; return_stack_capacity],
            return_stack_pos: -1,
        }
    }

    #[inline]
    pub fn lines(&self) -> u16 { self.lines }

    #[inline]
    pub fn current_line(&self) -> u16 { self.current_line }

    /// Nybbles occupied by program storage; everything above is register
    /// space.
    #[inline]
    pub fn nybbles(&self) -> usize { self.nybbles }

    #[inline]
    pub fn return_stack_pos(&self) -> i32 { self.return_stack_pos }

    /// Zeroes program storage and resets cursor, cache and return stack.
    pub fn reset(&mut self, arena: &mut Arena) {
        arena.fill_zero(0, self.nybbles);
        self.lines = 0;
        self.current_line = 0;
        self.nybbles = 0;
        self.cache_line = 1;
        self.cache_addr = 0;
        self.return_stack.iter_mut().for_each(|slot| *slot = 0);
        self.return_stack_pos = -1;
    }

    /// Moves the cursor, position 0 (before the first line) included.
    pub fn set_current_line(&mut self, line: u16) -> Result<(), CalcError> {
        if line > self.lines {
            return Err(CalcError::ProgramAddress(line));
        }
        self.current_line = line;
        Ok(())
    }

    fn width_at(arena: &Arena, addr: usize) -> usize {
        if arena.get(addr) == ESCAPE && arena.get(addr + 1) == ESCAPE {
            4
        } else {
            2
        }
    }

    fn write_opcode(arena: &mut Arena, addr: usize, opcode: u16) {
        if opcode >= EXTENDED_BASE {
            let payload = (opcode - EXTENDED_BASE) as u8;
            arena.set(addr, ESCAPE);
            arena.set(addr + 1, ESCAPE);
            arena.set(addr + 2, payload >> 4);
            arena.set(addr + 3, payload & 0xf);
        } else {
            arena.set(addr, (opcode >> 4) as u8);
            arena.set(addr + 1, (opcode & 0xf) as u8);
        }
    }

    fn read_opcode(arena: &Arena, addr: usize) -> u16 {
        let byte = |at: usize| (arena.get(at) as u16) << 4 | arena.get(at + 1) as u16;
        if arena.get(addr) == ESCAPE && arena.get(addr + 1) == ESCAPE {
            EXTENDED_BASE + byte(addr + 2)
        } else {
            byte(addr)
        }
    }

    /// Nybble address of the start of `line` (1-based); `lines + 1` resolves
    /// to the end of program storage.
    ///
    /// The cache is invalidated when resolving backward and advanced
    /// incrementally forward.
    fn addr_of_line(&mut self, arena: &Arena, line: u16) -> usize {
        debug_assert!((1..=self.lines + 1).contains(&line));
        if line < self.cache_line {
            self.cache_line = 1;
            self.cache_addr = 0;
        }
        while self.cache_line < line {
            self.cache_addr += Self::width_at(arena, self.cache_addr);
            self.cache_line += 1;
        }
        self.cache_addr
    }

    /// The opcode stored at `line` (1-based).
    pub fn opcode_at(&mut self, arena: &Arena, line: u16) -> Result<u16, CalcError> {
        if line == 0 || line > self.lines {
            return Err(CalcError::ProgramAddress(line));
        }
        let addr = self.addr_of_line(arena, line);
        Ok(Self::read_opcode(arena, addr))
    }

    /// Inserts an instruction after the current line and moves the cursor
    /// onto it.
    pub fn insert(&mut self, arena: &mut Arena, opcode: u16) -> Result<(), CalcError> {
        let width = if opcode >= EXTENDED_BASE { 4 } else { 2 };
        if self.nybbles + width > ARENA_NYBBLES {
            return Err(CalcError::MemoryFull);
        }
        let addr = self.addr_of_line(arena, self.current_line + 1);
        arena.shift_up(addr, self.nybbles, width);
        Self::write_opcode(arena, addr, opcode);
        self.nybbles += width;
        self.lines += 1;
        self.current_line += 1;
        self.cache_line = self.current_line;
        self.cache_addr = addr;
        Ok(())
    }

    /// Deletes the current line and moves the cursor to the previous one.
    pub fn delete(&mut self, arena: &mut Arena) -> Result<(), CalcError> {
        if self.current_line == 0 {
            return Err(CalcError::ProgramAddress(0));
        }
        let addr = self.addr_of_line(arena, self.current_line);
        let width = Self::width_at(arena, addr);
        arena.shift_down(addr, self.nybbles, width);
        self.nybbles -= width;
        self.lines -= 1;
        self.current_line -= 1;
        if self.cache_line > self.current_line {
            self.cache_line = 1;
            self.cache_addr = 0;
        }
        Ok(())
    }

    /// Normal program step: `lines + 1` cursor positions, wrapping through
    /// the phantom line 0.
    pub fn increment_current_line(&mut self) {
        self.current_line = (self.current_line + 1) % (self.lines + 1);
    }

    /// The skip primitive behind every conditional instruction: a false
    /// condition skips the following line.
    pub fn do_next_if(&mut self, cond: bool) {
        if !cond {
            self.increment_current_line();
        }
    }

    /// Branches to the first line holding `opcode`, scanning forward from
    /// the cursor and wrapping through the end of the program (line 0 is
    /// treated as the last line, since it holds the phantom return).
    pub fn goto_opcode(&mut self, arena: &Arena, opcode: u16) -> Result<(), CalcError> {
        let n = self.lines;
        if n == 0 {
            return Err(CalcError::ProgramAddress(0));
        }
        for k in 0..=n.min(GOTO_SCAN_BOUND) {
            let candidate = (self.current_line + k + n - 1) % n + 1;
            if self.opcode_at(arena, candidate)? == opcode {
                self.current_line = candidate;
                return Ok(());
            }
        }
        Err(CalcError::ProgramAddress(self.current_line))
    }

    /// Calls a subroutine: records the return line, then branches.
    ///
    /// A call from the underflow state is the top-level call; it claims a
    /// stack slot without recording a line, since returning from top level
    /// goes to line 0 anyway.
    pub fn gosub_opcode(&mut self, arena: &Arena, opcode: u16) -> Result<(), CalcError> {
        if self.return_stack_pos + 1 >= self.return_stack.len() as i32 {
            return Err(CalcError::ReturnStack);
        }
        let prev_pos = self.return_stack_pos;
        if self.return_stack_pos < 0 {
            self.return_stack_pos = 0;
        } else {
            self.return_stack[self.return_stack_pos as usize] = self.current_line;
            self.return_stack_pos += 1;
        }
        self.goto_opcode(arena, opcode).map_err(|err| {
            // A call that never branched must not consume a slot.
            self.return_stack_pos = prev_pos;
            err
        })
    }

    /// Claims the top-level return slot when a run starts. Subroutine calls
    /// made by the running program then record their return lines, while
    /// the final return still unwinds to line 0.
    pub fn begin_run(&mut self) {
        if self.return_stack_pos < 0 {
            self.return_stack_pos = 0;
        }
    }

    /// Returns from a subroutine, or to line 0 (underflow state) when the
    /// stack holds no recorded line.
    pub fn return_from_sub(&mut self) {
        if self.return_stack_pos <= 0 {
            self.current_line = 0;
            self.return_stack_pos = -1;
        } else {
            self.return_stack_pos -= 1;
            self.current_line = self.return_stack[self.return_stack_pos as usize];
        }
    }

    /// Captures the metadata persisted alongside the arena dump.
    pub fn snapshot(&self) -> ProgramState {
        ProgramState {
            lines: self.lines,
            current_line: self.current_line,
            return_stack: self.return_stack.clone(),
            return_stack_pos: self.return_stack_pos,
        }
    }

    /// Restores persisted metadata against an already-loaded arena.
    ///
    /// Every line is replayed from storage to recompute extended-instruction
    /// accounting; any inconsistency rolls the program back to empty and
    /// surfaces the error.
    pub fn restore(&mut self, arena: &Arena, state: ProgramState) -> Result<(), CalcError> {
        match self.try_restore(arena, state) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.lines = 0;
                self.current_line = 0;
                self.nybbles = 0;
                self.cache_line = 1;
                self.cache_addr = 0;
                self.return_stack.iter_mut().for_each(|slot| *slot = 0);
                self.return_stack_pos = -1;
                Err(err)
            }
        }
    }

    fn try_restore(&mut self, arena: &Arena, state: ProgramState) -> Result<(), CalcError> {
        let mut addr = 0usize;
        for line in 1..=state.lines {
            if addr + 2 > ARENA_NYBBLES {
                return Err(CalcError::ProgramAddress(line));
            }
            let width = Self::width_at(arena, addr);
            if addr + width > ARENA_NYBBLES {
                return Err(CalcError::ProgramAddress(line));
            }
            addr += width;
        }
        if state.current_line > state.lines {
            return Err(CalcError::ProgramAddress(state.current_line));
        }
        let capacity = self.return_stack.len();
        if state.return_stack.len() != capacity
            || state.return_stack_pos >= capacity as i32
            || state.return_stack_pos < -1
        {
            return Err(CalcError::ReturnStack);
        }
        if let Some(&bad) = state.return_stack.iter().find(|&&line| line > state.lines) {
            return Err(CalcError::ProgramAddress(bad));
        }
        self.lines = state.lines;
        self.current_line = state.current_line;
        self.nybbles = addr;
        self.cache_line = 1;
        self.cache_addr = 0;
        self.return_stack = state.return_stack;
        self.return_stack_pos = state.return_stack_pos;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn empty() -> (Arena, ProgramMemory) {
        (Arena::new(), ProgramMemory::new(RETURN_STACK_CAPACITY))
    }

    #[test]
    fn insert_read_delete() {
        let (mut arena, mut prog) = empty();
        prog.insert(&mut arena, 0x12).unwrap();
        prog.insert(&mut arena, 0x34).unwrap();
        assert_eq!(prog.lines(), 2);
        assert_eq!(prog.current_line(), 2);
        assert_eq!(prog.nybbles(), 4);
        assert_eq!(prog.opcode_at(&arena, 1).unwrap(), 0x12);
        assert_eq!(prog.opcode_at(&arena, 2).unwrap(), 0x34);

        prog.delete(&mut arena).unwrap();
        assert_eq!(prog.lines(), 1);
        assert_eq!(prog.current_line(), 1);
        assert_eq!(prog.opcode_at(&arena, 1).unwrap(), 0x12);
        prog.delete(&mut arena).unwrap();
        assert_eq!(prog.delete(&mut arena), Err(CalcError::ProgramAddress(0)));
        assert!(arena.is_zeroed());
    }

    #[test]
    fn extended_encoding_round_trip() {
        let (mut arena, mut prog) = empty();
        prog.insert(&mut arena, 0xfe).unwrap();
        prog.insert(&mut arena, 0xff).unwrap();
        prog.insert(&mut arena, 0x1fe).unwrap();
        assert_eq!(prog.nybbles(), 2 + 4 + 4);
        assert_eq!(prog.opcode_at(&arena, 1).unwrap(), 0xfe);
        assert_eq!(prog.opcode_at(&arena, 2).unwrap(), 0xff);
        assert_eq!(prog.opcode_at(&arena, 3).unwrap(), 0x1fe);
        // The escape prefix occupies the first two nybbles of line 2.
        assert_eq!(arena.get(2), 0xf);
        assert_eq!(arena.get(3), 0xf);
        assert_eq!(arena.get(4), 0x0);
        assert_eq!(arena.get(5), 0x0);
    }

    #[test]
    fn insert_in_the_middle_shifts_tail() {
        let (mut arena, mut prog) = empty();
        prog.insert(&mut arena, 0x11).unwrap();
        prog.insert(&mut arena, 0x33).unwrap();
        prog.set_current_line(1).unwrap();
        prog.insert(&mut arena, 0x22).unwrap();
        assert_eq!(prog.current_line(), 2);
        for (line, opcode) in [(1, 0x11), (2, 0x22), (3, 0x33)] {
            assert_eq!(prog.opcode_at(&arena, line).unwrap(), opcode);
        }
    }

    #[test]
    fn memory_full() {
        let (mut arena, mut prog) = empty();
        for _ in 0..ARENA_NYBBLES / 2 {
            prog.insert(&mut arena, 0x42).unwrap();
        }
        assert_eq!(prog.insert(&mut arena, 0x42), Err(CalcError::MemoryFull));
        assert_eq!(prog.lines() as usize, ARENA_NYBBLES / 2);
    }

    #[test]
    fn insert_all_delete_all_restores_zero_arena() {
        let (mut arena, mut prog) = empty();
        let opcodes = [0x12u16, 0x1fe, 0x34, 0xff, 0x56];
        for &op in &opcodes {
            prog.insert(&mut arena, op).unwrap();
        }
        for _ in &opcodes {
            prog.delete(&mut arena).unwrap();
        }
        let mut fresh = Arena::new();
        let mut reset = prog.clone();
        reset.reset(&mut fresh);
        assert!(arena.is_zeroed());
        assert_eq!(prog, reset);
    }

    #[test]
    fn goto_wraps_through_phantom_line() {
        let (mut arena, mut prog) = empty();
        // Line 2 carries the label.
        for op in [0x10u16, 0x43, 0x20] {
            prog.insert(&mut arena, op).unwrap();
        }
        assert_eq!(prog.current_line(), 3);
        prog.goto_opcode(&arena, 0x43).unwrap();
        assert_eq!(prog.current_line(), 2);
        // A missing label is a program address error.
        assert_eq!(
            prog.goto_opcode(&arena, 0x44),
            Err(CalcError::ProgramAddress(2))
        );
        assert_eq!(prog.current_line(), 2);
    }

    #[test]
    fn gosub_nesting_to_capacity() {
        let (mut arena, mut prog) = empty();
        prog.insert(&mut arena, 0x43).unwrap();
        prog.insert(&mut arena, 0x20).unwrap();

        for _ in 0..RETURN_STACK_CAPACITY {
            prog.gosub_opcode(&arena, 0x43).unwrap();
            prog.increment_current_line();
        }
        assert_eq!(
            prog.gosub_opcode(&arena, 0x43),
            Err(CalcError::ReturnStack)
        );
        // Unwind: every recorded call pops, then the top level lands on 0.
        for _ in 0..RETURN_STACK_CAPACITY - 1 {
            prog.return_from_sub();
            assert_ne!(prog.return_stack_pos(), -1);
        }
        prog.return_from_sub();
        assert_eq!(prog.current_line(), 0);
        assert_eq!(prog.return_stack_pos(), -1);
    }

    #[test]
    fn failed_gosub_releases_its_slot() {
        let (mut arena, mut prog) = empty();
        prog.insert(&mut arena, 0x43).unwrap();
        prog.insert(&mut arena, 0x20).unwrap();

        // A call to an absent label fails without consuming a slot, from
        // underflow and from a nested position alike.
        assert_eq!(
            prog.gosub_opcode(&arena, 0x44),
            Err(CalcError::ProgramAddress(2))
        );
        assert_eq!(prog.return_stack_pos(), -1);

        prog.gosub_opcode(&arena, 0x43).unwrap();
        prog.gosub_opcode(&arena, 0x43).unwrap();
        for _ in 0..RETURN_STACK_CAPACITY {
            assert_eq!(
                prog.gosub_opcode(&arena, 0x44),
                Err(CalcError::ProgramAddress(1))
            );
        }
        assert_eq!(prog.return_stack_pos(), 1, "failed calls left no residue");
        // The stack still has room for a successful call.
        prog.gosub_opcode(&arena, 0x43).unwrap();
        assert_eq!(prog.return_stack_pos(), 2);
    }

    #[test]
    fn cursor_wraps_including_phantom_slot() {
        let (mut arena, mut prog) = empty();
        prog.insert(&mut arena, 0x11).unwrap();
        prog.insert(&mut arena, 0x22).unwrap();
        prog.set_current_line(0).unwrap();
        let mut seen = vec![];
        for _ in 0..6 {
            prog.increment_current_line();
            seen.push(prog.current_line());
        }
        assert_eq!(seen, vec![1, 2, 0, 1, 2, 0]);

        prog.set_current_line(1).unwrap();
        prog.do_next_if(true);
        assert_eq!(prog.current_line(), 1);
        prog.do_next_if(false);
        assert_eq!(prog.current_line(), 2);
    }

    #[test]
    fn state_round_trip() {
        let (mut arena, mut prog) = empty();
        for op in [0x12u16, 0x1fe, 0x43] {
            prog.insert(&mut arena, op).unwrap();
        }
        prog.gosub_opcode(&arena, 0x43).unwrap();
        let state = prog.snapshot();

        let mut restored = ProgramMemory::new(RETURN_STACK_CAPACITY);
        restored.restore(&arena, state.clone()).unwrap();
        assert_eq!(restored.snapshot(), state);
        assert_eq!(restored.nybbles(), 2 + 4 + 2);
        assert_eq!(restored.opcode_at(&arena, 3).unwrap(), 0x43);
    }

    #[test]
    fn restore_rolls_back_on_bad_state() {
        let (mut arena, mut prog) = empty();
        prog.insert(&mut arena, 0x12).unwrap();
        let mut state = prog.snapshot();
        state.current_line = 7;

        let mut restored = ProgramMemory::new(RETURN_STACK_CAPACITY);
        assert_eq!(
            restored.restore(&arena, state),
            Err(CalcError::ProgramAddress(7))
        );
        assert_eq!(restored, ProgramMemory::new(RETURN_STACK_CAPACITY));
    }

    #[test]
    fn restore_rejects_oversized_line_count() {
        let (arena, _) = empty();
        let state = ProgramState {
            lines: (ARENA_NYBBLES / 2 + 1) as u16,
            current_line: 0,
            return_stack: vec![0; RETURN_STACK_CAPACITY],
            return_stack_pos: -1,
        };
        let mut prog = ProgramMemory::new(RETURN_STACK_CAPACITY);
        assert!(prog.restore(&arena, state).is_err());
    }
}
