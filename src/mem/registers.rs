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

//! The register window of the shared arena.
//!
//! Register `i` occupies `ceil(wordSize / 4)` nybbles addressed from the
//! high end of the arena downward, most significant nybble first. Changing
//! the word size re-derives the window geometry without moving data, so
//! register contents at out-of-range indices merely become inaccessible
//! until the word size is restored.

use crate::data::{NumStatus, SignMode, Value};
use crate::mem::arena::ARENA_NYBBLES;
use crate::mem::Memory;
use crate::CalcError;

/// Saturation sentinel returned for index-register values unusable as an
/// address; large enough that every downstream range check fails uniformly.
const INDEX_SENTINEL: i64 = 10_000;

fn nybbles_per_register(status: &NumStatus) -> usize {
    (status.word_size() as usize + 3) / 4
}

impl Memory {
    /// Registers currently available: arena space not claimed by the
    /// program, divided by the per-register width.
    pub fn register_count(&self, status: &NumStatus) -> u32 {
        ((ARENA_NYBBLES - self.program().nybbles()) / nybbles_per_register(status)) as u32
    }

    /// Reads register `index` at the active word size.
    ///
    /// In float mode the stored bits must decode as a legal float image or a
    /// matrix descriptor; the format error propagates, which is how a
    /// register written in integer mode surfaces in float display mode.
    pub fn get_register(&self, index: u32, status: &NumStatus) -> Result<Value, CalcError> {
        if index >= self.register_count(status) {
            return Err(CalcError::RegisterIndex(index));
        }
        let npr = nybbles_per_register(status);
        let lo = ARENA_NYBBLES - (index as usize + 1) * npr;
        let mut bits = 0u128;
        for addr in lo..lo + npr {
            bits = bits << 4 | self.arena.get(addr) as u128;
        }
        let v = Value::from_internal(bits & status.word_mask());
        if status.sign_mode == SignMode::Float && v.as_matrix().is_none() {
            v.as_f64()?;
        }
        Ok(v)
    }

    /// Writes register `index`, masking the value to the active word size.
    pub fn set_register(
        &mut self,
        index: u32,
        value: Value,
        status: &NumStatus,
    ) -> Result<(), CalcError> {
        if index >= self.register_count(status) {
            return Err(CalcError::RegisterIndex(index));
        }
        let npr = nybbles_per_register(status);
        let lo = ARENA_NYBBLES - (index as usize + 1) * npr;
        let mut bits = value.internal() & status.word_mask();
        for addr in (lo..lo + npr).rev() {
            self.arena.set(addr, (bits & 0xf) as u8);
            bits >>= 4;
        }
        Ok(())
    }

    /// Zeroes all available register space and the index register; program
    /// storage is untouched.
    pub fn clear_registers(&mut self) {
        let program_end = self.program().nybbles();
        self.arena.fill_zero(program_end, ARENA_NYBBLES);
        self.index_reg = Value::ZERO;
    }

    /// Stores into the index register at its fixed 68-bit width.
    ///
    /// Integer values are sign-extended from the active word size, so the
    /// stored index survives a later narrowing of the word size. Float
    /// images are stored verbatim.
    pub fn set_index(&mut self, value: Value, status: &NumStatus) {
        self.index_reg = match status.sign_mode {
            SignMode::Float => value,
            _ => {
                let full = NumStatus::index_register(status.sign_mode);
                full.wrap_big(status.to_big(value))
            }
        };
    }

    /// Reads the index register back at the active word size.
    pub fn get_index(&self, status: &NumStatus) -> Value {
        match status.sign_mode {
            SignMode::Float => self.index_reg,
            _ => {
                let full = NumStatus::index_register(status.sign_mode);
                status.wrap_big(full.to_big(self.index_reg))
            }
        }
    }

    /// Derives an addressing integer from the index register.
    ///
    /// Unusable values saturate (negative to -1, oversized or undecodable
    /// to a large sentinel) instead of failing here, so that the subsequent
    /// range check produces the uniform register or argument error.
    pub fn index_as_address(&self, sign_mode: SignMode) -> i64 {
        match sign_mode {
            SignMode::Float => match self.index_reg.as_f64() {
                Ok(d) if d < 0.0 => -1,
                Ok(d) if d >= INDEX_SENTINEL as f64 => INDEX_SENTINEL,
                Ok(d) => d.trunc() as i64,
                Err(_) => INDEX_SENTINEL,
            },
            mode => {
                let big = NumStatus::index_register(mode).to_big(self.index_reg);
                if big < 0 {
                    -1
                } else if big >= INDEX_SENTINEL as i128 {
                    INDEX_SENTINEL
                } else {
                    big as i64
                }
            }
        }
    }
}
