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

use amplify::hex::{self, FromHex, ToHex};

/// Total arena capacity in nybbles, a literal constraint of the emulated
/// hardware.
pub const ARENA_NYBBLES: usize = 406;

/// The nybble store shared between registers and program instructions.
///
/// Program lines grow from address 0 upward; registers are windowed from the
/// high end downward. Growing the program shrinks the available register
/// range, never the other way around. One byte per nybble keeps every access
/// a plain index; the packed form exists only at the persistence boundary.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Arena {
    nybbles: Box<[u8; ARENA_NYBBLES]>,
}

impl Default for Arena {
    fn default() -> Self { Arena::new() }
}

impl Arena {
    pub fn new() -> Arena { Arena { nybbles: Box::new([0u8; ARENA_NYBBLES]) } }

    /// Reads one nybble. Callers validate addresses before arriving here;
    /// an out-of-range index is a bug, not a runtime condition.
    #[inline]
    pub fn get(&self, addr: usize) -> u8 { self.nybbles[addr] }

    /// Writes one nybble; only the low 4 bits of `value` are kept.
    #[inline]
    pub fn set(&mut self, addr: usize, value: u8) { self.nybbles[addr] = value & 0xf; }

    /// Moves `[addr, end)` up by `count` nybbles, zero-filling the vacated
    /// low gap. Data already above `end` is overwritten: the program region
    /// expanding into register space is exactly how instructions take space
    /// away from registers.
    pub fn shift_up(&mut self, addr: usize, end: usize, count: usize) {
        debug_assert!(end + count <= ARENA_NYBBLES);
        self.nybbles.copy_within(addr..end, addr + count);
        self.nybbles[addr..addr + count].fill(0);
    }

    /// Moves `[addr + count, end)` down to `addr`, zero-filling the vacated
    /// tail.
    pub fn shift_down(&mut self, addr: usize, end: usize, count: usize) {
        debug_assert!(addr + count <= end && end <= ARENA_NYBBLES);
        self.nybbles.copy_within(addr + count..end, addr);
        self.nybbles[end - count..end].fill(0);
    }

    /// Zero-fills `[from, to)`.
    pub fn fill_zero(&mut self, from: usize, to: usize) { self.nybbles[from..to].fill(0); }

    /// Whether every nybble is zero.
    pub fn is_zeroed(&self) -> bool { self.nybbles.iter().all(|&n| n == 0) }

    /// Dumps the arena as 406 hex digits, one per nybble, lowest address
    /// first: the `storage` field of persisted state.
    pub fn to_hex(&self) -> String {
        let packed: Vec<u8> = self
            .nybbles
            .chunks_exact(2)
            .map(|pair| pair[0] << 4 | pair[1])
            .collect();
        packed.to_hex()
    }

    /// Restores the arena from its hex dump, requiring exactly 406 digits.
    pub fn restore_hex(&mut self, s: &str) -> Result<(), hex::Error> {
        let packed = Vec::<u8>::from_hex(s)?;
        if packed.len() != ARENA_NYBBLES / 2 {
            return Err(hex::Error::InvalidLength(ARENA_NYBBLES / 2, packed.len()));
        }
        for (i, byte) in packed.into_iter().enumerate() {
            self.nybbles[i * 2] = byte >> 4;
            self.nybbles[i * 2 + 1] = byte & 0xf;
        }
        Ok(())
    }
}
