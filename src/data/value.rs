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

//! Universal in-memory datum of the calculator.
//!
//! A [`Value`] is an immutable, non-negative bit pattern of up to 68 bits
//! (128 during double-wide integer operations). The same bits are read either
//! as a raw integer (signedness decided by the active
//! [`crate::data::SignMode`]) or as a packed BCD float (see the codec in the
//! sibling module). Equality and hashing operate on the raw bits, so a float
//! `-0` and an integer `0` compare equal only when their bit images coincide.

use core::fmt::{self, Display, Formatter, LowerHex, UpperHex};
use core::num::ParseIntError;

/// Largest configurable integer word size, in bits.
pub const WORD_BITS_MAX: u32 = 64;

/// Fixed width of the index register, in bits.
///
/// The index register always carries full width so that narrowing the active
/// word size never loses the stored index.
pub const INDEX_BITS: u32 = 68;

/// Width of a double-wide integer result (e.g. a 64×64 multiply), in bits.
pub const DOUBLE_BITS: u32 = 128;

/// Immutable calculator datum.
///
/// The wrapped integer is non-negative by construction; width limits are
/// enforced at the boundaries where values enter the system (registers,
/// persisted state, arithmetic results).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Value {
    internal: u128,
}

/// Errors parsing the hexadecimal text form of a [`Value`].
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ValueParseError {
    /// value hex string is malformed ({0})
    #[from]
    Hex(ParseIntError),

    /// value {0:#x} exceeds the permitted maximum {1:#x}
    Oversized(u128, u128),
}

impl Value {
    /// All-zero bit pattern; reads as integer 0 and as float +0.
    pub const ZERO: Value = Value { internal: 0 };

    /// Constructs a value from a raw bit pattern.
    ///
    /// The unsigned argument type subsumes the non-negativity invariant of
    /// the internal representation.
    #[inline]
    pub const fn from_internal(bits: u128) -> Value { Value { internal: bits } }

    /// Returns the raw bit pattern.
    #[inline]
    pub const fn internal(self) -> u128 { self.internal }

    /// Truncates the value to the given word mask.
    ///
    /// Growing the word size never sign-extends: the hardware keeps the raw
    /// bits and merely widens the window, so this is a pure mask.
    #[inline]
    pub const fn change_bit_size(self, mask: u128) -> Value {
        Value { internal: self.internal & mask }
    }

    /// Minimum number of bits needed to represent the raw pattern.
    #[inline]
    pub fn bit_len(self) -> u32 { 128 - self.internal.leading_zeros() }

    /// Serializes the value as a plain hex string (no `0x` prefix), the form
    /// used inside persisted JSON state.
    pub fn to_hex(self) -> String { format!("{:x}", self.internal) }

    /// Parses a plain hex string, range-checking against a caller-supplied
    /// maximum.
    ///
    /// The maximum is normally the 64-bit all-ones pattern; it is raised to
    /// double width while double-precision integer operations are in flight,
    /// and to the 68-bit all-ones pattern for the index register.
    pub fn from_hex(s: &str, max: u128) -> Result<Value, ValueParseError> {
        let bits = u128::from_str_radix(s.trim_start_matches("0x"), 16)?;
        if bits > max {
            return Err(ValueParseError::Oversized(bits, max));
        }
        Ok(Value { internal: bits })
    }
}

impl From<u128> for Value {
    fn from(bits: u128) -> Self { Value { internal: bits } }
}

impl From<u64> for Value {
    fn from(bits: u64) -> Self { Value { internal: bits as u128 } }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { LowerHex::fmt(self, f) }
}

impl LowerHex for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { LowerHex::fmt(&self.internal, f) }
}

impl UpperHex for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { UpperHex::fmt(&self.internal, f) }
}
