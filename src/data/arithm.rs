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

//! Sign-mode arithmetic over raw bit patterns.
//!
//! The same [`Value`] bits are interpreted through the currently selected
//! [`SignMode`]; each mode carries its own carry/overflow rules, reproduced
//! here from the hardware's documented and empirically observed behavior.
//! Overflow and carry are never errors: they land in the [`NumStatus`]
//! flags and computation continues.

use core::cmp::Ordering;

use crate::data::{Value, DOUBLE_BITS, INDEX_BITS, WORD_BITS_MAX};
use crate::CalcError;

/// Interpretation of the raw register bits.
///
/// A closed set: the emulated device knows exactly these four
/// interpretations, so the strategy contract is dispatched by `match` rather
/// than an open trait hierarchy.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum SignMode {
    /// Raw binary, no sign bit.
    #[display("unsigned")]
    Unsigned,

    /// Ones'-complement: the all-ones pattern is a second zero, addition
    /// wraps the carry around.
    #[display("1's complement")]
    OnesComplement,

    /// Twos'-complement.
    #[display("2's complement")]
    TwosComplement,

    /// Packed BCD float; delegates to the BCD codec and carries no
    /// carry/overflow semantics.
    #[display("float")]
    Float,
}

impl SignMode {
    /// Whether the mode interprets bits as an integer word.
    #[inline]
    pub fn is_integer(self) -> bool { self != SignMode::Float }
}

/// Word size, derived masks and the two condition flags.
///
/// One instance tracks the calculator's active word size; a second, fixed
/// 68-bit instance (see [`NumStatus::index_register`]) serves the index
/// register, which always carries full width so that narrowing the active
/// word size later cannot lose the stored index.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NumStatus {
    word_size: u32,
    word_mask: u128,
    sign_mask: u128,
    /// Carry flag, set and cleared by add/subtract/shift/rotate per
    /// mode-specific rules.
    pub carry: bool,
    /// Overflow ("G") flag, set whenever a result was truncated or clamped
    /// to fit the active word size.
    pub overflow: bool,
    /// Active interpretation of register bits.
    pub sign_mode: SignMode,
}

fn mask_of(bits: u32) -> u128 {
    if bits >= DOUBLE_BITS {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    }
}

impl NumStatus {
    /// Creates a status for the given word size (1..=64, or wider for the
    /// internal index/double variants).
    pub fn new(word_size: u32, sign_mode: SignMode) -> NumStatus {
        debug_assert!((1..=128).contains(&word_size));
        NumStatus {
            word_size,
            word_mask: mask_of(word_size),
            sign_mask: 1u128 << (word_size - 1),
            carry: false,
            overflow: false,
            sign_mode,
        }
    }

    /// The fixed full-width status of the index register.
    pub fn index_register(sign_mode: SignMode) -> NumStatus { NumStatus::new(INDEX_BITS, sign_mode) }

    /// A transient status twice the current word size, used while a
    /// double-wide integer result is split across the X and Y registers.
    pub fn double_width(&self) -> NumStatus {
        debug_assert!(self.word_size * 2 <= DOUBLE_BITS);
        NumStatus::new(self.word_size * 2, self.sign_mode)
    }

    /// Changes the active word size, re-deriving the masks. Register
    /// contents are not moved; slots beyond the re-derived register count
    /// simply become inaccessible until the word size is restored.
    pub fn set_word_size(&mut self, bits: u32) -> Result<(), CalcError> {
        if bits == 0 || bits > WORD_BITS_MAX {
            return Err(CalcError::BitIndex(bits));
        }
        self.word_size = bits;
        self.word_mask = mask_of(bits);
        self.sign_mask = 1u128 << (bits - 1);
        Ok(())
    }

    #[inline]
    pub fn word_size(&self) -> u32 { self.word_size }

    #[inline]
    pub fn word_mask(&self) -> u128 { self.word_mask }

    #[inline]
    pub fn sign_mask(&self) -> u128 { self.sign_mask }

    /// Largest representable integer of the current mode.
    pub fn max_value(&self) -> i128 {
        debug_assert!(self.word_size <= INDEX_BITS);
        match self.sign_mode {
            SignMode::Unsigned => self.word_mask as i128,
            SignMode::OnesComplement | SignMode::TwosComplement => self.sign_mask as i128 - 1,
            SignMode::Float => 0,
        }
    }

    /// Smallest representable integer of the current mode.
    pub fn min_value(&self) -> i128 {
        debug_assert!(self.word_size <= INDEX_BITS);
        match self.sign_mode {
            SignMode::Unsigned => 0,
            SignMode::OnesComplement => 1 - self.sign_mask as i128,
            SignMode::TwosComplement => -(self.sign_mask as i128),
            SignMode::Float => 0,
        }
    }

    /// Splits a pattern into sign and magnitude under the current mode.
    /// Works at any width up to 128 bits (double-wide results included).
    pub fn to_parts(&self, v: Value) -> (bool, u128) {
        let bits = v.internal() & self.word_mask;
        match self.sign_mode {
            SignMode::Unsigned => (false, bits),
            SignMode::TwosComplement => {
                if bits & self.sign_mask != 0 {
                    (true, bits.wrapping_neg() & self.word_mask)
                } else {
                    (false, bits)
                }
            }
            SignMode::OnesComplement => {
                if bits & self.sign_mask != 0 {
                    (true, bits ^ self.word_mask)
                } else {
                    (false, bits)
                }
            }
            SignMode::Float => panic!("integer interpretation of bits in float sign mode"),
        }
    }

    /// Reassembles a pattern from sign and magnitude without touching flags.
    fn wrap_parts(&self, negative: bool, magnitude: u128) -> Value {
        let bits = match self.sign_mode {
            SignMode::Unsigned | SignMode::TwosComplement => {
                if negative {
                    magnitude.wrapping_neg() & self.word_mask
                } else {
                    magnitude & self.word_mask
                }
            }
            SignMode::OnesComplement => {
                if negative {
                    (magnitude & self.word_mask) ^ self.word_mask
                } else {
                    magnitude & self.word_mask
                }
            }
            SignMode::Float => panic!("integer interpretation of bits in float sign mode"),
        };
        Value::from_internal(bits)
    }

    /// Stores a mathematical result, masking it to the word size and setting
    /// the overflow flag when the true result leaves the mode's range. Every
    /// integer multiply/divide/remainder helper funnels through here.
    pub fn store_checked_parts(&mut self, negative: bool, magnitude: u128) -> Value {
        let limit = if negative {
            match self.sign_mode {
                SignMode::Unsigned => 0,
                SignMode::OnesComplement => self.sign_mask - 1,
                SignMode::TwosComplement => self.sign_mask,
                SignMode::Float => panic!("integer store in float sign mode"),
            }
        } else {
            self.max_magnitude()
        };
        self.overflow = magnitude > limit;
        self.wrap_parts(negative, magnitude)
    }

    fn max_magnitude(&self) -> u128 {
        match self.sign_mode {
            SignMode::Unsigned => self.word_mask,
            SignMode::OnesComplement | SignMode::TwosComplement => self.sign_mask - 1,
            SignMode::Float => panic!("integer store in float sign mode"),
        }
    }

    /// Interprets a pattern as a signed integer of the current mode.
    pub fn to_big(&self, v: Value) -> i128 {
        debug_assert!(self.word_size <= INDEX_BITS);
        let bits = v.internal() & self.word_mask;
        match self.sign_mode {
            SignMode::Unsigned => bits as i128,
            SignMode::TwosComplement => {
                if bits & self.sign_mask != 0 {
                    bits as i128 - (1i128 << self.word_size)
                } else {
                    bits as i128
                }
            }
            SignMode::OnesComplement => {
                if bits & self.sign_mask != 0 {
                    bits as i128 - ((1i128 << self.word_size) - 1)
                } else {
                    bits as i128
                }
            }
            SignMode::Float => panic!("integer interpretation of bits in float sign mode"),
        }
    }

    /// Encodes a signed integer, setting overflow when it had to be
    /// truncated to fit the word size.
    pub fn from_big(&mut self, big: i128) -> Value {
        self.store_checked_parts(big < 0, big.unsigned_abs())
    }

    /// Encodes a signed integer without touching any flag.
    pub fn wrap_big(&self, big: i128) -> Value { self.wrap_parts(big < 0, big.unsigned_abs()) }

    /// Mode-specific addition, setting carry and overflow per the hardware
    /// rules.
    pub fn int_add(&mut self, x: Value, y: Value) -> Value {
        let xm = x.internal() & self.word_mask;
        let ym = y.internal() & self.word_mask;
        match self.sign_mode {
            SignMode::Unsigned => {
                let sum = xm + ym;
                let carry = sum > self.word_mask;
                self.carry = carry;
                self.overflow = carry;
                Value::from_internal(sum & self.word_mask)
            }
            SignMode::TwosComplement => {
                let sum = xm + ym;
                let carry = sum > self.word_mask;
                let r = sum & self.word_mask;
                self.carry = carry;
                self.overflow = self.same_sign_overflow(xm, ym, r);
                Value::from_internal(r)
            }
            SignMode::OnesComplement => {
                let mut sum = xm + ym;
                let carry = sum > self.word_mask;
                if carry {
                    // End-around carry; a second wrap is impossible since
                    // the post-wrap sum never exceeds the mask.
                    sum = (sum & self.word_mask) + 1;
                }
                let r = sum & self.word_mask;
                self.carry = carry;
                self.overflow = self.same_sign_overflow(xm, ym, r);
                Value::from_internal(r)
            }
            SignMode::Float => panic!("integer addition in float sign mode"),
        }
    }

    fn same_sign_overflow(&self, xm: u128, ym: u128, r: u128) -> bool {
        let (sx, sy, sr) =
            (xm & self.sign_mask != 0, ym & self.sign_mask != 0, r & self.sign_mask != 0);
        sx == sy && sr != sx
    }

    /// Mode-specific subtraction computing `y - x` (RPN operand order).
    pub fn int_subtract(&mut self, x: Value, y: Value) -> Value {
        let xm = x.internal() & self.word_mask;
        let ym = y.internal() & self.word_mask;
        match self.sign_mode {
            SignMode::OnesComplement => self.int_add(Value::from_internal(xm ^ self.word_mask), y),
            SignMode::TwosComplement => {
                let negated = (!xm).wrapping_add(1) & self.word_mask;
                self.int_add(Value::from_internal(negated), y)
            }
            SignMode::Unsigned => {
                let borrow = xm > ym;
                self.carry = borrow;
                self.overflow = borrow;
                Value::from_internal(ym.wrapping_sub(xm) & self.word_mask)
            }
            SignMode::Float => panic!("integer subtraction in float sign mode"),
        }
    }

    /// Mode-specific negation.
    pub fn negate(&mut self, v: Value) -> Value {
        let vm = v.internal() & self.word_mask;
        match self.sign_mode {
            SignMode::Unsigned => {
                // No negative numbers exist; the input passes through with
                // the overflow flag raised.
                self.overflow = true;
                Value::from_internal(vm)
            }
            SignMode::TwosComplement => {
                if vm == self.sign_mask {
                    // Two's complement asymmetry: the minimum has no
                    // positive counterpart.
                    self.overflow = true;
                    Value::from_internal(vm)
                } else {
                    self.overflow = false;
                    Value::from_internal((!vm).wrapping_add(1) & self.word_mask)
                }
            }
            SignMode::OnesComplement => {
                self.overflow = false;
                if vm == 0 {
                    // Negating +0 keeps +0; the -0 pattern only arises from
                    // arithmetic.
                    v.change_bit_size(self.word_mask)
                } else {
                    Value::from_internal(vm ^ self.word_mask)
                }
            }
            SignMode::Float => v.negate_as_float(),
        }
    }

    /// Mode-specific multiplication `y * x` through the overflow funnel.
    /// Never sets carry.
    pub fn int_multiply(&mut self, x: Value, y: Value) -> Value {
        let (nx, mx) = self.to_parts(x);
        let (ny, my) = self.to_parts(y);
        let magnitude = mx.wrapping_mul(my);
        self.store_checked_parts((nx ^ ny) && magnitude != 0, magnitude)
    }

    /// Mode-specific division `y / x`, truncated toward zero.
    ///
    /// Sets carry when the division left a remainder; fails with the
    /// arithmetic domain error on a zero divisor. Dividing the minimum
    /// two's-complement value by -1 wraps back to the minimum with overflow
    /// set and carry cleared.
    pub fn int_divide(&mut self, x: Value, y: Value) -> Result<Value, CalcError> {
        let (nx, mx) = self.to_parts(x);
        let (ny, my) = self.to_parts(y);
        if mx == 0 {
            // The ones'-complement -0 pattern also lands here.
            return Err(CalcError::Domain);
        }
        let q = my / mx;
        self.carry = my % mx != 0;
        Ok(self.store_checked_parts((nx ^ ny) && q != 0, q))
    }

    /// Mode-specific remainder of `y / x`; the sign follows the dividend.
    pub fn int_remainder(&mut self, x: Value, y: Value) -> Result<Value, CalcError> {
        let (_, mx) = self.to_parts(x);
        let (ny, my) = self.to_parts(y);
        if mx == 0 {
            return Err(CalcError::Domain);
        }
        let r = my % mx;
        Ok(self.store_checked_parts(ny && r != 0, r))
    }

    /// Numeric comparison under the current mode.
    pub fn compare(&self, x: Value, y: Value) -> Result<Ordering, CalcError> {
        match self.sign_mode {
            SignMode::Float => x.compare_as_float(y),
            _ => Ok(self.to_big(x).cmp(&self.to_big(y))),
        }
    }

    /// Adds a small signed delta, wrapping silently.
    ///
    /// Shared by the increment/decrement-and-skip loop instructions; those
    /// never disturb carry or overflow on the device.
    pub fn increment(&self, v: Value, delta: i64) -> Result<Value, CalcError> {
        match self.sign_mode {
            SignMode::Float => v.increment_as_float(delta as f64),
            _ => Ok(self.wrap_big(self.to_big(v) + delta as i128)),
        }
    }

    /// Zero test; in ones'-complement both all-zeros and all-ones qualify.
    pub fn is_zero(&self, v: Value) -> bool {
        let bits = v.internal() & self.word_mask;
        match self.sign_mode {
            SignMode::OnesComplement => bits == 0 || bits == self.word_mask,
            SignMode::Float => v.is_zero_float(),
            _ => bits == 0,
        }
    }
}
