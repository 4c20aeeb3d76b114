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

//! BCD float codec.
//!
//! The float image of a [`Value`] occupies 56 bits:
//!
//! ```text
//!   55    52 51                           12 11         0
//!  ┌────────┬───────────────────────────────┬────────────┐
//!  │  sign  │   10 BCD mantissa digits      │  exponent  │
//!  │ nybble │   (most significant first)    │  3 BCD     │
//!  └────────┴───────────────────────────────┴────────────┘
//! ```
//!
//! The sign nybble is 0 for positive and 9 for negative mantissas. The
//! exponent is three BCD digits in 1000's-complement form covering [-99, 99].
//! The most significant mantissa digit is non-zero unless the whole value is
//! zero. Any nybble above 9, a sign nybble other than 0/9, or an exponent of
//! magnitude ≥ 100 is not a float; decoding such a pattern is a legitimate
//! runtime error (a register written in integer mode and read back in float
//! display mode).

use core::cmp::Ordering;

use crate::data::Value;
use crate::CalcError;

const MANTISSA_SHIFT: u32 = 12;
const SIGN_SHIFT: u32 = 52;
const MANTISSA_DIGITS: u32 = 10;

const SIGN_POS: u8 = 0;
const SIGN_NEG: u8 = 9;
/// Reserved sign nybble marking the five matrix-descriptor pseudo-values.
const SIGN_MATRIX: u8 = 3;

const MANTISSA_MASK: u128 = 0xff_ffff_ffff << MANTISSA_SHIFT;
const EXPONENT_MASK: u128 = 0xfff;

/// Symbolic matrix registers A–E of the 15C.
///
/// Matrix descriptors are opaque tags: every code path that is not matrix
/// math treats them as invalid floats. Matrix arithmetic itself is
/// explicitly unimplemented.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[repr(u8)]
pub enum MatrixSlot {
    #[display("A")]
    A = 0,
    #[display("B")]
    B = 1,
    #[display("C")]
    C = 2,
    #[display("D")]
    D = 3,
    #[display("E")]
    E = 4,
}

impl MatrixSlot {
    const ALL: [MatrixSlot; 5] =
        [MatrixSlot::A, MatrixSlot::B, MatrixSlot::C, MatrixSlot::D, MatrixSlot::E];
}

fn pack(sign: u8, mantissa_bcd: u128, exponent: i32) -> u128 {
    let exp = if exponent >= 0 { exponent } else { 1000 + exponent } as u128;
    let exp_bcd = (exp / 100) << 8 | (exp / 10 % 10) << 4 | (exp % 10);
    (sign as u128) << SIGN_SHIFT | mantissa_bcd << MANTISSA_SHIFT | exp_bcd
}

impl Value {
    /// Float +1.000000000e0.
    pub const F_ONE: Value = Value::from_internal(0x1_0000_0000_0000);
    /// Largest representable float magnitude, +9.999999999e99; doubles as
    /// the positive infinity sentinel produced by overflow saturation.
    pub const F_MAX: Value = Value::from_internal(0x99_9999_9999_099);
    /// Most negative representable float, -9.999999999e99; doubles as the
    /// negative infinity sentinel.
    pub const F_MIN: Value =
        Value::from_internal((SIGN_NEG as u128) << SIGN_SHIFT | 0x99_9999_9999_099);
    /// Smallest positive float magnitude, +1.000000000e-99.
    pub const F_EPSILON: Value = Value::from_internal(0x1_0000_0000_0901);

    fn sign_nybble(self) -> u8 { (self.internal() >> SIGN_SHIFT & 0xf) as u8 }

    fn mantissa_bcd(self) -> u128 { (self.internal() & MANTISSA_MASK) >> MANTISSA_SHIFT }

    /// Whether the mantissa field is all-zero, i.e. the float value is zero.
    /// The float format has no signed zero.
    #[inline]
    pub fn is_zero_float(self) -> bool { self.mantissa_bcd() == 0 }

    /// Decodes the 10 BCD mantissa digits into an integer 0–9999999999.
    fn mantissa(self) -> Result<u64, CalcError> {
        let mut bcd = self.mantissa_bcd();
        let mut m = 0u64;
        let mut scale = 1u64;
        for _ in 0..MANTISSA_DIGITS {
            let digit = (bcd & 0xf) as u64;
            if digit > 9 {
                return Err(CalcError::BadFloat);
            }
            m += digit * scale;
            scale *= 10;
            bcd >>= 4;
        }
        Ok(m)
    }

    /// Decodes the 3-BCD-digit 1000's-complement exponent field.
    ///
    /// Fails with [`CalcError::BadFloat`] on non-decimal nybbles or a decoded
    /// magnitude of 100 or more.
    pub fn exponent(self) -> Result<i32, CalcError> {
        let bcd = self.internal() & EXPONENT_MASK;
        let (d2, d1, d0) = ((bcd >> 8 & 0xf) as i32, (bcd >> 4 & 0xf) as i32, (bcd & 0xf) as i32);
        if d2 > 9 || d1 > 9 || d0 > 9 {
            return Err(CalcError::BadFloat);
        }
        let n = d2 * 100 + d1 * 10 + d0;
        if n <= 99 {
            Ok(n)
        } else if n >= 901 {
            Ok(n - 1000)
        } else {
            Err(CalcError::BadFloat)
        }
    }

    /// Decodes the bit pattern as a float.
    ///
    /// Fails when the pattern is not a legal float image, the normal way a
    /// register holding integer data surfaces when read in float display
    /// mode.
    pub fn as_f64(self) -> Result<f64, CalcError> {
        if self.as_matrix().is_some() {
            return Err(CalcError::BadFloat);
        }
        let mantissa = self.mantissa()?;
        let exponent = self.exponent()?;
        let sign = match self.sign_nybble() {
            SIGN_POS => 1.0,
            SIGN_NEG => -1.0,
            _ => return Err(CalcError::BadFloat),
        };
        Ok(sign * mantissa as f64 * 10f64.powi(exponent - 9))
    }

    /// Converts an IEEE double into the BCD image.
    ///
    /// The double is formatted to 10 significant decimal digits; ±∞ and NaN
    /// map to the infinity sentinels, and a decimal exponent of magnitude
    /// ≥ 100 saturates to zero (underflow) or infinity (overflow).
    pub fn from_f64(d: f64) -> Value {
        if d.is_nan() {
            return Value::F_MAX;
        }
        if d.is_infinite() {
            return if d > 0.0 { Value::F_MAX } else { Value::F_MIN };
        }
        if d == 0.0 {
            // A "-0" mantissa normalizes to "+0".
            return Value::ZERO;
        }
        let text = format!("{:.9e}", d);
        let (mantissa, exponent) = text.split_once('e').expect("exponential format");
        let exponent: i32 = exponent.parse().expect("exponential format");
        if exponent > 99 {
            return if d > 0.0 { Value::F_MAX } else { Value::F_MIN };
        }
        if exponent < -99 {
            return Value::ZERO;
        }
        let sign = if mantissa.starts_with('-') { SIGN_NEG } else { SIGN_POS };
        let mut bcd = 0u128;
        for c in mantissa.chars().filter(char::is_ascii_digit) {
            bcd = bcd << 4 | (c as u8 - b'0') as u128;
        }
        if bcd == 0 {
            return Value::ZERO;
        }
        Value::from_internal(pack(sign, bcd, exponent))
    }

    /// Flips the mantissa sign. Zero maps to itself: there is no signed zero
    /// in float mode.
    pub fn negate_as_float(self) -> Value {
        if self.is_zero_float() {
            return self;
        }
        let flipped = if self.sign_nybble() == SIGN_NEG { SIGN_POS } else { SIGN_NEG };
        Value::from_internal(
            self.internal() & !(0xf << SIGN_SHIFT) | (flipped as u128) << SIGN_SHIFT,
        )
    }

    /// Adds a double-precision delta, re-encoding the result. Shared by the
    /// increment/decrement-and-skip loop instructions in float mode.
    pub fn increment_as_float(self, delta: f64) -> Result<Value, CalcError> {
        Ok(Value::from_f64(self.as_f64()? + delta))
    }

    /// Numeric comparison of two float images.
    pub fn compare_as_float(self, other: Value) -> Result<Ordering, CalcError> {
        Ok(self.as_f64()?.total_cmp(&other.as_f64()?))
    }

    /// Constructs the descriptor pseudo-value for one of the matrix
    /// registers A–E.
    pub fn from_matrix(slot: MatrixSlot) -> Value {
        Value::from_internal(
            (SIGN_MATRIX as u128) << SIGN_SHIFT | (slot as u128) << MANTISSA_SHIFT,
        )
    }

    /// Detects a matrix descriptor, returning its slot.
    pub fn as_matrix(self) -> Option<MatrixSlot> {
        if self.sign_nybble() != SIGN_MATRIX || self.internal() & EXPONENT_MASK != 0 {
            return None;
        }
        let slot = self.mantissa_bcd();
        MatrixSlot::ALL.get(slot as usize).copied()
    }
}
