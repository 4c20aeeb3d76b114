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

//! The calculation bodies behind every catalog entry.
//!
//! Each function matches [`crate::isa::CalcFn`]; the optional argument is
//! the register, flag, bit or label number baked into the opcode, with the
//! [`ARG_INDEX`]/[`ARG_INDIRECT`] sentinels resolved against the index
//! register at execution time.

use core::cmp::Ordering;

use crate::data::{NumStatus, SignMode, Value};
use crate::isa::{ARG_INDEX, ARG_INDIRECT};
use crate::model::{DisplayMode, Model};
use crate::CalcError;

enum RegTarget {
    Index,
    Number(u32),
}

fn required(arg: Option<u8>) -> Result<u8, CalcError> {
    arg.ok_or(CalcError::Domain)
}

fn resolve_register(model: &Model, arg: Option<u8>) -> Result<RegTarget, CalcError> {
    match arg {
        Some(ARG_INDEX) => Ok(RegTarget::Index),
        Some(ARG_INDIRECT) => {
            let addr = model.index_as_address();
            if addr < 0 {
                return Err(CalcError::RegisterIndex(0));
            }
            Ok(RegTarget::Number(addr as u32))
        }
        Some(n) => Ok(RegTarget::Number(n as u32)),
        None => Err(CalcError::RegisterIndex(0)),
    }
}

/// Bit-number arguments; `limit_inclusive` admits `n == wordSize` for the
/// mask builders.
fn resolve_bit(model: &Model, arg: Option<u8>, limit_inclusive: bool) -> Result<u32, CalcError> {
    let n = match arg {
        Some(ARG_INDEX) | Some(ARG_INDIRECT) => {
            let addr = model.index_as_address();
            if addr < 0 {
                return Err(CalcError::BitIndex(0));
            }
            addr as u32
        }
        Some(n) => n as u32,
        None => return Err(CalcError::BitIndex(0)),
    };
    let w = model.status.word_size();
    if n > w || (n == w && !limit_inclusive) {
        return Err(CalcError::BitIndex(n));
    }
    Ok(n)
}

// Digit entry.

pub(crate) fn digit(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    let d = required(arg)? as u128;
    let base: u128 = match model.display_mode() {
        DisplayMode::Hex => 16,
        DisplayMode::Dec | DisplayMode::Float(_) => 10,
        DisplayMode::Oct => 8,
        DisplayMode::Bin => 2,
    };
    if d >= base {
        return Err(CalcError::Domain);
    }
    if model.entry_in_progress() {
        let appended = match model.display_mode() {
            DisplayMode::Dec => {
                let big = model.status.to_big(model.x()) * 10 + d as i128;
                model.status.wrap_big(big)
            }
            _ => {
                let shifted = model.x().internal() * base + d;
                Value::from_internal(shifted & model.status.word_mask())
            }
        };
        model.set_x(appended);
    } else {
        model.push(Value::from_internal(d));
    }
    Ok(())
}

pub(crate) fn digit_float(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    let d = required(arg)? as f64;
    if d >= 10.0 {
        return Err(CalcError::Domain);
    }
    if model.entry_in_progress() {
        let appended = model.x().as_f64()? * 10.0 + d;
        model.set_x(Value::from_f64(appended));
    } else {
        model.push(Value::from_f64(d));
    }
    Ok(())
}

// Arithmetic.

pub(crate) fn int_add(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (x, y) = (model.x(), model.y());
    let r = model.status.int_add(x, y);
    model.save_last_x();
    model.binary_result(r);
    Ok(())
}

pub(crate) fn int_sub(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (x, y) = (model.x(), model.y());
    let r = model.status.int_subtract(x, y);
    model.save_last_x();
    model.binary_result(r);
    Ok(())
}

pub(crate) fn int_mul(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (x, y) = (model.x(), model.y());
    let r = model.status.int_multiply(x, y);
    model.save_last_x();
    model.binary_result(r);
    Ok(())
}

pub(crate) fn int_div(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (x, y) = (model.x(), model.y());
    let r = model.status.int_divide(x, y)?;
    model.save_last_x();
    model.binary_result(r);
    Ok(())
}

pub(crate) fn int_rmd(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (x, y) = (model.x(), model.y());
    let r = model.status.int_remainder(x, y)?;
    model.save_last_x();
    model.binary_result(r);
    Ok(())
}

fn float_binary(model: &mut Model, f: fn(f64, f64) -> f64) -> Result<(), CalcError> {
    let x = model.x().as_f64()?;
    let y = model.y().as_f64()?;
    model.save_last_x();
    model.binary_result(Value::from_f64(f(y, x)));
    Ok(())
}

pub(crate) fn float_add(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    float_binary(model, |y, x| y + x)
}

pub(crate) fn float_sub(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    float_binary(model, |y, x| y - x)
}

pub(crate) fn float_mul(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    float_binary(model, |y, x| y * x)
}

pub(crate) fn float_div(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    if model.x().is_zero_float() {
        return Err(CalcError::Domain);
    }
    float_binary(model, |y, x| y / x)
}

/// CHS; [`NumStatus::negate`] already dispatches the float case.
pub(crate) fn negate(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let x = model.x();
    let r = model.status.negate(x);
    model.set_x(r);
    Ok(())
}

pub(crate) fn int_abs(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let big = model.status.to_big(model.x());
    let r = model.status.from_big(big.abs());
    model.save_last_x();
    model.set_x(r);
    Ok(())
}

pub(crate) fn float_abs(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let x = model.x();
    if x.as_f64()? < 0.0 {
        model.save_last_x();
        model.set_x(x.negate_as_float());
    }
    Ok(())
}

fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut r = 1u128 << (128 - n.leading_zeros()).div_ceil(2);
    loop {
        let next = (r + n / r) / 2;
        if next >= r {
            return r;
        }
        r = next;
    }
}

/// Truncated square root; carry flags an inexact result.
pub(crate) fn int_sqrt(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let big = model.status.to_big(model.x());
    if big < 0 {
        return Err(CalcError::Domain);
    }
    let r = isqrt(big as u128);
    model.status.carry = r * r != big as u128;
    let r = model.status.from_big(r as i128);
    model.save_last_x();
    model.set_x(r);
    Ok(())
}

pub(crate) fn float_sqrt(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let d = model.x().as_f64()?;
    if d < 0.0 {
        return Err(CalcError::Domain);
    }
    model.save_last_x();
    model.set_x(Value::from_f64(d.sqrt()));
    Ok(())
}

pub(crate) fn int_recip(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let big = model.status.to_big(model.x());
    if big == 0 {
        return Err(CalcError::Domain);
    }
    // Truncated towards zero: only ±1 have a non-zero reciprocal.
    let r = if big.abs() == 1 { big } else { 0 };
    let r = model.status.from_big(r);
    model.save_last_x();
    model.set_x(r);
    Ok(())
}

pub(crate) fn float_recip(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let d = model.x().as_f64()?;
    if model.x().is_zero_float() {
        return Err(CalcError::Domain);
    }
    model.save_last_x();
    model.set_x(Value::from_f64(1.0 / d));
    Ok(())
}

// Double-wide integer operations across X and Y.

/// DBL×: the 2w-bit product lands with the high word in X and the low word
/// in Y. A product of two w-bit operands always fits 2w bits, so overflow is
/// cleared.
pub(crate) fn dbl_mul(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let st = model.status;
    let (nx, mx) = st.to_parts(model.x());
    let (ny, my) = st.to_parts(model.y());
    let product = mx * my;
    let mut double = st.double_width();
    let bits = double
        .store_checked_parts((nx ^ ny) && product != 0, product)
        .internal();
    model.status.overflow = false;
    model.save_last_x();
    model.set_x(Value::from_internal(bits >> st.word_size()));
    model.set_y(Value::from_internal(bits & st.word_mask()));
    Ok(())
}

fn dbl_dividend(model: &Model) -> (bool, u128) {
    let st = model.status;
    let bits = (model.y().internal() & st.word_mask()) << st.word_size()
        | model.z().internal() & st.word_mask();
    st.double_width().to_parts(Value::from_internal(bits))
}

/// DBL÷: divides the double-wide number in Y (high) and Z (low) by X.
pub(crate) fn dbl_div(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let st = model.status;
    let (nd, md) = dbl_dividend(model);
    let (nx, mx) = st.to_parts(model.x());
    if mx == 0 {
        return Err(CalcError::Domain);
    }
    let q = md / mx;
    model.status.carry = md % mx != 0;
    let r = model.status.store_checked_parts((nd ^ nx) && q != 0, q);
    model.save_last_x();
    model.drop_y();
    model.drop_y();
    model.set_x(r);
    Ok(())
}

/// DBLR: remainder of the double-wide division, sign following the
/// dividend.
pub(crate) fn dbl_rmd(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let st = model.status;
    let (nd, md) = dbl_dividend(model);
    let (_, mx) = st.to_parts(model.x());
    if mx == 0 {
        return Err(CalcError::Domain);
    }
    let rem = md % mx;
    let r = model.status.store_checked_parts(nd && rem != 0, rem);
    model.save_last_x();
    model.drop_y();
    model.drop_y();
    model.set_x(r);
    Ok(())
}

// Logic.

fn logic_binary(model: &mut Model, f: fn(u128, u128) -> u128) -> Result<(), CalcError> {
    let m = model.status.word_mask();
    let r = f(model.y().internal(), model.x().internal()) & m;
    model.save_last_x();
    model.binary_result(Value::from_internal(r));
    Ok(())
}

pub(crate) fn logic_and(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    logic_binary(model, |y, x| y & x)
}

pub(crate) fn logic_or(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    logic_binary(model, |y, x| y | x)
}

pub(crate) fn logic_xor(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    logic_binary(model, |y, x| y ^ x)
}

pub(crate) fn logic_not(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let m = model.status.word_mask();
    let r = !model.x().internal() & m;
    model.save_last_x();
    model.set_x(Value::from_internal(r));
    Ok(())
}

// Shifts and rotates; all single-step, carry receives the bit shifted out.

pub(crate) fn shift_left(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (m, s) = (model.status.word_mask(), model.status.sign_mask());
    let x = model.x().internal() & m;
    model.status.carry = x & s != 0;
    model.save_last_x();
    model.set_x(Value::from_internal(x << 1 & m));
    Ok(())
}

pub(crate) fn shift_right(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let m = model.status.word_mask();
    let x = model.x().internal() & m;
    model.status.carry = x & 1 != 0;
    model.save_last_x();
    model.set_x(Value::from_internal(x >> 1));
    Ok(())
}

/// ASR keeps the top bit, whatever the sign mode calls it.
pub(crate) fn shift_right_arithmetic(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (m, s) = (model.status.word_mask(), model.status.sign_mask());
    let x = model.x().internal() & m;
    model.status.carry = x & 1 != 0;
    model.save_last_x();
    model.set_x(Value::from_internal(x >> 1 | x & s));
    Ok(())
}

pub(crate) fn rotate_left(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (m, s) = (model.status.word_mask(), model.status.sign_mask());
    let x = model.x().internal() & m;
    let wrapped = (x & s != 0) as u128;
    model.status.carry = wrapped != 0;
    model.save_last_x();
    model.set_x(Value::from_internal(x << 1 & m | wrapped));
    Ok(())
}

pub(crate) fn rotate_right(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (m, w) = (model.status.word_mask(), model.status.word_size());
    let x = model.x().internal() & m;
    let wrapped = x & 1;
    model.status.carry = wrapped != 0;
    model.save_last_x();
    model.set_x(Value::from_internal(x >> 1 | wrapped << (w - 1)));
    Ok(())
}

pub(crate) fn rotate_left_carry(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (m, s) = (model.status.word_mask(), model.status.sign_mask());
    let x = model.x().internal() & m;
    let old_carry = model.status.carry as u128;
    model.status.carry = x & s != 0;
    model.save_last_x();
    model.set_x(Value::from_internal(x << 1 & m | old_carry));
    Ok(())
}

pub(crate) fn rotate_right_carry(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (m, w) = (model.status.word_mask(), model.status.word_size());
    let x = model.x().internal() & m;
    let old_carry = model.status.carry as u128;
    model.status.carry = x & 1 != 0;
    model.save_last_x();
    model.set_x(Value::from_internal(x >> 1 | old_carry << (w - 1)));
    Ok(())
}

/// LJ: the left-justified value lands in Y, the shift count in X.
pub(crate) fn left_justify(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let (m, s) = (model.status.word_mask(), model.status.sign_mask());
    let mut v = model.x().internal() & m;
    let mut count = 0u128;
    if v != 0 {
        while v & s == 0 {
            v <<= 1;
            count += 1;
        }
    }
    model.save_last_x();
    model.lift();
    model.set_y(Value::from_internal(v & m));
    model.set_x(Value::from_internal(count));
    Ok(())
}

/// #B: population count of X.
pub(crate) fn count_bits(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let x = model.x().internal() & model.status.word_mask();
    model.save_last_x();
    model.set_x(Value::from_internal(x.count_ones() as u128));
    Ok(())
}

// Bit addressing.

pub(crate) fn set_bit(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    let n = resolve_bit(model, arg, false)?;
    let x = model.x().internal() | 1 << n;
    model.save_last_x();
    model.set_x(Value::from_internal(x & model.status.word_mask()));
    Ok(())
}

pub(crate) fn clear_bit(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    let n = resolve_bit(model, arg, false)?;
    let x = model.x().internal() & !(1 << n);
    model.save_last_x();
    model.set_x(Value::from_internal(x & model.status.word_mask()));
    Ok(())
}

/// B?: skips the next line when the bit is clear.
pub(crate) fn test_bit(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    let n = resolve_bit(model, arg, false)?;
    let set = model.x().internal() & 1 << n != 0;
    model.memory_mut().do_next_if(set);
    Ok(())
}

pub(crate) fn mask_left(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    let n = resolve_bit(model, arg, true)?;
    let (m, w) = (model.status.word_mask(), model.status.word_size());
    let lower = if n == w { 0 } else { (1u128 << (w - n)) - 1 };
    model.push(Value::from_internal(m & !lower));
    Ok(())
}

pub(crate) fn mask_right(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    let n = resolve_bit(model, arg, true)?;
    let mask = if n == 0 { 0 } else { (1u128 << n) - 1 };
    model.push(Value::from_internal(mask & model.status.word_mask()));
    Ok(())
}

// Stack manipulation.

pub(crate) fn enter(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    model.lift();
    Ok(())
}

pub(crate) fn clear_x(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    model.set_x(Value::ZERO);
    Ok(())
}

pub(crate) fn swap_xy(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    model.swap_xy();
    Ok(())
}

pub(crate) fn roll_down(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    model.roll_down();
    Ok(())
}

pub(crate) fn roll_up(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    model.roll_up();
    Ok(())
}

pub(crate) fn recall_last_x(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    model.push(model.last_x());
    Ok(())
}

// Registers.

pub(crate) fn store(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    match resolve_register(model, arg)? {
        RegTarget::Index => model.set_index(model.x()),
        RegTarget::Number(n) => model.set_register(n, model.x())?,
    }
    Ok(())
}

pub(crate) fn recall(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    let v = match resolve_register(model, arg)? {
        RegTarget::Index => model.get_index(),
        RegTarget::Number(n) => model.get_register(n)?,
    };
    model.push(v);
    Ok(())
}

pub(crate) fn clear_registers(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    model.memory_mut().clear_registers();
    Ok(())
}

// Flags.

pub(crate) fn set_flag(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    model.set_flag(required(arg)?, true)
}

pub(crate) fn clear_flag(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    model.set_flag(required(arg)?, false)
}

/// F?: skips the next line when the flag is clear.
pub(crate) fn test_flag(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    let cond = model.flag(required(arg)?)?;
    model.memory_mut().do_next_if(cond);
    Ok(())
}

// Comparison skips; each skips the next line when the test fails.

fn skip_unless(model: &mut Model, cond: bool) {
    model.memory_mut().do_next_if(cond);
}

pub(crate) fn x_eq_0(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let cond = model.status.is_zero(model.x());
    skip_unless(model, cond);
    Ok(())
}

pub(crate) fn x_ne_0(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let cond = !model.status.is_zero(model.x());
    skip_unless(model, cond);
    Ok(())
}

pub(crate) fn x_lt_0(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let cond = model.status.compare(model.x(), Value::ZERO)? == Ordering::Less;
    skip_unless(model, cond);
    Ok(())
}

pub(crate) fn x_gt_0(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let cond = model.status.compare(model.x(), Value::ZERO)? == Ordering::Greater;
    skip_unless(model, cond);
    Ok(())
}

pub(crate) fn x_eq_y(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let cond = model.status.compare(model.x(), model.y())? == Ordering::Equal;
    skip_unless(model, cond);
    Ok(())
}

pub(crate) fn x_ne_y(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let cond = model.status.compare(model.x(), model.y())? != Ordering::Equal;
    skip_unless(model, cond);
    Ok(())
}

pub(crate) fn x_le_y(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let cond = model.status.compare(model.x(), model.y())? != Ordering::Greater;
    skip_unless(model, cond);
    Ok(())
}

pub(crate) fn x_gt_y(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let cond = model.status.compare(model.x(), model.y())? == Ordering::Greater;
    skip_unless(model, cond);
    Ok(())
}

// Loop counters on the index register, at its full width. Neither touches
// carry or overflow.

fn step_index(model: &mut Model, delta: i64) -> Result<(), CalcError> {
    let full = NumStatus::index_register(model.status.sign_mode);
    let next = full.increment(model.memory().index_raw(), delta)?;
    let zero = full.is_zero(next);
    model.memory_mut().set_index_raw(next);
    // Skip the next line once the counter reaches zero.
    model.memory_mut().do_next_if(!zero);
    Ok(())
}

pub(crate) fn decrement_skip_zero(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    step_index(model, -1)
}

pub(crate) fn increment_skip_zero(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    step_index(model, 1)
}

// Word size and modes.

/// WSIZE: consumes X as the new word size; 0 selects the full 64 bits.
pub(crate) fn word_size(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    let big = model.status.to_big(model.x());
    let bits = if big == 0 { 64 } else { big };
    if !(1..=64).contains(&bits) {
        return Err(CalcError::BitIndex(bits.max(0) as u32));
    }
    model.set_x(model.y());
    model.drop_y();
    model.set_word_size(bits as u32)
}

fn display_base(model: &mut Model, mode: DisplayMode) -> Result<(), CalcError> {
    model.leave_float_mode()?;
    model.set_display_mode(mode);
    Ok(())
}

pub(crate) fn mode_hex(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    display_base(model, DisplayMode::Hex)
}

pub(crate) fn mode_dec(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    display_base(model, DisplayMode::Dec)
}

pub(crate) fn mode_oct(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    display_base(model, DisplayMode::Oct)
}

pub(crate) fn mode_bin(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    display_base(model, DisplayMode::Bin)
}

pub(crate) fn mode_unsigned(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    model.set_sign_mode(SignMode::Unsigned)
}

pub(crate) fn mode_ones(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    model.set_sign_mode(SignMode::OnesComplement)
}

pub(crate) fn mode_twos(model: &mut Model, _: Option<u8>) -> Result<(), CalcError> {
    model.set_sign_mode(SignMode::TwosComplement)
}

/// FLOAT n: float sign mode with `n` fraction digits displayed.
pub(crate) fn mode_float(model: &mut Model, arg: Option<u8>) -> Result<(), CalcError> {
    let digits = required(arg)?;
    model.set_sign_mode(SignMode::Float)?;
    model.set_display_mode(DisplayMode::Float(digits));
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn isqrt_exact_and_truncated() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(17), 4);
        assert_eq!(isqrt(u64::MAX as u128), (1u128 << 32) - 1);
    }

    #[test]
    fn shift_and_rotate_carry() {
        let mut m = Model::new();
        m.set_word_size(4).unwrap();
        m.push(Value::from_internal(0b1001));

        rotate_left(&mut m, None).unwrap();
        assert_eq!(m.x().internal(), 0b0011);
        assert!(m.status.carry);
        rotate_right(&mut m, None).unwrap();
        assert_eq!(m.x().internal(), 0b1001);
        assert!(m.status.carry);

        shift_left(&mut m, None).unwrap();
        assert_eq!(m.x().internal(), 0b0010);
        assert!(m.status.carry);
        // RLC pulls the pending carry into bit 0.
        rotate_left_carry(&mut m, None).unwrap();
        assert_eq!(m.x().internal(), 0b0101);
        assert!(!m.status.carry);
    }

    #[test]
    fn arithmetic_shift_keeps_sign_bit() {
        let mut m = Model::new();
        m.set_word_size(8).unwrap();
        m.push(Value::from_internal(0b1000_0010));
        shift_right_arithmetic(&mut m, None).unwrap();
        assert_eq!(m.x().internal(), 0b1100_0001);
        assert!(!m.status.carry);
        shift_right_arithmetic(&mut m, None).unwrap();
        assert_eq!(m.x().internal(), 0b1110_0000);
        assert!(m.status.carry);
    }

    #[test]
    fn left_justify_results() {
        let mut m = Model::new();
        m.set_word_size(8).unwrap();
        m.push(Value::from_internal(0b0000_0110));
        left_justify(&mut m, None).unwrap();
        assert_eq!(m.y().internal(), 0b1100_0000);
        assert_eq!(m.x().internal(), 5);

        m.push(Value::ZERO);
        left_justify(&mut m, None).unwrap();
        assert_eq!(m.x().internal(), 0);
        assert_eq!(m.y().internal(), 0);
    }

    #[test]
    fn bit_ops_respect_word_size() {
        let mut m = Model::new();
        m.set_word_size(8).unwrap();
        m.push(Value::ZERO);
        set_bit(&mut m, Some(3)).unwrap();
        assert_eq!(m.x().internal(), 0b1000);
        clear_bit(&mut m, Some(3)).unwrap();
        assert_eq!(m.x().internal(), 0);
        assert_eq!(set_bit(&mut m, Some(8)), Err(CalcError::BitIndex(8)));

        // Bit number taken from the index register.
        m.set_index(Value::from_internal(2));
        set_bit(&mut m, Some(ARG_INDEX)).unwrap();
        assert_eq!(m.x().internal(), 0b100);
    }

    #[test]
    fn masks() {
        let mut m = Model::new();
        m.set_word_size(8).unwrap();
        mask_left(&mut m, Some(3)).unwrap();
        assert_eq!(m.x().internal(), 0b1110_0000);
        mask_right(&mut m, Some(3)).unwrap();
        assert_eq!(m.x().internal(), 0b0000_0111);
        mask_left(&mut m, Some(8)).unwrap();
        assert_eq!(m.x().internal(), 0xff);
        assert_eq!(mask_left(&mut m, Some(9)), Err(CalcError::BitIndex(9)));
    }

    #[test]
    fn double_multiply_splits_high_low() {
        let mut m = Model::new();
        m.set_sign_mode(SignMode::Unsigned).unwrap();
        m.set_word_size(64).unwrap();
        m.push(Value::from_internal(u64::MAX as u128));
        m.push(Value::from_internal(u64::MAX as u128));
        dbl_mul(&mut m, None).unwrap();
        let product = (u64::MAX as u128) * (u64::MAX as u128);
        assert_eq!(m.x().internal(), product >> 64);
        assert_eq!(m.y().internal(), product & u64::MAX as u128);
        assert!(!m.status.overflow);
    }

    #[test]
    fn double_divide_uses_y_z() {
        let mut m = Model::new();
        m.set_sign_mode(SignMode::Unsigned).unwrap();
        m.set_word_size(16).unwrap();
        // Dividend 0x1_2340 (high 1, low 0x2340), divisor 0x10.
        m.push(Value::from_internal(0x2340));
        m.push(Value::from_internal(0x1));
        m.push(Value::from_internal(0x10));
        dbl_div(&mut m, None).unwrap();
        assert_eq!(m.x().internal(), 0x1234);
        assert!(!m.status.carry);
        assert!(!m.status.overflow);
    }

    #[test]
    fn store_and_recall_indirect() {
        let mut m = Model::new();
        m.set_index(Value::from_internal(3));
        m.push(Value::from_internal(0xbeef));
        store(&mut m, Some(ARG_INDIRECT)).unwrap();
        assert_eq!(m.get_register(3).unwrap().internal(), 0xbeef);

        m.push(Value::ZERO);
        recall(&mut m, Some(ARG_INDIRECT)).unwrap();
        assert_eq!(m.x().internal(), 0xbeef);
    }

    #[test]
    fn word_size_from_x() {
        let mut m = Model::new();
        m.push(Value::from_internal(8));
        word_size(&mut m, None).unwrap();
        assert_eq!(m.status.word_size(), 8);
        // Zero selects the full 64 bits.
        m.push(Value::ZERO);
        word_size(&mut m, None).unwrap();
        assert_eq!(m.status.word_size(), 64);

        m.push(Value::from_internal(65));
        assert_eq!(word_size(&mut m, None), Err(CalcError::BitIndex(65)));
    }

    #[test]
    fn digit_entry_appends_per_base() {
        let mut m = Model::new();
        digit(&mut m, Some(0x1)).unwrap();
        m.set_entry_in_progress(true);
        digit(&mut m, Some(0xa)).unwrap();
        assert_eq!(m.x().internal(), 0x1a);

        m.set_display_mode(DisplayMode::Dec);
        m.set_entry_in_progress(false);
        digit(&mut m, Some(4)).unwrap();
        m.set_entry_in_progress(true);
        digit(&mut m, Some(2)).unwrap();
        assert_eq!(m.x().internal(), 42);
        assert_eq!(digit(&mut m, Some(0xa)), Err(CalcError::Domain));
    }

    #[test]
    fn loop_counter_skips_at_zero() {
        let mut m = Model::new();
        m.memory_mut().insert_line(0x11).unwrap();
        m.memory_mut().insert_line(0x22).unwrap();
        m.memory_mut().set_current_line(1).unwrap();
        m.set_index(Value::from_internal(2));

        decrement_skip_zero(&mut m, None).unwrap();
        assert_eq!(m.memory().program().current_line(), 1, "counter at 1, no skip");
        decrement_skip_zero(&mut m, None).unwrap();
        assert_eq!(m.memory().program().current_line(), 2, "counter hit 0, skipped");
    }
}
