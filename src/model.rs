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

//! The calculator model: RPN stack, numeric status, memory and flags.

use crate::data::{NumStatus, SignMode, Value};
use crate::mem::Memory;
use crate::CalcError;

/// Word size the device switches to when entering float mode.
const FLOAT_WORD_BITS: u32 = 56;

/// Number of user-settable flags; flags 4 and 5 alias the carry and
/// overflow condition flags.
pub const USER_FLAGS: u8 = 6;

const FLAG_CARRY: u8 = 4;
const FLAG_OVERFLOW: u8 = 5;

/// Display radix or float notation of the X register.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum DisplayMode {
    #[display("hex")]
    Hex,
    #[display("dec")]
    Dec,
    #[display("oct")]
    Oct,
    #[display("bin")]
    Bin,
    /// Float notation with the given number of fraction digits.
    #[display("float {0}")]
    Float(u8),
}

/// One calculator instance: the four-level RPN stack, LAST X, the numeric
/// status, the shared register/program memory and the user flags.
///
/// All mutation is synchronous; a single model is never shared across
/// threads.
#[derive(Clone, Debug)]
pub struct Model {
    /// Status of the active word size; arithmetic mutates its flags.
    pub status: NumStatus,
    memory: Memory,
    /// X, Y, Z, T.
    stack: [Value; 4],
    last_x: Value,
    stack_lift_enabled: bool,
    /// Integer configuration to restore when leaving float mode.
    saved_word_size: u32,
    saved_sign_mode: SignMode,
    /// Whether digit opcodes append to X or start a fresh entry.
    entry_in_progress: bool,
    user_flags: [bool; USER_FLAGS as usize],
    display_mode: DisplayMode,
    needs_save: bool,
    stop_requested: bool,
}

impl Default for Model {
    fn default() -> Self { Model::new() }
}

impl Model {
    /// Power-on state: 16-bit two's-complement words, hex display.
    pub fn new() -> Model {
        Model {
            status: NumStatus::new(16, SignMode::TwosComplement),
            memory: Memory::new(),
            stack: [Value::ZERO; 4],
            last_x: Value::ZERO,
            stack_lift_enabled: true,
            saved_word_size: 16,
            saved_sign_mode: SignMode::TwosComplement,
            entry_in_progress: false,
            user_flags: [false; USER_FLAGS as usize],
            display_mode: DisplayMode::Hex,
            needs_save: false,
            stop_requested: false,
        }
    }

    #[inline]
    pub fn memory(&self) -> &Memory { &self.memory }

    /// Direct access for program-store operations, which do not depend on
    /// the numeric status. Register access goes through the wrappers below.
    #[inline]
    pub fn memory_mut(&mut self) -> &mut Memory {
        self.needs_save = true;
        &mut self.memory
    }

    // RPN stack.

    #[inline]
    pub fn x(&self) -> Value { self.stack[0] }

    #[inline]
    pub fn y(&self) -> Value { self.stack[1] }

    #[inline]
    pub fn z(&self) -> Value { self.stack[2] }

    #[inline]
    pub fn t(&self) -> Value { self.stack[3] }

    #[inline]
    pub fn last_x(&self) -> Value { self.last_x }

    pub fn set_x(&mut self, v: Value) {
        self.stack[0] = v;
        self.needs_save = true;
    }

    pub fn set_y(&mut self, v: Value) {
        self.stack[1] = v;
        self.needs_save = true;
    }

    /// Records X into LAST X; operations call this before replacing X.
    pub fn save_last_x(&mut self) { self.last_x = self.stack[0]; }

    /// Enters a value into X, lifting the stack unless lift is disabled
    /// (the state left behind by ENTER and CLX).
    pub fn push(&mut self, v: Value) {
        if self.stack_lift_enabled {
            self.lift();
        }
        self.stack[0] = v;
        self.needs_save = true;
    }

    /// T ← Z ← Y ← X; X survives in place.
    pub fn lift(&mut self) {
        self.stack[3] = self.stack[2];
        self.stack[2] = self.stack[1];
        self.stack[1] = self.stack[0];
    }

    /// Consumes Y after a binary operation: Y ← Z ← T, T duplicated.
    pub fn drop_y(&mut self) {
        self.stack[1] = self.stack[2];
        self.stack[2] = self.stack[3];
    }

    /// Replaces X and Y with a binary result, collapsing the stack.
    pub fn binary_result(&mut self, v: Value) {
        self.drop_y();
        self.set_x(v);
    }

    pub fn swap_xy(&mut self) {
        self.stack.swap(0, 1);
        self.needs_save = true;
    }

    /// R↓: X ← Y ← Z ← T ← old X.
    pub fn roll_down(&mut self) {
        self.stack.rotate_left(1);
        self.needs_save = true;
    }

    /// R↑: inverse of R↓.
    pub fn roll_up(&mut self) {
        self.stack.rotate_right(1);
        self.needs_save = true;
    }

    #[inline]
    pub fn stack_lift_enabled(&self) -> bool { self.stack_lift_enabled }

    pub fn set_stack_lift(&mut self, enabled: bool) { self.stack_lift_enabled = enabled; }

    // Mode changes.

    /// Changes the integer word size (1..=64 bits).
    pub fn set_word_size(&mut self, bits: u32) -> Result<(), CalcError> {
        self.status.set_word_size(bits)?;
        self.needs_save = true;
        Ok(())
    }

    /// Switches the sign mode.
    ///
    /// Entering float mode sets the 56-bit word the device uses for BCD
    /// images, remembering the integer word size; leaving float mode
    /// restores it.
    pub fn set_sign_mode(&mut self, mode: SignMode) -> Result<(), CalcError> {
        if mode == SignMode::Float && self.status.sign_mode != SignMode::Float {
            self.saved_word_size = self.status.word_size();
            self.saved_sign_mode = self.status.sign_mode;
            self.status.set_word_size(FLOAT_WORD_BITS)?;
        } else if mode != SignMode::Float && self.status.sign_mode == SignMode::Float {
            self.status.set_word_size(self.saved_word_size)?;
        }
        self.status.sign_mode = mode;
        self.needs_save = true;
        Ok(())
    }

    /// Returns to the remembered integer configuration; a no-op outside
    /// float mode. Pressing any display-base key leaves float mode this way.
    pub fn leave_float_mode(&mut self) -> Result<(), CalcError> {
        if self.status.sign_mode == SignMode::Float {
            self.set_sign_mode(self.saved_sign_mode)?;
        }
        Ok(())
    }

    /// Digit-entry state: true while consecutive digit instructions append
    /// to X instead of starting a fresh entry.
    #[inline]
    pub fn entry_in_progress(&self) -> bool { self.entry_in_progress }

    pub fn set_entry_in_progress(&mut self, active: bool) { self.entry_in_progress = active; }

    // Registers and the index register, coupled to the active status.

    pub fn register_count(&self) -> u32 { self.memory.register_count(&self.status) }

    pub fn get_register(&self, index: u32) -> Result<Value, CalcError> {
        self.memory.get_register(index, &self.status)
    }

    pub fn set_register(&mut self, index: u32, v: Value) -> Result<(), CalcError> {
        self.memory.set_register(index, v, &self.status)?;
        self.needs_save = true;
        Ok(())
    }

    pub fn get_index(&self) -> Value { self.memory.get_index(&self.status) }

    pub fn set_index(&mut self, v: Value) {
        self.memory.set_index(v, &self.status);
        self.needs_save = true;
    }

    /// Addressing integer derived from the index register; saturated, never
    /// failing. Range checks happen at the point of use.
    pub fn index_as_address(&self) -> i64 { self.memory.index_as_address(self.status.sign_mode) }

    // Flags.

    /// Reads flag `n`; flags 4 and 5 alias carry and overflow.
    pub fn flag(&self, n: u8) -> Result<bool, CalcError> {
        match n {
            FLAG_CARRY => Ok(self.status.carry),
            FLAG_OVERFLOW => Ok(self.status.overflow),
            n if n < USER_FLAGS => Ok(self.user_flags[n as usize]),
            n => Err(CalcError::BitIndex(n as u32)),
        }
    }

    pub fn set_flag(&mut self, n: u8, on: bool) -> Result<(), CalcError> {
        match n {
            FLAG_CARRY => self.status.carry = on,
            FLAG_OVERFLOW => self.status.overflow = on,
            n if n < USER_FLAGS => self.user_flags[n as usize] = on,
            n => return Err(CalcError::BitIndex(n as u32)),
        }
        self.needs_save = true;
        Ok(())
    }

    // Display.

    #[inline]
    pub fn display_mode(&self) -> DisplayMode { self.display_mode }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
        self.needs_save = true;
    }

    /// Renders the X register for the current display mode. The UI layer
    /// owns layout and error blinking; this is only the numeric text.
    pub fn display_x(&self) -> Result<String, CalcError> {
        let x = self.x();
        let masked = x.internal() & self.status.word_mask();
        match self.display_mode {
            DisplayMode::Hex => Ok(format!("{:x}", masked)),
            DisplayMode::Oct => Ok(format!("{:o}", masked)),
            DisplayMode::Bin => Ok(format!("{:b}", masked)),
            DisplayMode::Dec if self.status.sign_mode == SignMode::Float => {
                Ok(x.as_f64()?.to_string())
            }
            DisplayMode::Dec => Ok(self.status.to_big(x).to_string()),
            DisplayMode::Float(digits) => {
                Ok(format!("{:.*}", digits as usize, x.as_f64()?))
            }
        }
    }

    // Persistence and execution bookkeeping.

    #[inline]
    pub fn needs_save(&self) -> bool { self.needs_save }

    pub fn mark_saved(&mut self) { self.needs_save = false; }

    /// Any keypress during a running program requests a stop, honored at
    /// the next instruction boundary.
    pub fn request_stop(&mut self) { self.stop_requested = true; }

    pub(crate) fn take_stop_request(&mut self) -> bool {
        let stop = self.stop_requested;
        self.stop_requested = false;
        stop
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stack_lift_and_drop() {
        let mut m = Model::new();
        m.push(Value::from_internal(1));
        m.push(Value::from_internal(2));
        m.push(Value::from_internal(3));
        assert_eq!(m.x().internal(), 3);
        assert_eq!(m.y().internal(), 2);
        assert_eq!(m.z().internal(), 1);

        m.set_stack_lift(false);
        m.push(Value::from_internal(4));
        assert_eq!(m.x().internal(), 4);
        assert_eq!(m.y().internal(), 2, "disabled lift overwrites X");

        m.binary_result(Value::from_internal(9));
        assert_eq!(m.x().internal(), 9);
        assert_eq!(m.y().internal(), 1);
        assert_eq!(m.z().internal(), m.t().internal(), "T duplicates on drop");
    }

    #[test]
    fn rolls_are_inverse() {
        let mut m = Model::new();
        for v in [1u128, 2, 3, 4] {
            m.push(Value::from_internal(v));
        }
        let before = [m.x(), m.y(), m.z(), m.t()];
        m.roll_down();
        assert_eq!(m.x().internal(), 3);
        m.roll_up();
        assert_eq!([m.x(), m.y(), m.z(), m.t()], before);
    }

    #[test]
    fn flags_alias_condition_bits() {
        let mut m = Model::new();
        m.set_flag(4, true).unwrap();
        assert!(m.status.carry);
        m.status.overflow = true;
        assert!(m.flag(5).unwrap());
        m.set_flag(2, true).unwrap();
        assert!(m.flag(2).unwrap());
        assert_eq!(m.flag(6), Err(CalcError::BitIndex(6)));
    }

    #[test]
    fn float_mode_round_trips_word_size() {
        let mut m = Model::new();
        m.set_word_size(23).unwrap();
        m.set_sign_mode(SignMode::Float).unwrap();
        assert_eq!(m.status.word_size(), 56);
        m.set_sign_mode(SignMode::Unsigned).unwrap();
        assert_eq!(m.status.word_size(), 23);
    }

    #[test]
    fn display_per_mode() {
        let mut m = Model::new();
        m.push(Value::from_internal(0x2a));
        assert_eq!(m.display_x().unwrap(), "2a");
        m.set_display_mode(DisplayMode::Dec);
        assert_eq!(m.display_x().unwrap(), "42");
        m.set_display_mode(DisplayMode::Oct);
        assert_eq!(m.display_x().unwrap(), "52");
        m.set_display_mode(DisplayMode::Bin);
        assert_eq!(m.display_x().unwrap(), "101010");

        m.set_sign_mode(SignMode::Float).unwrap();
        m.set_display_mode(DisplayMode::Float(2));
        m.set_x(Value::from_f64(4.2));
        assert_eq!(m.display_x().unwrap(), "4.20");
    }

    #[test]
    fn dirty_tracking() {
        let mut m = Model::new();
        assert!(!m.needs_save());
        m.push(Value::ZERO);
        assert!(m.needs_save());
        m.mark_saved();
        m.set_flag(0, true).unwrap();
        assert!(m.needs_save());
    }
}
