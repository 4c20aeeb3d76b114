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

//! Static opcode assignment.
//!
//! Opcodes are assigned by enumeration order, following the device keyboard:
//! digit keys first, then the unshifted and shifted functions row by row,
//! then the argumented families (one opcode per concrete argument, the
//! index-register and indirect sentinels included). Frequently programmed
//! operations therefore stay within the single-byte range; the late families
//! spill into the extended two-byte encoding.
//!
//! The catalog is built once at startup and threaded through construction;
//! there is no process-wide singleton, and tests build their own.

use crate::isa::opcodes;
use crate::isa::{CalcFn, OpKind, ProgramOperation, StackLift, ARG_INDEX, ARG_INDIRECT};
use crate::CalcError;

/// Number of program labels addressable by GTO/GSB.
pub const LABELS: usize = 16;

/// Largest argument enterable with a single hex keystroke; bigger register
/// or bit numbers go through the index register.
const ARG_MAX: u8 = 15;

/// The decode table from opcode to operation.
pub struct Catalog {
    ops: Vec<ProgramOperation>,
    labels: [u16; LABELS],
}

struct Builder {
    ops: Vec<ProgramOperation>,
    labels: [u16; LABELS],
}

impl Builder {
    fn push_op(
        &mut self,
        name: &'static str,
        arg: Option<u8>,
        kind: OpKind,
        lift: StackLift,
        int_calc: Option<CalcFn>,
        float_calc: Option<CalcFn>,
    ) -> u16 {
        let opcode = self.ops.len() as u16;
        self.ops.push(ProgramOperation { name, arg, lift, kind, int_calc, float_calc });
        opcode
    }

    /// A plain operation with mode-specific calculations.
    fn calc(
        &mut self,
        name: &'static str,
        lift: StackLift,
        int_calc: Option<CalcFn>,
        float_calc: Option<CalcFn>,
    ) {
        self.push_op(name, None, OpKind::Calc, lift, int_calc, float_calc);
    }

    /// A plain operation behaving identically in every mode.
    fn both(&mut self, name: &'static str, lift: StackLift, f: CalcFn) {
        self.calc(name, lift, Some(f), Some(f));
    }

    /// A control-flow operation; any calculation happens in the executor.
    fn control(&mut self, name: &'static str, kind: OpKind) {
        self.push_op(name, None, kind, StackLift::Neutral, None, None);
    }

    /// One opcode per argument value 0..=`max`, plus the I and (i)
    /// sentinels when the family is indexable.
    fn family(
        &mut self,
        name: &'static str,
        kind: OpKind,
        lift: StackLift,
        max: u8,
        indexable: bool,
        int_calc: Option<CalcFn>,
        float_calc: Option<CalcFn>,
    ) {
        for n in 0..=max {
            self.push_op(name, Some(n), kind, lift, int_calc, float_calc);
        }
        if indexable {
            self.push_op(name, Some(ARG_INDEX), kind, lift, int_calc, float_calc);
            self.push_op(name, Some(ARG_INDIRECT), kind, lift, int_calc, float_calc);
        }
    }
}

impl Default for Catalog {
    fn default() -> Self { Catalog::new() }
}

impl Catalog {
    pub fn new() -> Catalog {
        let mut b = Builder { ops: Vec::with_capacity(300), labels: [0; LABELS] };

        // Digit keys 0-9 and A-F.
        b.family(
            "digit",
            OpKind::Digit,
            StackLift::Enable,
            ARG_MAX,
            false,
            Some(opcodes::digit),
            Some(opcodes::digit_float),
        );

        // Arithmetic column.
        b.calc("+", StackLift::Enable, Some(opcodes::int_add), Some(opcodes::float_add));
        b.calc("-", StackLift::Enable, Some(opcodes::int_sub), Some(opcodes::float_sub));
        b.calc("×", StackLift::Enable, Some(opcodes::int_mul), Some(opcodes::float_mul));
        b.calc("÷", StackLift::Enable, Some(opcodes::int_div), Some(opcodes::float_div));
        b.calc("RMD", StackLift::Enable, Some(opcodes::int_rmd), None);
        b.both("CHS", StackLift::Enable, opcodes::negate);
        b.calc("ABS", StackLift::Enable, Some(opcodes::int_abs), Some(opcodes::float_abs));
        b.calc("√x", StackLift::Enable, Some(opcodes::int_sqrt), Some(opcodes::float_sqrt));
        b.calc("1/x", StackLift::Enable, Some(opcodes::int_recip), Some(opcodes::float_recip));
        b.calc("DBL×", StackLift::Enable, Some(opcodes::dbl_mul), None);
        b.calc("DBL÷", StackLift::Enable, Some(opcodes::dbl_div), None);
        b.calc("DBLR", StackLift::Enable, Some(opcodes::dbl_rmd), None);

        // Shifted logic row.
        b.calc("AND", StackLift::Enable, Some(opcodes::logic_and), None);
        b.calc("OR", StackLift::Enable, Some(opcodes::logic_or), None);
        b.calc("XOR", StackLift::Enable, Some(opcodes::logic_xor), None);
        b.calc("NOT", StackLift::Enable, Some(opcodes::logic_not), None);

        // Shift and rotate row.
        b.calc("SL", StackLift::Enable, Some(opcodes::shift_left), None);
        b.calc("SR", StackLift::Enable, Some(opcodes::shift_right), None);
        b.calc("ASR", StackLift::Enable, Some(opcodes::shift_right_arithmetic), None);
        b.calc("RL", StackLift::Enable, Some(opcodes::rotate_left), None);
        b.calc("RR", StackLift::Enable, Some(opcodes::rotate_right), None);
        b.calc("RLC", StackLift::Enable, Some(opcodes::rotate_left_carry), None);
        b.calc("RRC", StackLift::Enable, Some(opcodes::rotate_right_carry), None);
        b.calc("LJ", StackLift::Enable, Some(opcodes::left_justify), None);
        b.calc("#B", StackLift::Enable, Some(opcodes::count_bits), None);

        // Stack row.
        b.both("ENTER", StackLift::Disable, opcodes::enter);
        b.both("CLx", StackLift::Disable, opcodes::clear_x);
        b.both("x≷y", StackLift::Enable, opcodes::swap_xy);
        b.both("R↓", StackLift::Enable, opcodes::roll_down);
        b.both("R↑", StackLift::Enable, opcodes::roll_up);
        b.both("LST x", StackLift::Enable, opcodes::recall_last_x);

        // Mode row.
        b.both("HEX", StackLift::Neutral, opcodes::mode_hex);
        b.both("DEC", StackLift::Neutral, opcodes::mode_dec);
        b.both("OCT", StackLift::Neutral, opcodes::mode_oct);
        b.both("BIN", StackLift::Neutral, opcodes::mode_bin);
        b.both("UNSGN", StackLift::Neutral, opcodes::mode_unsigned);
        b.both("1'S", StackLift::Neutral, opcodes::mode_ones);
        b.both("2'S", StackLift::Neutral, opcodes::mode_twos);
        b.calc("WSIZE", StackLift::Neutral, Some(opcodes::word_size), None);
        b.both("CLR REG", StackLift::Neutral, opcodes::clear_registers);

        // Comparison tests.
        b.both("x≤y", StackLift::Neutral, opcodes::x_le_y);
        b.both("x<0", StackLift::Neutral, opcodes::x_lt_0);
        b.both("x>y", StackLift::Neutral, opcodes::x_gt_y);
        b.both("x>0", StackLift::Neutral, opcodes::x_gt_0);
        b.both("x≠y", StackLift::Neutral, opcodes::x_ne_y);
        b.both("x≠0", StackLift::Neutral, opcodes::x_ne_0);
        b.both("x=y", StackLift::Neutral, opcodes::x_eq_y);
        b.both("x=0", StackLift::Neutral, opcodes::x_eq_0);

        // Control row.
        b.control("RTN", OpKind::Return);
        b.control("R/S", OpKind::RunStop);
        b.control("PSE", OpKind::Pause);
        b.both("DSZ", StackLift::Neutral, opcodes::decrement_skip_zero);
        b.both("ISZ", StackLift::Neutral, opcodes::increment_skip_zero);

        // Register families.
        b.family(
            "STO",
            OpKind::Calc,
            StackLift::Enable,
            ARG_MAX,
            true,
            Some(opcodes::store),
            Some(opcodes::store),
        );
        b.family(
            "RCL",
            OpKind::Calc,
            StackLift::Enable,
            ARG_MAX,
            true,
            Some(opcodes::recall),
            Some(opcodes::recall),
        );

        // Branching families; LBL records the branch-target table.
        for n in 0..LABELS as u8 {
            let opcode =
                b.push_op("LBL", Some(n), OpKind::Label, StackLift::Neutral, None, None);
            b.labels[n as usize] = opcode;
        }
        b.family("GTO", OpKind::Goto, StackLift::Neutral, ARG_MAX, true, None, None);
        b.family("GSB", OpKind::Gosub, StackLift::Neutral, ARG_MAX, true, None, None);

        // Flag families.
        b.family(
            "SF",
            OpKind::Calc,
            StackLift::Neutral,
            5,
            false,
            Some(opcodes::set_flag),
            Some(opcodes::set_flag),
        );
        b.family(
            "CF",
            OpKind::Calc,
            StackLift::Neutral,
            5,
            false,
            Some(opcodes::clear_flag),
            Some(opcodes::clear_flag),
        );
        b.family(
            "F?",
            OpKind::Calc,
            StackLift::Neutral,
            5,
            false,
            Some(opcodes::test_flag),
            Some(opcodes::test_flag),
        );

        // FLOAT n.
        b.family(
            "FLOAT",
            OpKind::Calc,
            StackLift::Neutral,
            9,
            false,
            Some(opcodes::mode_float),
            Some(opcodes::mode_float),
        );

        // Bit-addressed families; these spill into the extended encoding.
        b.family("SB", OpKind::Calc, StackLift::Enable, ARG_MAX, true, Some(opcodes::set_bit), None);
        b.family(
            "CB",
            OpKind::Calc,
            StackLift::Enable,
            ARG_MAX,
            true,
            Some(opcodes::clear_bit),
            None,
        );
        b.family(
            "B?",
            OpKind::Calc,
            StackLift::Neutral,
            ARG_MAX,
            true,
            Some(opcodes::test_bit),
            None,
        );
        b.family(
            "MASKL",
            OpKind::Calc,
            StackLift::Enable,
            ARG_MAX,
            true,
            Some(opcodes::mask_left),
            None,
        );
        b.family(
            "MASKR",
            OpKind::Calc,
            StackLift::Enable,
            ARG_MAX,
            true,
            Some(opcodes::mask_right),
            None,
        );

        Catalog { ops: b.ops, labels: b.labels }
    }

    #[inline]
    pub fn len(&self) -> usize { self.ops.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.ops.is_empty() }

    /// Decodes a stored opcode.
    pub fn decode(&self, opcode: u16) -> Result<&ProgramOperation, CalcError> {
        self.ops.get(opcode as usize).ok_or(CalcError::ProgramAddress(opcode))
    }

    /// The opcode marking label `n`, the branch target of GTO/GSB `n`.
    pub fn label_opcode(&self, label: u8) -> Option<u16> {
        self.labels.get(label as usize).copied()
    }

    /// Reverse lookup by name and argument, used when assembling program
    /// lines from key presses.
    pub fn opcode_of(&self, name: &str, arg: Option<u8>) -> Option<u16> {
        self.ops
            .iter()
            .position(|op| op.name == name && op.arg == arg)
            .map(|opcode| opcode as u16)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn layout_is_deterministic() {
        let a = Catalog::new();
        let b = Catalog::new();
        assert_eq!(a.len(), b.len());
        for opcode in 0..a.len() as u16 {
            let (x, y) = (a.decode(opcode).unwrap(), b.decode(opcode).unwrap());
            assert_eq!(x.name, y.name);
            assert_eq!(x.arg, y.arg);
        }
    }

    #[test]
    fn digits_occupy_the_low_opcodes() {
        let cat = Catalog::new();
        for n in 0..=15u8 {
            let op = cat.decode(n as u16).unwrap();
            assert_eq!(op.name, "digit");
            assert_eq!(op.arg, Some(n));
            assert_eq!(op.kind, OpKind::Digit);
        }
    }

    #[test]
    fn families_carry_sentinels() {
        let cat = Catalog::new();
        let sto_5 = cat.opcode_of("STO", Some(5)).unwrap();
        let sto_i = cat.opcode_of("STO", Some(ARG_INDEX)).unwrap();
        let sto_ind = cat.opcode_of("STO", Some(ARG_INDIRECT)).unwrap();
        assert_eq!(sto_i, sto_5 + 11);
        assert_eq!(sto_ind, sto_i + 1);
    }

    #[test]
    fn label_table_matches_lbl_opcodes() {
        let cat = Catalog::new();
        for n in 0..LABELS as u8 {
            let opcode = cat.label_opcode(n).unwrap();
            let op = cat.decode(opcode).unwrap();
            assert_eq!(op.name, "LBL");
            assert_eq!(op.arg, Some(n));
        }
        assert_eq!(cat.label_opcode(16), None);
    }

    #[test]
    fn catalog_spills_into_extended_range() {
        let cat = Catalog::new();
        assert!(cat.len() > 0xff, "late families need the two-byte encoding");
        assert!(cat.len() <= 0x1ff, "extended payload is a single byte");
        assert!(cat.decode(0x100).is_ok());
        assert_eq!(cat.decode(cat.len() as u16).unwrap_err().code(), 4);
    }
}
