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

use proptest::prelude::*;

use voyager::data::{NumStatus, SignMode, Value};

fn integer_mode() -> impl Strategy<Value = SignMode> {
    prop_oneof![
        Just(SignMode::Unsigned),
        Just(SignMode::OnesComplement),
        Just(SignMode::TwosComplement),
    ]
}

proptest! {
    /// The BCD image keeps 10 significant decimal digits of any in-range
    /// double.
    #[test]
    fn bcd_codec_keeps_ten_digits(
        negative in any::<bool>(),
        mantissa in 1_000_000_000u64..=9_999_999_999,
        exponent in -99i32..=99,
    ) {
        let d = mantissa as f64 * 10f64.powi(exponent - 9) * if negative { -1.0 } else { 1.0 };
        let decoded = Value::from_f64(d).as_f64().unwrap();
        let err = ((decoded - d) / d).abs();
        prop_assert!(err < 1e-9, "{} decoded as {}", d, decoded);
    }

    /// Every integer of a mode's range encodes without overflow and decodes
    /// back to itself, at every word size.
    #[test]
    fn sign_modes_round_trip_their_range(
        bits in 1u32..=64,
        mode in integer_mode(),
        seed in any::<i128>(),
    ) {
        let mut st = NumStatus::new(bits, mode);
        let range = st.max_value() - st.min_value() + 1;
        let big = st.min_value() + seed.rem_euclid(range);
        let v = st.from_big(big);
        prop_assert!(!st.overflow);
        prop_assert!(v.internal() <= st.word_mask());
        prop_assert_eq!(st.to_big(v), big);
    }

    /// Negation is an involution on every pattern except the asymmetric
    /// two's-complement minimum and the unsigned mode (where it is the
    /// identity).
    #[test]
    fn negation_involution(
        bits in 2u32..=64,
        mode in integer_mode(),
        raw in any::<u128>(),
    ) {
        let mut st = NumStatus::new(bits, mode);
        let v = Value::from_internal(raw & st.word_mask());
        let once = st.negate(v);
        let twice = st.negate(once);
        if mode == SignMode::OnesComplement && v.internal() == st.word_mask() {
            // -0 negates to +0, which then stays put.
            prop_assert_eq!(twice, Value::ZERO);
        } else {
            prop_assert_eq!(twice, v);
        }
    }

    /// The arena hex dump is lossless.
    #[test]
    fn storage_dump_round_trips(nybbles in proptest::collection::vec(0u8..=0xf, 406)) {
        let mut mem = voyager::mem::Arena::new();
        for (addr, n) in nybbles.iter().enumerate() {
            mem.set(addr, *n);
        }
        let mut restored = voyager::mem::Arena::new();
        restored.restore_hex(&mem.to_hex()).unwrap();
        prop_assert_eq!(restored, mem);
    }
}
