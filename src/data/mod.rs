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

//! Value representation and the sign-mode arithmetic engine.

mod value;
mod bcd;
mod arithm;

pub use arithm::{NumStatus, SignMode};
pub use bcd::MatrixSlot;
pub use value::{Value, ValueParseError, DOUBLE_BITS, INDEX_BITS, WORD_BITS_MAX};
