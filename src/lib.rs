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

//! Numeric engine and program-memory model of HP-16C/15C-style programmable
//! calculators.
//!
//! The crate reproduces the bit-exact arithmetic of the emulated hardware:
//! a BCD float codec sharing its bit patterns with raw integers
//! ([`data::Value`]), sign-mode arithmetic with hardware carry/overflow
//! rules ([`data::NumStatus`]), a 406-nybble arena shared between registers
//! and program lines ([`mem::Memory`]), the opcode catalog and program
//! executor ([`isa`]), and JSON persistence of the memory state
//! ([`persist`]).
//!
//! Everything interactive (key handling, display layout, menus) lives in
//! frontends that drive a [`Model`] through the operation catalog.

#[macro_use]
extern crate amplify;

pub mod data;
mod error;
pub mod isa;
pub mod mem;
pub mod model;
pub mod persist;

pub use error::CalcError;
pub use model::{DisplayMode, Model};
