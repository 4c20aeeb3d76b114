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

/// Calculator runtime errors.
///
/// Each variant maps onto the small numeric code the device shows as
/// `"  error N  "`; the UI layer renders the code and clears it on the next
/// relevant keypress. Overflow and carry are never errors; they are flag
/// state in [`crate::data::NumStatus`].
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum CalcError {
    /// arithmetic domain error (division by zero, √ of a negative, 1/0)
    Domain,

    /// bit index {0} outside the active word size
    BitIndex(u32),

    /// register index {0} outside the available register range
    RegisterIndex(u32),

    /// program line or address {0} out of range
    ProgramAddress(u16),

    /// program memory exhausted
    MemoryFull,

    /// return stack overflow
    ReturnStack,

    /// bit pattern is not a valid float image
    BadFloat,
}

impl CalcError {
    /// The numeric error code shown on the device display.
    pub fn code(self) -> u8 {
        match self {
            CalcError::Domain => 0,
            CalcError::BitIndex(_) => 2,
            CalcError::RegisterIndex(_) => 3,
            CalcError::ProgramAddress(_) | CalcError::MemoryFull => 4,
            CalcError::ReturnStack => 5,
            CalcError::BadFloat => 6,
        }
    }

    /// The offending index or address, where the error carries one.
    pub fn sub_code(self) -> Option<u32> {
        match self {
            CalcError::BitIndex(i) | CalcError::RegisterIndex(i) => Some(i),
            CalcError::ProgramAddress(line) => Some(line as u32),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_codes() {
        assert_eq!(CalcError::Domain.code(), 0);
        assert_eq!(CalcError::BitIndex(65).code(), 2);
        assert_eq!(CalcError::RegisterIndex(32).code(), 3);
        assert_eq!(CalcError::ProgramAddress(204).code(), 4);
        assert_eq!(CalcError::MemoryFull.code(), 4);
        assert_eq!(CalcError::ReturnStack.code(), 5);
        assert_eq!(CalcError::BadFloat.code(), 6);
        assert_eq!(CalcError::RegisterIndex(32).sub_code(), Some(32));
        assert_eq!(CalcError::Domain.sub_code(), None);
    }

    #[test]
    fn display_text() {
        assert_eq!(CalcError::ReturnStack.to_string(), "return stack overflow");
        assert_eq!(
            CalcError::BitIndex(65).to_string(),
            "bit index 65 outside the active word size"
        );
    }
}
