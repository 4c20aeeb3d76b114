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

//! JSON persistence of the memory state.
//!
//! The format carries the raw arena dump, the program metadata and the
//! index register. Decode order is significant: storage loads first, then
//! the program metadata is validated by replaying every instruction against
//! that storage, then the index register. Persistence runs against a
//! quiescent model only, never mid-instruction.

use serde::{Deserialize, Serialize};

use amplify::hex;

use crate::data::{Value, ValueParseError, INDEX_BITS};
use crate::mem::ProgramState;
use crate::model::Model;
use crate::CalcError;

/// The persisted form: `storage` is 406 hex digits, one per arena nybble;
/// `I` is the raw 68-bit index register image, at most 17 hex digits.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct SavedState {
    pub storage: String,
    pub program: ProgramState,
    #[serde(rename = "I")]
    pub index: String,
}

/// Failures decoding persisted state.
#[derive(Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum StateError {
    /// malformed state JSON: {0}
    #[from]
    Json(serde_json::Error),

    /// malformed storage dump: {0}
    #[from]
    Storage(hex::Error),

    /// invalid index register image: {0}
    #[from]
    Index(ValueParseError),

    /// inconsistent program metadata: {0}
    #[from]
    Program(CalcError),
}

/// Serializes the memory state of a quiescent model.
pub fn save(model: &Model) -> Result<String, StateError> {
    let state = SavedState {
        storage: model.memory().storage_hex(),
        program: model.memory().program_state(),
        index: model.memory().index_raw().to_hex(),
    };
    Ok(serde_json::to_string(&state)?)
}

/// Restores memory state into a model.
///
/// The index register image is parsed before anything mutates, so a
/// malformed `I` field leaves the model exactly as it was. On inconsistent
/// program metadata the program rolls back to empty (the loaded storage and
/// index register are kept) and the error surfaces so the caller can report
/// the partial restore.
pub fn load(model: &mut Model, json: &str) -> Result<(), StateError> {
    let state: SavedState = serde_json::from_str(json)?;
    let index_max = (1u128 << INDEX_BITS) - 1;
    let index = Value::from_hex(&state.index, index_max)?;
    model.memory_mut().restore_storage(&state.storage)?;
    let restored = model.memory_mut().restore_program(state.program);
    model.memory_mut().set_index_raw(index);
    restored?;
    model.mark_saved();
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::{NumStatus, SignMode};

    #[test]
    fn round_trip() {
        let mut model = Model::new();
        let status = NumStatus::new(16, SignMode::Unsigned);
        model.memory_mut().insert_line(0x12).unwrap();
        model.memory_mut().insert_line(0x1fe).unwrap();
        model
            .memory_mut()
            .set_register(0, Value::from_internal(0xbeef), &status)
            .unwrap();
        model.memory_mut().set_index(Value::from_internal(0x42), &status);

        let json = save(&model).unwrap();
        let mut restored = Model::new();
        load(&mut restored, &json).unwrap();

        assert_eq!(restored.memory().storage_hex(), model.memory().storage_hex());
        assert_eq!(restored.memory().program_state(), model.memory().program_state());
        assert_eq!(restored.memory().index_raw(), model.memory().index_raw());
        assert!(!restored.needs_save());
    }

    #[test]
    fn field_names_match_the_wire_format() {
        let model = Model::new();
        let json = save(&model).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["storage"].as_str().unwrap().len(), 406);
        assert!(value["program"]["currentLine"].is_number());
        assert!(value["program"]["returnStack"].is_array());
        assert!(value["program"]["returnStackPos"].is_number());
        assert!(value["I"].is_string());
    }

    #[test]
    fn bad_program_metadata_rolls_back() {
        let mut model = Model::new();
        model.memory_mut().insert_line(0x12).unwrap();
        let mut state: SavedState = serde_json::from_str(&save(&model).unwrap()).unwrap();
        state.program.current_line = 99;
        state.index = "5".to_string();
        let json = serde_json::to_string(&state).unwrap();

        let mut restored = Model::new();
        assert!(load(&mut restored, &json).is_err());
        // Storage and index survive; the program is empty.
        assert_eq!(restored.memory().program().lines(), 0);
        assert_eq!(restored.memory().index_raw(), Value::from_internal(5));
        assert_eq!(restored.memory().storage_hex(), model.memory().storage_hex());
    }

    #[test]
    fn bad_index_field_leaves_the_model_untouched() {
        let mut model = Model::new();
        model.memory_mut().insert_line(0x12).unwrap();
        let before = model.memory().storage_hex();

        let mut state: SavedState = serde_json::from_str(&save(&model).unwrap()).unwrap();
        // Storage where every nybble pair decodes as an extended escape;
        // stale line metadata over it would walk far past the arena.
        state.storage = "f".repeat(406);
        state.program.lines = 150;
        state.index = "zz".to_string();
        let json = serde_json::to_string(&state).unwrap();

        assert!(matches!(load(&mut model, &json), Err(StateError::Index(_))));
        // Nothing was mutated: the old storage and program still read back.
        assert_eq!(model.memory().storage_hex(), before);
        assert_eq!(model.memory_mut().opcode_at(1).unwrap(), 0x12);
    }

    #[test]
    fn oversized_index_is_rejected() {
        let mut model = Model::new();
        let mut state: SavedState = serde_json::from_str(&save(&model).unwrap()).unwrap();
        // 18 hex digits exceed the 68-bit register.
        state.index = "f".repeat(18);
        let json = serde_json::to_string(&state).unwrap();
        assert!(matches!(
            load(&mut model, &json),
            Err(StateError::Index(ValueParseError::Oversized(..)))
        ));
    }

    #[test]
    fn truncated_storage_is_rejected() {
        let mut model = Model::new();
        let mut state: SavedState = serde_json::from_str(&save(&model).unwrap()).unwrap();
        state.storage.truncate(100);
        let json = serde_json::to_string(&state).unwrap();
        assert!(matches!(load(&mut model, &json), Err(StateError::Storage(_))));
    }
}
