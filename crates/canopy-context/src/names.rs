// Copyright 2025 Canopy Team
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

//! Shared name-to-slot index
//!
//! Repeated lookups by name amortize to lookups by integer slot. One table is
//! shared (via `Rc`) by a context and the runtime clones instantiated from
//! the same compilation unit; the table is released when the last owning
//! context drops its reference. Id-binding slots occupy the low indices,
//! explicit-property slots follow, and the two ranges never overlap.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Reference-counted mapping from property name to stable integer slot.
///
/// Slots grow monotonically and are never reassigned; a name keeps its slot
/// for the lifetime of the table.
#[derive(Debug, Default)]
pub struct NameSlotTable {
    slots: RefCell<FxHashMap<String, u32>>,
}

impl NameSlotTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a shared table whose slots are the given names in order.
    ///
    /// This is how id-binding tables are prepared: the compile step knows all
    /// identifiers up front and assigns them the low slot range.
    pub fn with_names<I, S>(names: I) -> Rc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = Self::new();
        for (slot, name) in names.into_iter().enumerate() {
            table.add(&name.into(), slot as u32);
        }
        Rc::new(table)
    }

    /// Slot for `name`, if one has been allocated
    pub fn slot_of(&self, name: &str) -> Option<u32> {
        self.slots.borrow().get(name).copied()
    }

    /// Record `name` at `slot`.
    ///
    /// New slots are always `len()`, so allocation is table-global and every
    /// context sharing one table stays index-compatible.
    pub fn add(&self, name: &str, slot: u32) {
        let previous = self.slots.borrow_mut().insert(name.to_string(), slot);
        debug_assert!(previous.is_none(), "slot for {name:?} assigned twice");
    }

    /// Number of allocated slots
    pub fn len(&self) -> u32 {
        self.slots.borrow().len() as u32
    }

    /// True when no slot has been allocated
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}
