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

//! Structured objects and weak object handles
//!
//! A [`StructuredObject`] is an externally-owned object with readable named
//! fields. Contexts expose such objects two ways: as object-reference
//! property values, and as "default objects" whose fields resolve as implicit
//! context properties. The context never owns the object; ownership stays
//! with the embedder.

use crate::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// An externally-owned object with readable named fields.
///
/// Field reads are live: resolution never caches the returned value, so a
/// mutation on the object is visible to the next lookup.
pub trait StructuredObject: std::fmt::Debug {
    /// Type name of the object, for diagnostics
    fn type_name(&self) -> &str;

    /// Read the current value of a named field, or `None` if the object has
    /// no such field
    fn read_field(&self, name: &str) -> Option<Value>;

    /// Whether the object exposes a readable field with this name
    fn has_field(&self, name: &str) -> bool {
        self.read_field(name).is_some()
    }
}

/// Shared handle to a structured object. The holder of the last clone owns
/// the object; contexts only ever hold these through guards or as
/// caller-provided references.
pub type ObjectHandle = Rc<dyn StructuredObject>;

/// Weak, self-invalidating handle to a structured object.
///
/// When the owning side drops the object, every guard pointing at it reads
/// as invalid. Checking validity is an O(1) upgrade test; a guard never
/// dereferences a freed object.
#[derive(Clone, Default)]
pub struct ObjectGuard {
    target: Option<Weak<dyn StructuredObject>>,
}

impl ObjectGuard {
    /// Guard the given object without taking ownership
    pub fn new(target: &ObjectHandle) -> Self {
        Self {
            target: Some(Rc::downgrade(target)),
        }
    }

    /// A guard that was never bound to anything
    pub fn empty() -> Self {
        Self { target: None }
    }

    /// The guarded object, if it is still alive
    pub fn get(&self) -> Option<ObjectHandle> {
        self.target.as_ref().and_then(Weak::upgrade)
    }

    /// Whether the guarded object is still alive
    pub fn is_valid(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Drop the target reference, leaving the guard permanently invalid
    pub fn clear(&mut self) {
        self.target = None;
    }
}

impl std::fmt::Debug for ObjectGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectGuard")
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// A map-backed structured object.
///
/// Embedders can use this directly for ad-hoc data sets; it is also the
/// standard test double throughout the workspace. Fields live behind a
/// `RefCell` so tests can mutate them after the object has been attached to a
/// context and observe the live-read behavior.
#[derive(Debug)]
pub struct FieldObject {
    type_name: String,
    fields: RefCell<FxHashMap<String, Value>>,
}

impl FieldObject {
    /// Create an empty object with the given type name
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: RefCell::new(FxHashMap::default()),
        }
    }

    /// Builder-style field insertion
    pub fn with_field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.borrow_mut().insert(name.into(), value.into());
        self
    }

    /// Insert or overwrite a field
    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.borrow_mut().insert(name.into(), value.into());
    }

    /// Remove a field, returning its previous value
    pub fn remove_field(&self, name: &str) -> Option<Value> {
        self.fields.borrow_mut().remove(name)
    }

    /// Wrap into a shared object handle
    pub fn into_handle(self) -> ObjectHandle {
        Rc::new(self)
    }
}

impl StructuredObject for FieldObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn read_field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.borrow().contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_reads_are_live() {
        let obj = FieldObject::new("DataSet").with_field("count", 1i64);
        assert_eq!(obj.read_field("count"), Some(Value::Integer(1)));

        obj.set_field("count", 2i64);
        assert_eq!(obj.read_field("count"), Some(Value::Integer(2)));

        obj.remove_field("count");
        assert_eq!(obj.read_field("count"), None);
        assert!(!obj.has_field("count"));
    }

    #[test]
    fn guard_goes_invalid_when_object_dropped() {
        let handle = FieldObject::new("DataSet").into_handle();
        let guard = ObjectGuard::new(&handle);
        assert!(guard.is_valid());
        assert!(guard.get().is_some());

        drop(handle);
        assert!(!guard.is_valid());
        assert!(guard.get().is_none());
        // Repeated reads after death stay safe
        assert!(guard.get().is_none());
    }

    #[test]
    fn empty_guard_is_invalid() {
        let guard = ObjectGuard::empty();
        assert!(!guard.is_valid());
        assert!(guard.get().is_none());
    }
}
