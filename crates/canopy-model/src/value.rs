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

//! Context value types
//!
//! This module defines the tagged value type stored in explicit context
//! properties and returned from name resolution.

use crate::object::ObjectHandle;
use rust_decimal::Decimal;
use std::rc::Rc;

/// A value held by a context property or produced by name resolution.
///
/// Scalars are stored directly; object references and object lists point at
/// externally-owned [`StructuredObject`](crate::StructuredObject)s which the
/// context never owns.
#[derive(Debug, Clone)]
pub enum Value {
    /// Boolean value
    Boolean(bool),

    /// Integer value (64-bit signed)
    Integer(i64),

    /// Decimal value with arbitrary precision
    Decimal(Decimal),

    /// String value
    String(String),

    /// Raw JSON payload for structured data without object identity
    Json(serde_json::Value),

    /// Reference to an externally-owned structured object
    Object(ObjectHandle),

    /// Ordered list of object references
    ObjectList(Vec<ObjectHandle>),

    /// Absent value
    Empty,
}

impl Value {
    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Decimal(_) => "Decimal",
            Value::String(_) => "String",
            Value::Json(_) => "Json",
            Value::Object(_) => "Object",
            Value::ObjectList(_) => "ObjectList",
            Value::Empty => "Empty",
        }
    }

    /// True for `Value::Empty`
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// True for object references and object lists
    pub fn is_object_like(&self) -> bool {
        matches!(self, Value::Object(_) | Value::ObjectList(_))
    }

    /// Borrow the object handle if this is an object reference
    pub fn as_object(&self) -> Option<&ObjectHandle> {
        match self {
            Value::Object(handle) => Some(handle),
            _ => None,
        }
    }

    /// Number of elements if this is an object list, otherwise 0
    pub fn list_len(&self) -> usize {
        match self {
            Value::ObjectList(items) => items.len(),
            _ => 0,
        }
    }

    /// Element at `index` if this is an object list
    pub fn list_at(&self, index: usize) -> Option<ObjectHandle> {
        match self {
            Value::ObjectList(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    /// Borrow the string if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value, if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean value, if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            // Object identity, not structural comparison
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::ObjectList(a), Value::ObjectList(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| Rc::ptr_eq(x, y))
            }
            (Value::Empty, Value::Empty) => true,
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Empty
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}

impl From<ObjectHandle> for Value {
    fn from(value: ObjectHandle) -> Self {
        Value::Object(value)
    }
}

impl From<Vec<ObjectHandle>> for Value {
    fn from(value: Vec<ObjectHandle>) -> Self {
        Value::ObjectList(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::FieldObject;
    use pretty_assertions::assert_eq;

    #[test]
    fn type_names() {
        assert_eq!(Value::from(true).type_name(), "Boolean");
        assert_eq!(Value::from(42i64).type_name(), "Integer");
        assert_eq!(Value::from("hi").type_name(), "String");
        assert_eq!(Value::Empty.type_name(), "Empty");
    }

    #[test]
    fn object_equality_is_identity() {
        let a: ObjectHandle = FieldObject::new("Thing").into_handle();
        let b: ObjectHandle = FieldObject::new("Thing").into_handle();

        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert!(Value::Object(a) != Value::Object(b));
    }

    #[test]
    fn object_values_are_debug_printable() {
        let handle: ObjectHandle = FieldObject::new("Thing").into_handle();
        let rendered = format!("{:?}", Value::Object(handle.clone()));
        assert!(rendered.contains("Thing"));

        let rendered = format!("{:?}", Value::ObjectList(vec![handle]));
        assert!(rendered.contains("Thing"));
    }

    #[test]
    fn list_access() {
        let a: ObjectHandle = FieldObject::new("A").into_handle();
        let b: ObjectHandle = FieldObject::new("B").into_handle();
        let list = Value::ObjectList(vec![a.clone(), b]);

        assert_eq!(list.list_len(), 2);
        assert!(Rc::ptr_eq(&list.list_at(0).unwrap(), &a));
        assert!(list.list_at(2).is_none());
        assert_eq!(Value::from(1i64).list_len(), 0);
    }
}
