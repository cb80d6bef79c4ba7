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

//! Value model for the canopy context system
//!
//! This crate defines the values a context can hold and the
//! [`StructuredObject`] abstraction for externally-owned objects whose fields
//! are exposed as implicit context properties.

pub mod object;
pub mod value;

pub use object::{FieldObject, ObjectGuard, ObjectHandle, StructuredObject};
pub use value::Value;
