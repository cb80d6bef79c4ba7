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

//! Hierarchical declarative context tree
//!
//! A tree of scopes that supplies named values to bound expressions. Name
//! lookups walk ancestor scopes with deterministic override rules (own
//! explicit properties and id bindings, then own default objects, then the
//! parent chain); structural edits propagate top-down through per-context
//! expression registries so dependents drop cached resolution shortcuts,
//! while plain value overwrites only fire a per-slot notification.
//!
//! The tree is single-threaded and synchronous: every operation runs to
//! completion on the engine's thread, and nothing here takes a lock.

mod engine;
mod error;
mod expression;
mod facade;
mod guard;
mod names;
mod node;

pub use engine::{Engine, ObjectCoercion};
pub use error::{ContextError, ContextResult};
pub use expression::{BoundExpression, ValueWatch};
pub use facade::Context;
pub use guard::ContextGuard;
pub use names::NameSlotTable;
pub use node::{ContextData, ContextRef, WeakContext};

// Re-export the model surface the public API is expressed in
pub use canopy_model::{FieldObject, ObjectGuard, ObjectHandle, StructuredObject, Value};
