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

//! Canopy: a hierarchical declarative context system
//!
//! Contexts expose data to declaratively instantiated components: each
//! context holds a set of named properties and optional default objects,
//! and components resolve names by walking from their own context toward
//! the engine root. Data at a context overrides data at its ancestors.
//!
//! ```
//! use canopy::{Context, Engine};
//!
//! let engine = Engine::new();
//! engine.root().set_property("appName", "demo");
//!
//! let context = Context::new(&engine);
//! context.set_property("page", 3i64);
//!
//! assert_eq!(context.property("appName").and_then(|v| v.as_str().map(String::from)),
//!            Some("demo".to_string()));
//! assert_eq!(context.property("page").and_then(|v| v.as_integer()), Some(3));
//! ```

// Import workspace crates
pub use canopy_context as context;
pub use canopy_diagnostics as diagnostics;
pub use canopy_model as model;

// Primary surface
pub use canopy_context::{
    BoundExpression, Context, ContextError, ContextGuard, ContextResult, Engine, NameSlotTable,
    ObjectCoercion, ValueWatch,
};
pub use canopy_diagnostics::{
    Diagnostic, DiagnosticBuilder, DiagnosticCode, DiagnosticReporter, Severity,
};
pub use canopy_model::{FieldObject, ObjectGuard, ObjectHandle, StructuredObject, Value};
