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

//! User-facing context handle
//!
//! [`Context`] wraps a context node; handles are cheap to clone and all
//! clones refer to the same node. Creating a context links it into the tree;
//! destroying it invalidates, but does not destroy, everything that depended
//! on it.
//!
//! ```
//! use canopy_context::{Context, Engine};
//!
//! let engine = Engine::new();
//! let context = Context::new(&engine);
//! context.set_property("answer", 42i64);
//!
//! let child = Context::with_parent(&context);
//! assert_eq!(child.property("answer").and_then(|v| v.as_integer()), Some(42));
//! ```

use crate::engine::Engine;
use crate::error::ContextResult;
use crate::names::NameSlotTable;
use crate::node::{ContextData, ContextRef};
use canopy_model::{ObjectHandle, Value};
use std::rc::{Rc, Weak};
use url::Url;

/// A named-property scope node in the resolution tree.
///
/// The creator of a context owns it and is responsible for eventually
/// calling [`destroy`](Self::destroy); the tree itself holds only non-owning
/// links. Contexts created by the engine for its own bookkeeping are
/// engine-internal and reject external mutation.
#[derive(Clone)]
pub struct Context {
    data: ContextRef,
}

impl Context {
    /// Create a context as a child of the engine's root context
    pub fn new(engine: &Engine) -> Self {
        Self::with_parent(&engine.root())
    }

    /// Create a context as a child of `parent`
    pub fn with_parent(parent: &Context) -> Self {
        Self {
            data: ContextData::new_child(&parent.data),
        }
    }

    pub(crate) fn from_ref(data: ContextRef) -> Self {
        Self { data }
    }

    pub(crate) fn data(&self) -> &ContextRef {
        &self.data
    }

    /// The context's engine, or `None` if the context has been
    /// engine-detached or the engine was dropped
    pub fn engine(&self) -> Option<Engine> {
        let inner = self
            .data
            .borrow()
            .engine
            .as_ref()
            .and_then(Weak::upgrade)?;
        Some(Engine::from_inner(inner))
    }

    /// The parent context, or `None` for the root or a detached context
    pub fn parent(&self) -> Option<Context> {
        ContextData::parent(&self.data).map(Context::from_ref)
    }

    /// Live children of this context
    pub fn children(&self) -> Vec<Context> {
        ContextData::children(&self.data)
            .into_iter()
            .map(Context::from_ref)
            .collect()
    }

    /// Whether this context has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.data.borrow().destroyed
    }

    /// Whether this is an engine-internal bookkeeping context
    pub fn is_internal(&self) -> bool {
        self.data.borrow().is_internal
    }

    /// Set the `name` property on this context.
    ///
    /// Ignored with a diagnostic on engine-internal contexts. Values the
    /// engine can coerce to an object reference are stored as objects.
    pub fn set_property(&self, name: &str, value: impl Into<Value>) {
        ContextData::set_property(&self.data, name, value.into());
    }

    /// Set the `name` property to an object reference. The context does not
    /// take ownership of the object.
    pub fn set_object_property(&self, name: &str, object: &ObjectHandle) {
        ContextData::set_object_property(&self.data, name, Rc::clone(object));
    }

    /// Resolve `name` against this context and its ancestors
    pub fn property(&self, name: &str) -> Option<Value> {
        ContextData::resolve(&self.data, name)
    }

    /// Append a default object whose fields resolve as implicit properties
    /// of this context
    pub fn add_default_object(&self, object: &ObjectHandle) {
        ContextData::add_default_object(&self.data, object);
    }

    /// Detach a previously added default object
    pub fn remove_default_object(&self, object: &ObjectHandle) -> bool {
        ContextData::remove_default_object(&self.data, object)
    }

    /// Install the prepared id-binding name table (at most once)
    pub fn install_id_bindings(&self, table: &Rc<NameSlotTable>) {
        ContextData::install_id_bindings(&self.data, Rc::clone(table));
    }

    /// Bind the object for one id slot
    pub fn set_id_binding(&self, index: usize, object: &ObjectHandle) {
        ContextData::set_id_binding(&self.data, index, object);
    }

    /// Base URL: nearest ancestor-or-self with one explicitly set
    pub fn base_url(&self) -> Option<Url> {
        ContextData::base_url(&self.data)
    }

    /// Override the base URL used by [`resolved_url`](Self::resolved_url)
    pub fn set_base_url(&self, url: Url) {
        ContextData::set_base_url(&self.data, url);
    }

    /// Resolve `reference` relative to the nearest base URL on the chain,
    /// defaulting to the engine's base
    pub fn resolved_url(&self, reference: &str) -> ContextResult<Url> {
        ContextData::resolved_url(&self.data, reference)
    }

    /// Destroy this context.
    ///
    /// Every expression and guard that referenced it is invalidated, not
    /// destroyed. Externally-owned descendants are engine-detached and
    /// unparented but keep their own values and subtrees; parent-owned
    /// children are destroyed along with this node.
    pub fn destroy(&self) {
        ContextData::destroy(&self.data);
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Context")
            .field("internal", &data.is_internal)
            .field("destroyed", &data.destroyed)
            .field("properties", &data.property_values.len())
            .field("default_objects", &data.default_objects.len())
            .finish()
    }
}
