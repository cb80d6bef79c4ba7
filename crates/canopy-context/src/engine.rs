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

//! Engine handle
//!
//! The engine owns the root context, carries the process-wide base URL, the
//! diagnostic reporter, and the object-coercion capability consumed by
//! property sets. Context nodes hold a weak engine reference copied once at
//! attach time; after a destroy cascade or engine teardown that reference
//! reads as absent and the node stops receiving engine services.

use crate::facade::Context;
use crate::node::{ContextData, ContextRef};
use canopy_diagnostics::{Diagnostic, DiagnosticReporter, DiagnosticSummary};
use canopy_model::{ObjectHandle, Value};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::debug;
use url::Url;

/// Weak engine reference stored in context nodes
pub(crate) type EngineRef = Weak<EngineInner>;

/// Converts arbitrary values to object references where possible.
///
/// Consumed by `set_property` to normalize inputs: a value the active engine
/// can coerce is stored through the object-reference path, so client code
/// consistently sees live objects.
pub trait ObjectCoercion {
    /// The object behind `value`, or `None` when the value is not
    /// object-like for this engine
    fn to_object_if_possible(&self, value: &Value) -> Option<ObjectHandle>;
}

pub(crate) struct EngineInner {
    base_url: RefCell<Option<Url>>,
    coercer: RefCell<Option<Box<dyn ObjectCoercion>>>,
    reporter: RefCell<DiagnosticReporter>,
    root: ContextRef,
}

impl EngineInner {
    pub(crate) fn coerce(&self, value: &Value) -> Option<ObjectHandle> {
        self.coercer
            .borrow()
            .as_ref()
            .and_then(|coercer| coercer.to_object_if_possible(value))
    }

    pub(crate) fn report(&self, diagnostic: Diagnostic) {
        self.reporter.borrow_mut().report(diagnostic);
    }

    pub(crate) fn base_url(&self) -> Option<Url> {
        self.base_url.borrow().clone()
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        ContextData::destroy(&self.root);
    }
}

/// Handle to a context engine.
///
/// Cheap to clone; all clones refer to the same engine. Dropping the last
/// handle destroys the root context, tombstoning every expression and guard
/// that depended on it.
#[derive(Clone)]
pub struct Engine {
    inner: Rc<EngineInner>,
}

impl Engine {
    /// Create an engine with a fresh root context
    pub fn new() -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<EngineInner>| EngineInner {
            base_url: RefCell::new(None),
            coercer: RefCell::new(None),
            reporter: RefCell::new(DiagnosticReporter::new()),
            root: ContextData::new_root(weak.clone()),
        });
        debug!(target: "canopy::engine", "engine created");
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Rc<EngineInner>) -> Self {
        Self { inner }
    }

    /// The engine-owned root context. Data that should be visible to every
    /// context belongs here.
    pub fn root(&self) -> Context {
        Context::from_ref(Rc::clone(&self.inner.root))
    }

    /// Create an engine-internal bookkeeping context under `parent`.
    ///
    /// Internal contexts reject external property mutation and are owned by
    /// their parent: destroying the parent destroys them.
    pub fn create_internal_context(&self, parent: &Context) -> Context {
        Context::from_ref(ContextData::new_owned_child(parent.data(), true))
    }

    /// The engine's base URL, used as the fallback for relative reference
    /// resolution when no context on the chain sets one
    pub fn base_url(&self) -> Option<Url> {
        self.inner.base_url()
    }

    /// Set the engine's base URL
    pub fn set_base_url(&self, url: Url) {
        *self.inner.base_url.borrow_mut() = Some(url);
    }

    /// Install the object-coercion capability
    pub fn set_object_coercion(&self, coercer: Box<dyn ObjectCoercion>) {
        *self.inner.coercer.borrow_mut() = Some(coercer);
    }

    /// Drain all collected diagnostics
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.reporter.borrow_mut().take()
    }

    /// Summary of the currently collected diagnostics
    pub fn diagnostic_summary(&self) -> DiagnosticSummary {
        self.inner.reporter.borrow().summary()
    }

    /// Whether any diagnostic is pending
    pub fn has_diagnostics(&self) -> bool {
        !self.inner.reporter.borrow().is_empty()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Engine {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("base_url", &self.inner.base_url())
            .finish()
    }
}
