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

//! Context tree nodes
//!
//! The core data structure: a tree of property scopes. Each node holds
//! explicit property values, an ordered list of default objects whose fields
//! resolve as implicit properties, a fixed array of id-binding guards, and
//! weak links to parent and siblings so attach/detach never scans a child
//! list. Nodes are owned by whoever created them; the tree itself only holds
//! non-owning links, except for children explicitly created on the
//! parent-owned path.
//!
//! Name resolution walks from a node toward the root: own explicit/id slots
//! win over own default objects, and anything at a node wins over everything
//! at its ancestors.

use crate::engine::EngineRef;
use crate::error::{ContextError, ContextResult};
use crate::expression::{ExpressionCore, ValueWatchCore};
use crate::names::NameSlotTable;
use canopy_diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticCode};
use canopy_model::{ObjectGuard, ObjectHandle, StructuredObject, Value};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::debug;
use url::Url;

/// Storage form of an explicit property value.
///
/// Object references are stored as guards: the context never owns the
/// object, and a reference whose object has been dropped reads back as
/// `Empty` instead of dangling.
pub(crate) enum PropertySlot {
    /// Slot allocated through the shared table by another context, never
    /// set here; resolution falls through it
    Vacant,
    Plain(Value),
    Object(ObjectGuard),
    ObjectList(Vec<ObjectGuard>),
}

impl PropertySlot {
    fn store(value: Value) -> Self {
        match value {
            Value::Object(handle) => PropertySlot::Object(ObjectGuard::new(&handle)),
            Value::ObjectList(handles) => PropertySlot::ObjectList(
                handles.iter().map(ObjectGuard::new).collect(),
            ),
            other => PropertySlot::Plain(other),
        }
    }

    fn is_set(&self) -> bool {
        !matches!(self, PropertySlot::Vacant)
    }

    fn read(&self) -> Value {
        match self {
            PropertySlot::Vacant => Value::Empty,
            PropertySlot::Plain(value) => value.clone(),
            PropertySlot::Object(guard) => match guard.get() {
                Some(handle) => Value::Object(handle),
                None => Value::Empty,
            },
            PropertySlot::ObjectList(guards) => {
                Value::ObjectList(guards.iter().filter_map(ObjectGuard::get).collect())
            }
        }
    }
}

/// Shared handle to a context node. The holder of the last clone owns the
/// node's storage; destruction is still explicit via [`ContextData::destroy`].
pub type ContextRef = Rc<RefCell<ContextData>>;

/// Non-owning handle to a context node
pub type WeakContext = Weak<RefCell<ContextData>>;

/// A single scope node in the context tree.
///
/// Public access goes through [`Context`](crate::Context); this type carries
/// the tree structure and the resolution state.
pub struct ContextData {
    pub(crate) engine: Option<EngineRef>,
    pub(crate) parent: WeakContext,
    pub(crate) first_child: WeakContext,
    pub(crate) next_sibling: WeakContext,
    pub(crate) prev_sibling: WeakContext,
    /// Children created on the parent-owned path; destroyed with this node
    pub(crate) owned_children: Vec<ContextRef>,
    pub(crate) is_internal: bool,
    pub(crate) owned_by_parent: bool,
    pub(crate) destroyed: bool,
    /// Shared name-to-slot index; released on destroy
    pub(crate) names: Option<Rc<NameSlotTable>>,
    /// Explicit property values, dense from slot `id_count` upward
    pub(crate) property_values: Vec<PropertySlot>,
    /// Fixed id-binding guard array, sized once at installation
    pub(crate) id_guards: Box<[ObjectGuard]>,
    /// Default objects in insertion order, never owned; first-added wins
    pub(crate) default_objects: SmallVec<[Weak<dyn StructuredObject>; 1]>,
    pub(crate) base_url: Option<Url>,
    pub(crate) expressions: Vec<Weak<RefCell<ExpressionCore>>>,
    pub(crate) watchers: Vec<Weak<RefCell<ValueWatchCore>>>,
}

enum StoreOutcome {
    Refresh,
    Notify(u32),
    IdSlot,
}

impl ContextData {
    fn empty(engine: Option<EngineRef>, is_internal: bool) -> Self {
        Self {
            engine,
            parent: WeakContext::new(),
            first_child: WeakContext::new(),
            next_sibling: WeakContext::new(),
            prev_sibling: WeakContext::new(),
            owned_children: Vec::new(),
            is_internal,
            owned_by_parent: false,
            destroyed: false,
            names: None,
            property_values: Vec::new(),
            id_guards: Box::default(),
            default_objects: SmallVec::new(),
            base_url: None,
            expressions: Vec::new(),
            watchers: Vec::new(),
        }
    }

    /// Allocate the engine root node (no parent)
    pub(crate) fn new_root(engine: EngineRef) -> ContextRef {
        Rc::new(RefCell::new(Self::empty(Some(engine), false)))
    }

    /// Allocate an externally-owned child of `parent`
    pub fn new_child(parent: &ContextRef) -> ContextRef {
        let node = Rc::new(RefCell::new(Self::empty(None, false)));
        Self::set_parent(&node, parent);
        node
    }

    /// Allocate a parent-owned child. The parent keeps a strong reference
    /// and destroys the child during its own destruction.
    pub(crate) fn new_owned_child(parent: &ContextRef, is_internal: bool) -> ContextRef {
        let node = Rc::new(RefCell::new(Self::empty(None, is_internal)));
        node.borrow_mut().owned_by_parent = true;
        Self::set_parent(&node, parent);
        parent.borrow_mut().owned_children.push(Rc::clone(&node));
        node
    }

    /// Link `node` at the head of `parent`'s child list. The engine
    /// reference is copied once here and never re-derived later.
    pub(crate) fn set_parent(node: &ContextRef, parent: &ContextRef) {
        let (engine, old_first) = {
            let p = parent.borrow();
            (p.engine.clone(), p.first_child.clone())
        };
        {
            let mut data = node.borrow_mut();
            debug_assert!(
                data.parent.upgrade().is_none(),
                "context already has a parent"
            );
            data.parent = Rc::downgrade(parent);
            data.engine = engine;
            data.next_sibling = old_first.clone();
            data.prev_sibling = WeakContext::new();
        }
        if let Some(first) = old_first.upgrade() {
            first.borrow_mut().prev_sibling = Rc::downgrade(node);
        }
        parent.borrow_mut().first_child = Rc::downgrade(node);
    }

    /// Splice `node` out of its parent's child list in O(1)
    pub(crate) fn unlink(node: &ContextRef) {
        let (parent, prev, next) = {
            let data = node.borrow();
            (
                data.parent.clone(),
                data.prev_sibling.clone(),
                data.next_sibling.clone(),
            )
        };
        if let Some(prev) = prev.upgrade() {
            prev.borrow_mut().next_sibling = next.clone();
        } else if let Some(parent) = parent.upgrade() {
            // No live previous sibling means this node heads the list
            parent.borrow_mut().first_child = next.clone();
        }
        if let Some(next) = next.upgrade() {
            next.borrow_mut().prev_sibling = prev;
        }
        let mut data = node.borrow_mut();
        data.parent = WeakContext::new();
        data.prev_sibling = WeakContext::new();
        data.next_sibling = WeakContext::new();
    }

    /// Snapshot of the live children, oldest link last
    pub fn children(node: &ContextRef) -> Vec<ContextRef> {
        let mut out = Vec::new();
        let mut cursor = node.borrow().first_child.upgrade();
        while let Some(child) = cursor {
            cursor = child.borrow().next_sibling.upgrade();
            out.push(child);
        }
        out
    }

    /// Parent node, if attached and alive
    pub fn parent(node: &ContextRef) -> Option<ContextRef> {
        node.borrow().parent.upgrade()
    }

    /// Destroy this node: engine-detach and unparent descendants, unlink
    /// self, tombstone registered expressions and id-binding guards, release
    /// the shared name table, and destroy parent-owned children.
    ///
    /// Externally-owned descendants keep their values and their links to
    /// each other; only their engine reference and their link to this node
    /// are cleared.
    pub fn destroy(node: &ContextRef) {
        if node.borrow().destroyed {
            debug_assert!(false, "context destroyed twice");
            return;
        }
        debug!(target: "canopy::context", "destroying context");

        // Engine-detach all descendants, then unparent the direct children.
        let children = Self::children(node);
        for child in &children {
            Self::invalidate_engines(child);
            let mut data = child.borrow_mut();
            data.parent = WeakContext::new();
            data.prev_sibling = WeakContext::new();
            data.next_sibling = WeakContext::new();
        }

        Self::unlink(node);

        let owned = {
            let mut data = node.borrow_mut();
            data.destroyed = true;
            data.engine = None;
            data.first_child = WeakContext::new();
            for entry in data.expressions.drain(..) {
                if let Some(core) = entry.upgrade() {
                    core.borrow_mut().tombstone();
                }
            }
            for entry in data.watchers.drain(..) {
                if let Some(core) = entry.upgrade() {
                    core.borrow_mut().tombstone();
                }
            }
            for guard in data.id_guards.iter_mut() {
                guard.clear();
            }
            data.id_guards = Box::default();
            data.default_objects.clear();
            data.property_values.clear();
            data.names = None;
            std::mem::take(&mut data.owned_children)
        };
        for child in owned {
            if !child.borrow().destroyed {
                Self::destroy(&child);
            }
        }
    }

    /// Clear the engine reference on this node and every descendant. The
    /// tree shape and all values stay intact for code still holding
    /// references; the nodes simply stop receiving engine services.
    pub(crate) fn invalidate_engines(node: &ContextRef) {
        {
            let mut data = node.borrow_mut();
            if data.engine.is_none() {
                return;
            }
            data.engine = None;
        }
        for child in Self::children(node) {
            Self::invalidate_engines(&child);
        }
    }

    /// Refresh every expression registered on this node and its descendants,
    /// parent strictly before children.
    ///
    /// Refreshing does not recompute values; it invalidates cached
    /// resolution-path shortcuts so the next evaluation re-walks the chain.
    /// Runs on every change to the shape of name resolution (new slot,
    /// default-object attach/detach, re-parenting) and never on a same-slot
    /// value overwrite.
    pub fn refresh_expressions(node: &ContextRef) {
        let live: Vec<_> = {
            let mut data = node.borrow_mut();
            data.expressions.retain(|entry| entry.strong_count() > 0);
            data.expressions.clone()
        };
        for entry in live {
            if let Some(core) = entry.upgrade() {
                core.borrow_mut().refresh();
            }
        }
        for child in Self::children(node) {
            Self::refresh_expressions(&child);
        }
    }

    /// Resolve `name` against this node and its ancestors.
    ///
    /// Own explicit/id slots take precedence over own default objects, and a
    /// node's own resolution always wins over any ancestor's, regardless of
    /// category. Reaching the root without a match is not an error.
    pub fn resolve(node: &ContextRef, name: &str) -> Option<Value> {
        let mut current = Rc::clone(node);
        loop {
            let next = {
                let data = current.borrow();
                if let Some(value) = Self::resolve_local(&data, name) {
                    return Some(value);
                }
                data.parent.upgrade()
            };
            current = next?;
        }
    }

    fn resolve_local(data: &ContextData, name: &str) -> Option<Value> {
        if let Some(names) = &data.names {
            if let Some(slot) = names.slot_of(name) {
                let id_count = data.id_guards.len() as u32;
                if slot < id_count {
                    // Id-bound objects are read-only; a dead guard still
                    // counts as found, its object is just gone.
                    return Some(match data.id_guards[slot as usize].get() {
                        Some(object) => Value::Object(object),
                        None => Value::Empty,
                    });
                }
                let index = (slot - id_count) as usize;
                match data.property_values.get(index) {
                    Some(slot_value) if slot_value.is_set() => {
                        return Some(slot_value.read());
                    }
                    // Slot allocated by a clone sharing this table; not set
                    // here, so the lookup falls through.
                    _ => {}
                }
            }
        }
        data.default_objects
            .iter()
            .filter_map(Weak::upgrade)
            .find_map(|object| object.read_field(name))
    }

    /// Set the `name` property to `value`.
    ///
    /// Values the engine can coerce to an object reference are stored
    /// through the object path, so clients consistently observe live
    /// objects where possible. The first set of a name allocates a slot and
    /// triggers a structural refresh; overwrites only fire a value-changed
    /// notification for the slot.
    pub fn set_property(node: &ContextRef, name: &str, value: Value) {
        if Self::reject_internal(node, name) {
            return;
        }
        let coerced = match &value {
            Value::Object(handle) => Some(Rc::clone(handle)),
            other => {
                let engine = node.borrow().engine.clone();
                engine
                    .as_ref()
                    .and_then(Weak::upgrade)
                    .and_then(|inner| inner.coerce(other))
            }
        };
        match coerced {
            Some(object) => Self::store_property(node, name, Value::Object(object)),
            None => Self::store_property(node, name, value),
        }
    }

    /// Set the `name` property to an object reference. The context does not
    /// take ownership of the object.
    pub fn set_object_property(node: &ContextRef, name: &str, object: ObjectHandle) {
        if Self::reject_internal(node, name) {
            return;
        }
        Self::store_property(node, name, Value::Object(object));
    }

    fn store_property(node: &ContextRef, name: &str, value: Value) {
        let outcome = {
            let mut data = node.borrow_mut();
            let names = Rc::clone(
                data.names
                    .get_or_insert_with(|| Rc::new(NameSlotTable::new())),
            );
            let id_count = data.id_guards.len() as u32;
            match names.slot_of(name) {
                None => {
                    // Slots are allocated table-globally so every context
                    // sharing this table stays index-compatible.
                    let slot = names.len();
                    names.add(name, slot);
                    Self::fill_slot(&mut data, (slot - id_count) as usize, value);
                    StoreOutcome::Refresh
                }
                Some(slot) if slot < id_count => StoreOutcome::IdSlot,
                Some(slot) => {
                    let index = (slot - id_count) as usize;
                    let occupied = data
                        .property_values
                        .get(index)
                        .is_some_and(PropertySlot::is_set);
                    if occupied {
                        data.property_values[index] = PropertySlot::store(value);
                        StoreOutcome::Notify(slot)
                    } else {
                        // Slot pre-allocated by a clone sharing this table;
                        // the first local fill changes what this context and
                        // its descendants resolve.
                        Self::fill_slot(&mut data, index, value);
                        StoreOutcome::Refresh
                    }
                }
            }
        };
        match outcome {
            StoreOutcome::Refresh => Self::refresh_expressions(node),
            StoreOutcome::Notify(slot) => Self::notify_value_changed(node, slot),
            StoreOutcome::IdSlot => Self::report(
                node,
                DiagnosticBuilder::warning(DiagnosticCode::IdBindingSlotWrite)
                    .with_message(format!("property {name:?} is a read-only id binding"))
                    .build(),
            ),
        }
    }

    fn fill_slot(data: &mut ContextData, index: usize, value: Value) {
        if index >= data.property_values.len() {
            data.property_values
                .resize_with(index + 1, || PropertySlot::Vacant);
        }
        data.property_values[index] = PropertySlot::store(value);
    }

    fn notify_value_changed(node: &ContextRef, slot: u32) {
        let live: Vec<_> = {
            let mut data = node.borrow_mut();
            data.watchers.retain(|entry| entry.strong_count() > 0);
            data.watchers.clone()
        };
        for entry in live {
            if let Some(core) = entry.upgrade() {
                let mut core = core.borrow_mut();
                if core.slot == slot {
                    core.value_changed();
                }
            }
        }
    }

    /// Append a default object. Its fields become implicit properties of
    /// this context, below explicit properties and id bindings but above
    /// everything at ancestor contexts. First-added objects win over
    /// later-added ones.
    pub fn add_default_object(node: &ContextRef, object: &ObjectHandle) {
        {
            let data = node.borrow();
            debug_assert!(!data.destroyed, "mutating a destroyed context");
            if data.is_internal {
                Self::report_borrowed(
                    &data,
                    DiagnosticBuilder::warning(DiagnosticCode::InternalContextDefaultObject)
                        .with_message("cannot set a default object on an engine-internal context")
                        .build(),
                );
                return;
            }
        }
        node.borrow_mut()
            .default_objects
            .push(Rc::downgrade(object));
        Self::refresh_expressions(node);
    }

    /// Detach a previously added default object. Returns whether the object
    /// was attached.
    pub fn remove_default_object(node: &ContextRef, object: &ObjectHandle) -> bool {
        let target = Rc::downgrade(object);
        let removed = {
            let mut data = node.borrow_mut();
            let had = data.default_objects.iter().any(|entry| entry.ptr_eq(&target));
            // Dead entries from dropped objects are swept on the way through
            data.default_objects
                .retain(|entry| entry.strong_count() > 0 && !entry.ptr_eq(&target));
            had
        };
        if removed {
            Self::refresh_expressions(node);
        }
        removed
    }

    /// Adopt a prepared name table whose slots are all id bindings, and
    /// allocate the fixed guard array. Installed at most once per context,
    /// before any explicit property is set.
    pub fn install_id_bindings(node: &ContextRef, table: Rc<NameSlotTable>) {
        let installed = {
            let mut data = node.borrow_mut();
            if data.names.is_some() {
                false
            } else {
                let count = table.len() as usize;
                data.names = Some(table);
                data.id_guards = vec![ObjectGuard::empty(); count].into_boxed_slice();
                true
            }
        };
        if !installed {
            Self::report(
                node,
                DiagnosticBuilder::warning(DiagnosticCode::IdBindingsAlreadyInstalled)
                    .with_message("id bindings can only be installed once per context")
                    .build(),
            );
        }
    }

    /// Bind the object for one id slot. Populated at most once per slot by
    /// the instantiation machinery; the guard keeps the reference weak.
    pub fn set_id_binding(node: &ContextRef, index: usize, object: &ObjectHandle) {
        let in_range = {
            let mut data = node.borrow_mut();
            if index < data.id_guards.len() {
                debug_assert!(
                    !data.id_guards[index].is_valid(),
                    "id slot {index} already bound"
                );
                data.id_guards[index] = ObjectGuard::new(object);
                true
            } else {
                false
            }
        };
        if !in_range {
            Self::report(
                node,
                DiagnosticBuilder::warning(DiagnosticCode::IdBindingIndexOutOfRange)
                    .with_message(format!("id slot {index} is outside the installed range"))
                    .build(),
            );
        }
    }

    /// Base URL of this context: the nearest ancestor-or-self with one
    /// explicitly set.
    pub fn base_url(node: &ContextRef) -> Option<Url> {
        let mut current = Rc::clone(node);
        loop {
            let next = {
                let data = current.borrow();
                if let Some(url) = &data.base_url {
                    return Some(url.clone());
                }
                data.parent.upgrade()
            };
            current = next?;
        }
    }

    /// Override the base URL used for relative reference resolution
    pub fn set_base_url(node: &ContextRef, url: Url) {
        node.borrow_mut().base_url = Some(url);
    }

    /// Resolve `reference` relative to the nearest base URL on the chain,
    /// falling back to the engine's base URL. Absolute references pass
    /// through untouched.
    pub fn resolved_url(node: &ContextRef, reference: &str) -> ContextResult<Url> {
        if let Ok(absolute) = Url::parse(reference) {
            return Ok(absolute);
        }
        let base = Self::base_url(node).or_else(|| {
            node.borrow()
                .engine
                .as_ref()
                .and_then(Weak::upgrade)
                .and_then(|inner| inner.base_url())
        });
        match base {
            Some(base) => base
                .join(reference)
                .map_err(|_| ContextError::InvalidReference {
                    reference: reference.to_string(),
                    base,
                }),
            None => Err(ContextError::NoBaseUrl {
                reference: reference.to_string(),
            }),
        }
    }

    fn reject_internal(node: &ContextRef, name: &str) -> bool {
        let data = node.borrow();
        debug_assert!(!data.destroyed, "mutating a destroyed context");
        if data.is_internal {
            Self::report_borrowed(
                &data,
                DiagnosticBuilder::warning(DiagnosticCode::InternalContextMutation)
                    .with_message(format!(
                        "cannot set property {name:?} on an engine-internal context"
                    ))
                    .build(),
            );
            true
        } else {
            false
        }
    }

    fn report(node: &ContextRef, diagnostic: Diagnostic) {
        Self::report_borrowed(&node.borrow(), diagnostic);
    }

    fn report_borrowed(data: &ContextData, diagnostic: Diagnostic) {
        tracing::warn!(target: "canopy::context", "{diagnostic}");
        if let Some(engine) = data.engine.as_ref().and_then(Weak::upgrade) {
            engine.report(diagnostic);
        }
    }
}

impl Drop for ContextData {
    fn drop(&mut self) {
        // An external owner may drop its handle without destroying the node;
        // keep the sibling chain of the remaining nodes consistent.
        let prev = self.prev_sibling.clone();
        let next = self.next_sibling.clone();
        if let Some(prev) = prev.upgrade() {
            prev.borrow_mut().next_sibling = next.clone();
        } else if let Some(parent) = self.parent.upgrade() {
            parent.borrow_mut().first_child = next.clone();
        }
        if let Some(next) = next.upgrade() {
            next.borrow_mut().prev_sibling = prev;
        }
    }
}
