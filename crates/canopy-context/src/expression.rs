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

//! Bound expressions and value watches
//!
//! A [`BoundExpression`] depends on the *shape* of name resolution at its
//! context: it may cache a resolution-path shortcut, which a structural
//! refresh invalidates. A [`ValueWatch`] is the cheaper channel for plain
//! value overwrites on an existing slot. Both register weakly with their
//! context; a destroyed context tombstones them (context link cleared, the
//! dependent itself stays alive and is never notified synchronously).

use crate::facade::Context;
use crate::node::{ContextData, ContextRef, WeakContext};
use canopy_model::Value;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub(crate) struct ExpressionCore {
    pub(crate) context: Option<WeakContext>,
    pub(crate) shortcut_valid: bool,
    pub(crate) refresh_count: u64,
}

impl ExpressionCore {
    pub(crate) fn refresh(&mut self) {
        self.shortcut_valid = false;
        self.refresh_count += 1;
    }

    pub(crate) fn tombstone(&mut self) {
        self.context = None;
    }
}

/// An expression bound to a context's name-resolution structure.
///
/// Lives in at most one context's expression registry at a time. The
/// expression does not own its context; after the context is destroyed,
/// [`context`](Self::context) reads `None` and evaluation degrades to
/// not-found.
pub struct BoundExpression {
    core: Rc<RefCell<ExpressionCore>>,
}

impl BoundExpression {
    /// Create an expression not yet attached to any context
    pub fn new() -> Self {
        Self {
            core: Rc::new(RefCell::new(ExpressionCore {
                context: None,
                shortcut_valid: false,
                refresh_count: 0,
            })),
        }
    }

    /// Attach to `context`, leaving any previous registry first
    pub fn attach(&self, context: &Context) {
        self.detach();
        let data = context.data();
        data.borrow_mut()
            .expressions
            .push(Rc::downgrade(&self.core));
        self.core.borrow_mut().context = Some(Rc::downgrade(data));
    }

    /// Remove from the current context's registry, if any
    pub fn detach(&self) {
        let old = self.core.borrow_mut().context.take();
        if let Some(ctx) = old.as_ref().and_then(Weak::upgrade) {
            let this = Rc::downgrade(&self.core);
            ctx.borrow_mut()
                .expressions
                .retain(|entry| !entry.ptr_eq(&this));
        }
        self.core.borrow_mut().shortcut_valid = false;
    }

    /// The context this expression is bound to, or `None` once detached or
    /// tombstoned by context destruction
    pub fn context(&self) -> Option<Context> {
        self.core
            .borrow()
            .context
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Context::from_ref)
    }

    /// Resolve `name` through the bound context chain.
    ///
    /// Marks the resolution-path shortcut as cached; the next structural
    /// refresh clears it, forcing this walk to happen again.
    pub fn evaluate(&self, name: &str) -> Option<Value> {
        let context: Option<ContextRef> = self
            .core
            .borrow()
            .context
            .as_ref()
            .and_then(Weak::upgrade);
        let value = ContextData::resolve(&context?, name);
        self.core.borrow_mut().shortcut_valid = true;
        value
    }

    /// Whether a cached resolution-path shortcut is currently valid
    pub fn has_cached_shortcut(&self) -> bool {
        self.core.borrow().shortcut_valid
    }

    /// Number of structural refreshes this expression has received
    pub fn refresh_count(&self) -> u64 {
        self.core.borrow().refresh_count
    }
}

impl Default for BoundExpression {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct ValueWatchCore {
    pub(crate) context: Option<WeakContext>,
    pub(crate) slot: u32,
    pub(crate) change_count: u64,
}

impl ValueWatchCore {
    pub(crate) fn value_changed(&mut self) {
        self.change_count += 1;
    }

    pub(crate) fn tombstone(&mut self) {
        self.context = None;
    }
}

/// Per-slot value-changed subscription.
///
/// Fired exactly once per overwrite of the watched slot; never fired by
/// structural refreshes or by writes to other slots.
pub struct ValueWatch {
    core: Rc<RefCell<ValueWatchCore>>,
}

impl ValueWatch {
    /// Watch the slot backing `name` on `context`.
    ///
    /// Returns `None` if the context has no slot for `name` yet; watches
    /// address slots, and a slot only exists after the first set.
    pub fn watch(context: &Context, name: &str) -> Option<Self> {
        let data = context.data();
        let slot = data.borrow().names.as_ref()?.slot_of(name)?;
        let core = Rc::new(RefCell::new(ValueWatchCore {
            context: Some(Rc::downgrade(data)),
            slot,
            change_count: 0,
        }));
        data.borrow_mut().watchers.push(Rc::downgrade(&core));
        Some(Self { core })
    }

    /// Number of value-changed notifications received
    pub fn change_count(&self) -> u64 {
        self.core.borrow().change_count
    }

    /// Whether the watched context is still alive
    pub fn is_active(&self) -> bool {
        self.core
            .borrow()
            .context
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }
}
