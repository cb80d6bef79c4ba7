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

//! Weak, self-invalidating context handles
//!
//! A guard observes a context without owning it. After the context is
//! destroyed every guard pointing at it reads as invalid; the check is an
//! O(1) test and repeated reads stay safe. Object guards (for id-bound and
//! default objects) live in `canopy-model` and follow the same discipline.

use crate::facade::Context;
use crate::node::WeakContext;

/// Weak handle to a context.
///
/// Unlike a plain `Weak`, a guard also accounts for explicit destruction: a
/// context that is still referenced by external owners but has been
/// destroyed reads as invalid.
#[derive(Clone, Default)]
pub struct ContextGuard {
    target: WeakContext,
}

impl ContextGuard {
    /// Guard the given context
    pub fn new(context: &Context) -> Self {
        Self {
            target: std::rc::Rc::downgrade(context.data()),
        }
    }

    /// A guard that was never bound
    pub fn empty() -> Self {
        Self::default()
    }

    /// The guarded context, if it is alive and not destroyed
    pub fn get(&self) -> Option<Context> {
        let data = self.target.upgrade()?;
        if data.borrow().destroyed {
            return None;
        }
        Some(Context::from_ref(data))
    }

    /// Whether the guarded context is alive and not destroyed
    pub fn is_valid(&self) -> bool {
        self.target
            .upgrade()
            .is_some_and(|data| !data.borrow().destroyed)
    }
}

impl std::fmt::Debug for ContextGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextGuard")
            .field("valid", &self.is_valid())
            .finish()
    }
}
