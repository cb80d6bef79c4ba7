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

//! Error types for the context core
//!
//! The resolve/set/refresh path never errors: a failed lookup is `None` and
//! usage violations degrade to diagnosed no-ops. The only fallible surface
//! is URL resolution.

use thiserror::Error;
use url::Url;

/// Result type for context operations
pub type ContextResult<T> = Result<T, ContextError>;

/// Errors surfaced by the context core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A relative reference was resolved on a chain with no base URL and an
    /// engine with no base URL either
    #[error("cannot resolve {reference:?}: no base URL set on the context chain or engine")]
    NoBaseUrl {
        /// The relative reference that could not be resolved
        reference: String,
    },

    /// The reference could not be joined against the selected base
    #[error("cannot resolve {reference:?} against base {base}")]
    InvalidReference {
        /// The relative reference
        reference: String,
        /// The base URL the join was attempted against
        base: Url,
    },
}
