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

//! Diagnostic reporting for the canopy context system
//!
//! Usage violations in the context core are non-fatal: the offending
//! operation becomes a no-op and a diagnostic is routed through a
//! [`DiagnosticReporter`]. Nothing here aborts execution.

pub mod builder;
pub mod diagnostic;
pub mod reporter;

pub use builder::DiagnosticBuilder;
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use reporter::{DiagnosticReporter, DiagnosticSummary};
