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

//! Core diagnostic types

use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Hint - subtle suggestion for improvement
    Hint,
    /// Information - provides helpful information
    #[default]
    Info,
    /// Warning - may indicate a problem but doesn't prevent execution
    Warning,
    /// Error - the requested operation was dropped
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Hint => write!(f, "hint"),
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Diagnostic codes for the context core
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticCode {
    // Usage violations
    /// Property mutation attempted on an engine-internal context
    InternalContextMutation,
    /// Default-object change attempted on an engine-internal context
    InternalContextDefaultObject,
    /// A named set targeted a slot reserved for an id binding
    IdBindingSlotWrite,
    /// Id bindings were installed twice on the same context
    IdBindingsAlreadyInstalled,
    /// An id-binding write was outside the fixed slot range
    IdBindingIndexOutOfRange,
    /// Operation attempted on a context that was already destroyed
    DestroyedContextAccess,

    // Custom diagnostic with a string code
    /// Escape hatch for embedder-defined diagnostics
    Custom(String),
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCode::InternalContextMutation => write!(f, "internal-context-mutation"),
            DiagnosticCode::InternalContextDefaultObject => {
                write!(f, "internal-context-default-object")
            }
            DiagnosticCode::IdBindingSlotWrite => write!(f, "id-binding-slot-write"),
            DiagnosticCode::IdBindingsAlreadyInstalled => {
                write!(f, "id-bindings-already-installed")
            }
            DiagnosticCode::IdBindingIndexOutOfRange => {
                write!(f, "id-binding-index-out-of-range")
            }
            DiagnosticCode::DestroyedContextAccess => write!(f, "destroyed-context-access"),
            DiagnosticCode::Custom(code) => write!(f, "{code}"),
        }
    }
}

/// A diagnostic message
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Severity of the diagnostic
    pub severity: Severity,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let diagnostic = Diagnostic {
            severity: Severity::Warning,
            code: DiagnosticCode::InternalContextMutation,
            message: "cannot set property on internal context".to_string(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "warning[internal-context-mutation]: cannot set property on internal context"
        );
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Hint < Severity::Info);
        assert!(Severity::Warning < Severity::Error);
    }
}
