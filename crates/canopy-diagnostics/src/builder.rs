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

//! Fluent construction of diagnostics

use crate::diagnostic::{Diagnostic, DiagnosticCode, Severity};

/// Builder for [`Diagnostic`] values
#[derive(Debug, Clone)]
pub struct DiagnosticBuilder {
    severity: Severity,
    code: DiagnosticCode,
    message: Option<String>,
}

impl DiagnosticBuilder {
    /// Start an error diagnostic
    pub fn error(code: DiagnosticCode) -> Self {
        Self::with_severity(Severity::Error, code)
    }

    /// Start a warning diagnostic
    pub fn warning(code: DiagnosticCode) -> Self {
        Self::with_severity(Severity::Warning, code)
    }

    /// Start an info diagnostic
    pub fn info(code: DiagnosticCode) -> Self {
        Self::with_severity(Severity::Info, code)
    }

    /// Start a diagnostic with an explicit severity
    pub fn with_severity(severity: Severity, code: DiagnosticCode) -> Self {
        Self {
            severity,
            code,
            message: None,
        }
    }

    /// Attach a human-readable message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Finish building; falls back to the code's display form when no
    /// message was supplied
    pub fn build(self) -> Diagnostic {
        let message = self
            .message
            .unwrap_or_else(|| self.code.to_string());
        Diagnostic {
            severity: self.severity,
            code: self.code,
            message,
        }
    }
}
