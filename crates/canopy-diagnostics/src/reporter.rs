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

//! Collecting diagnostic reporter

use crate::diagnostic::{Diagnostic, Severity};

/// Summary statistics over collected diagnostics
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSummary {
    /// Total number of diagnostics
    pub total_count: usize,
    /// Number of error diagnostics
    pub error_count: usize,
    /// Number of warning diagnostics
    pub warning_count: usize,
    /// Number of info diagnostics
    pub info_count: usize,
    /// Number of hint diagnostics
    pub hint_count: usize,
}

/// Accumulates diagnostics emitted by the context core.
///
/// The engine holds one reporter; usage violations land here and the
/// offending operation is dropped. Embedders drain the reporter at whatever
/// cadence suits them.
#[derive(Debug, Default)]
pub struct DiagnosticReporter {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReporter {
    /// Create a new diagnostic reporter
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    /// Add a diagnostic to the report
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// All collected diagnostics, in emission order
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Remove and return all collected diagnostics
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Whether any diagnostic has been collected
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of collected diagnostics
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Summary statistics for the collected diagnostics
    pub fn summary(&self) -> DiagnosticSummary {
        let mut summary = DiagnosticSummary {
            total_count: self.diagnostics.len(),
            ..Default::default()
        };
        for diagnostic in &self.diagnostics {
            match diagnostic.severity {
                Severity::Error => summary.error_count += 1,
                Severity::Warning => summary.warning_count += 1,
                Severity::Info => summary.info_count += 1,
                Severity::Hint => summary.hint_count += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DiagnosticBuilder;
    use crate::diagnostic::DiagnosticCode;

    #[test]
    fn collects_and_summarizes() {
        let mut reporter = DiagnosticReporter::new();
        assert!(reporter.is_empty());

        reporter.report(DiagnosticBuilder::warning(DiagnosticCode::InternalContextMutation).build());
        reporter.report(DiagnosticBuilder::error(DiagnosticCode::IdBindingSlotWrite).build());

        let summary = reporter.summary();
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.error_count, 1);

        let drained = reporter.take();
        assert_eq!(drained.len(), 2);
        assert!(reporter.is_empty());
    }
}
