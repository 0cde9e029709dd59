//! Accumulates diagnostics for a phase that keeps going after an error.

use crate::error::Diagnostic;

#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic, noting whether it is an error.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// All diagnostics in emission order, warnings included.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_tracks_errors() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("w"));
        assert!(!collector.has_errors());

        collector.emit(Diagnostic::error("e"));
        assert!(collector.has_errors());

        let all = collector.into_diagnostics();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message(), "w");
    }
}
