//! The fatal error returned by lexing and parsing.

use std::fmt;

use crate::{error::Diagnostic, line_index::LineIndex};

/// One or more fatal diagnostics, tagged with the file they came from.
#[derive(Debug)]
pub struct ParseError {
    file: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            file: None,
            diagnostics,
        }
    }

    /// Record the name of the file being parsed.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// One `file:line:col: ...` line per diagnostic.
    pub fn render_located(&self, src: &str) -> String {
        let index = LineIndex::new(src);
        let file = self.file.as_deref().unwrap_or("<input>");
        self.diagnostics
            .iter()
            .map(|diag| diag.render_located(file, &index))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{file}: ")?;
        }
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{first}")?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self::new(diagnostics)
    }
}
