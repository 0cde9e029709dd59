//! The core diagnostic type.

use std::fmt;

use crate::{
    error::{Severity, error_code::ErrorCode, label::Label},
    line_index::LineIndex,
    span::Span,
};

/// A single error or warning with its source locations.
///
/// The `Display` form is the one-line header (`error[E200]: message`).
/// [`Diagnostic::render_located`] prefixes it with `file:line:col`.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// ```
    /// # use weft_parser::error::{Diagnostic, ErrorCode};
    /// # use weft_parser::Span;
    /// let diag = Diagnostic::error("undefined channel: ticks")
    ///     .with_code(ErrorCode::E201)
    ///     .with_label(Span::new(12..17), "not declared");
    /// assert_eq!(diag.to_string(), "error[E201]: undefined channel: ticks");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render as `file:line:col: error[E200]: message`.
    ///
    /// Diagnostics without a primary label omit the line and column.
    pub fn render_located(&self, file: &str, index: &LineIndex) -> String {
        match self.primary_span() {
            Some(span) => {
                let (line, col) = index.line_col(span.start());
                format!("{file}:{line}:{col}: {self}")
            }
            None => format!("{file}: {self}"),
        }
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_builder_chain() {
        let diag = Diagnostic::warning("variable `count` shadows a parameter")
            .with_code(ErrorCode::E204)
            .with_label(Span::new(30..35), "declared here")
            .with_secondary_label(Span::new(10..15), "parameter declared here")
            .with_help("rename the variable");

        assert!(diag.severity().is_warning());
        assert_eq!(diag.code(), Some(ErrorCode::E204));
        assert_eq!(diag.labels().len(), 2);
        assert!(diag.labels()[1].is_secondary());
        assert_eq!(diag.primary_span(), Some(Span::new(30..35)));
        assert_eq!(diag.help(), Some("rename the variable"));
    }

    #[test]
    fn test_display_without_code() {
        let diag = Diagnostic::error("something broke");
        assert_eq!(diag.to_string(), "error: something broke");
    }

    #[test]
    fn test_render_located() {
        let src = "package main\n\nfunc F() {\n  x = 1\n}\n";
        let offset = src.find("x =").unwrap();
        let index = LineIndex::new(src);
        let diag = Diagnostic::error("undefined variable: x")
            .with_code(ErrorCode::E200)
            .with_label(Span::new(offset..offset + 1), "not declared");

        assert_eq!(
            diag.render_located("app.weft", &index),
            "app.weft:4:3: error[E200]: undefined variable: x"
        );
    }

    #[test]
    fn test_render_located_without_span() {
        let index = LineIndex::new("");
        let diag = Diagnostic::error("empty");
        assert_eq!(diag.render_located("a.weft", &index), "a.weft: error: empty");
    }
}
