//! Error types for Weft operations.
//!
//! [`WeftError`] wraps every failure a [`Compiler`](crate::Compiler) can
//! report. The variants that come from source problems keep the source text
//! so callers can render snippets.

use std::io;

use thiserror::Error;

use weft_parser::{Diagnostic, ParseError};

use crate::shader::ShaderError;

/// The main error type for Weft operations.
///
/// # Diagnostic Variants
///
/// `Parse`, `Semantic` and `Shader` carry the source they were found in
/// together with spanned diagnostics.
#[derive(Debug, Error)]
pub enum WeftError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("semantic analysis found {} error(s)", error_count(.diagnostics))]
    Semantic {
        diagnostics: Vec<Diagnostic>,
        src: String,
    },

    #[error("{err}")]
    Shader { err: ShaderError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics
        .iter()
        .filter(|d| d.severity().is_error())
        .count()
}

impl WeftError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }

    /// Create a new `Semantic` error from the analyzer's diagnostics.
    pub fn new_semantic_error(diagnostics: Vec<Diagnostic>, src: impl Into<String>) -> Self {
        Self::Semantic {
            diagnostics,
            src: src.into(),
        }
    }

    /// Create a new `Shader` error with the associated source code.
    pub fn new_shader_error(err: ShaderError, src: impl Into<String>) -> Self {
        Self::Shader {
            err,
            src: src.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_error_counts_errors_only() {
        let err = WeftError::new_semantic_error(
            vec![
                Diagnostic::error("undefined variable: x"),
                Diagnostic::warning("shadowed"),
                Diagnostic::error("undefined channel: ch"),
            ],
            "",
        );
        assert_eq!(err.to_string(), "semantic analysis found 2 error(s)");
    }
}
