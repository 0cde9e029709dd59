//! Diagnostics for the Weft front end.
//!
//! Every problem found while lexing, parsing or analyzing a unit is a
//! [`Diagnostic`]: a severity, an [`ErrorCode`], a message, labelled spans
//! and optional help text. Fatal phases wrap their diagnostics in a
//! [`ParseError`]; the semantic pass accumulates them with a
//! [`DiagnosticCollector`].
//!
//! ```
//! # use weft_parser::error::{Diagnostic, ErrorCode};
//! # use weft_parser::Span;
//! let diag = Diagnostic::error("undefined variable: total")
//!     .with_code(ErrorCode::E200)
//!     .with_label(Span::new(40..45), "not declared in this scope")
//!     .with_help("declare it with `var` or `:=` first");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
