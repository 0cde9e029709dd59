//! # Weft Parser
//!
//! Front end of the Weft compiler: source text to a checked syntax tree.
//!
//! 1. [`tokenize`] turns source text into positioned tokens.
//! 2. [`parse`] builds a [`CompilationUnit`] or fails on the first syntax
//!    error.
//! 3. [`analyze`] runs the scope checker and returns every diagnostic it
//!    finds.
//!
//! ```
//! # use weft_parser::{analyze, parse, ParseError};
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         package main
//!         func Greeting(name string) (Node) {
//!             P { `Hello, {name}!` }
//!         }
//!     "#;
//!
//!     let unit = parse("greeting.weft", source)?;
//!     let analysis = analyze(&unit);
//!     assert!(!analysis.has_errors());
//!     Ok(())
//! }
//! ```

pub mod error;
mod lexer;
mod line_index;
mod parser;
mod semantic;
pub mod tokens;

pub use weft_core::span;
pub use weft_core::span::{Span, Spanned};

pub use error::{Diagnostic, ErrorCode, ParseError, Severity};
pub use lexer::tokenize;
pub use line_index::LineIndex;
pub use semantic::{Analysis, analyze};

use log::{debug, info};
use weft_core::ast::CompilationUnit;

/// Lex and parse one source file.
///
/// `file_name` is recorded on the returned error for located rendering.
///
/// # Errors
///
/// Returns a [`ParseError`] with the first lexing or syntax diagnostic.
pub fn parse(file_name: &str, source: &str) -> Result<CompilationUnit, ParseError> {
    info!(file = file_name; "Parsing source");

    let tokens = tokenize(source).map_err(|err| err.with_file(file_name))?;
    let unit =
        parser::parse_tokens(&tokens).map_err(|diag| ParseError::from(diag).with_file(file_name))?;

    debug!(
        package = unit.package.inner().as_str(),
        components = unit.components.len(),
        types = unit.types.len(),
        gpu_structs = unit.gpu_structs.len(),
        gpu_bindings = unit.gpu_bindings.len(),
        gpu_functions = unit.gpu_functions.len();
        "Parsed compilation unit"
    );
    Ok(unit)
}
