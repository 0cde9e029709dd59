//! Core definitions shared by the Weft compiler crates.
//!
//! - [`span`]: byte spans and span-carrying values
//! - [`ast`]: the syntax tree produced by the parser
//! - [`visitor`]: default-traversal visitor and the `Accept` dispatch trait
//! - [`printer`]: a debug dump built on the visitor
//! - [`reserved`]: built-in element tags and prop names

pub mod ast;
pub mod printer;
pub mod reserved;
pub mod span;
pub mod visitor;
