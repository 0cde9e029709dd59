//! GPU side of a unit: WGSL source and the Go host bindings.
//!
//! - [`types`]: the fixed table of GPU value types
//! - [`layout`]: struct offsets, sizes and alignments
//! - `wgsl`: shader source emission
//! - `host`: Go structs that serialize to the shader's memory layout

pub mod layout;
pub mod types;

mod binding;
mod host;
mod wgsl;

use log::{debug, info};
use thiserror::Error;

use weft_core::{ast::CompilationUnit, span::Span};
use weft_parser::{Diagnostic, ErrorCode};

use crate::config::AppConfig;

pub use layout::{LayoutTable, StructLayout};

/// Generated shader artifacts for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderOutput {
    /// WGSL source with every struct, binding and GPU function.
    pub wgsl: String,
    /// Go host file, absent when disabled in the configuration.
    pub host: Option<String>,
}

/// A GPU declaration that cannot be expressed in WGSL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    #[error("unknown shader type `{name}`: {reason}")]
    UnknownType {
        name: String,
        reason: String,
        span: Span,
    },

    #[error("unsupported decorator `@{name}` on {target}")]
    UnsupportedDecorator {
        name: String,
        target: &'static str,
        span: Span,
    },

    #[error("channel operations cannot run in shader code")]
    ChannelOperation { span: Span },

    #[error("{construct} cannot be expressed in shader code")]
    UnsupportedConstruct { construct: String, span: Span },

    #[error("unknown function `{name}` in shader code")]
    UnknownFunction { name: String, span: Span },

    #[error("binding `{name}` has no address space")]
    MissingAddressSpace { name: String, span: Span },
}

impl ShaderError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ShaderError::UnknownType { .. } => ErrorCode::E300,
            ShaderError::UnsupportedDecorator { .. } => ErrorCode::E301,
            ShaderError::ChannelOperation { .. } => ErrorCode::E302,
            ShaderError::UnsupportedConstruct { .. } => ErrorCode::E303,
            ShaderError::UnknownFunction { .. } => ErrorCode::E304,
            ShaderError::MissingAddressSpace { .. } => ErrorCode::E305,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ShaderError::UnknownType { span, .. }
            | ShaderError::UnsupportedDecorator { span, .. }
            | ShaderError::ChannelOperation { span }
            | ShaderError::UnsupportedConstruct { span, .. }
            | ShaderError::UnknownFunction { span, .. }
            | ShaderError::MissingAddressSpace { span, .. } => *span,
        }
    }

    fn help(&self) -> Option<&'static str> {
        match self {
            ShaderError::UnknownType { .. } => {
                Some("use f32, i32, u32, a vecN, a matNxN or a `@gpu` struct")
            }
            ShaderError::ChannelOperation { .. } => {
                Some("receive on the Go side and pass the value through a uniform")
            }
            ShaderError::MissingAddressSpace { .. } => Some(
                "add one of `@uniform`, `@storage`, `@storage(read_write)`, `@workgroup` or `@private`",
            ),
            _ => None,
        }
    }

    /// Convert into a spanned diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string()).with_code(self.code());
        if self.span() != Span::default() {
            diag = diag.with_label(self.span(), self.code().description());
        }
        if let Some(help) = self.help() {
            diag = diag.with_help(help);
        }
        diag
    }
}

/// Generate WGSL (and, when configured, the Go host file) for the GPU
/// declarations of `unit`. Returns `None` when the unit declares nothing
/// for the GPU.
///
/// # Errors
///
/// Returns the first [`ShaderError`] found; no partial output is produced.
pub fn generate(
    unit: &CompilationUnit,
    package: &str,
    config: &AppConfig,
) -> Result<Option<ShaderOutput>, ShaderError> {
    if !unit.has_gpu() {
        return Ok(None);
    }
    info!(
        structs = unit.gpu_structs.len(),
        bindings = unit.gpu_bindings.len(),
        functions = unit.gpu_functions.len();
        "Generating shader"
    );

    let layouts = LayoutTable::build(&unit.gpu_structs)?;
    let wgsl = wgsl::generate(unit, &layouts)?;
    let host = if config.shader().host() {
        Some(host::generate(
            unit,
            &layouts,
            package,
            config.codegen().header(),
        )?)
    } else {
        None
    };

    debug!(wgsl_bytes = wgsl.len(), host = host.is_some(); "Shader generated");
    Ok(Some(ShaderOutput { wgsl, host }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_diagnostic() {
        let err = ShaderError::ChannelOperation {
            span: Span::new(10..14),
        };
        assert_eq!(err.code(), ErrorCode::E302);

        let diag = err.to_diagnostic();
        assert_eq!(diag.code(), Some(ErrorCode::E302));
        assert_eq!(diag.primary_span(), Some(Span::new(10..14)));
        assert!(diag.help().is_some());
    }

    #[test]
    fn test_unit_without_gpu_declarations() {
        let unit = weft_parser::parse("plain.weft", "package main\nfunc f() {}").expect("parse");
        let out = generate(&unit, "main", &AppConfig::default()).expect("generate");
        assert!(out.is_none());
    }
}
