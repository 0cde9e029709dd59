//! Weft - a declarative UI language compiling to Go and WGSL.
//!
//! A `.weft` file declares renderable units, plain Go helpers and,
//! optionally, GPU structs, bindings and shader functions. The
//! [`Compiler`] runs the whole pipeline: parse, scope analysis, Go
//! generation and shader generation.

pub mod codegen;
pub mod config;
pub mod shader;

mod error;
mod naming;
mod writer;

pub use weft_core::{ast, printer, reserved, span, visitor};
pub use weft_parser::{Analysis, Diagnostic, ErrorCode, ParseError, Severity};

pub use error::WeftError;
pub use shader::{ShaderError, ShaderOutput};

use log::{debug, info, trace, warn};

use ast::CompilationUnit;
use config::AppConfig;

/// Everything generated from one source file.
#[derive(Debug)]
pub struct CompileOutput {
    /// The Go source of every unit, type and function.
    pub go: String,
    /// WGSL and host bindings, when the file declares GPU items.
    pub shader: Option<ShaderOutput>,
    /// Semantic diagnostics. Errors here do not stop generation; callers
    /// decide whether to keep the output.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity().is_error())
    }
}

/// Builder for compiling Weft sources.
///
/// # Examples
///
/// ```
/// use weft::{Compiler, config::AppConfig};
///
/// let source = "package main\nfunc Hello(name string) (Node) { P { `Hi {name}` } }";
/// let compiler = Compiler::new(AppConfig::default());
/// let output = compiler.compile("hello.weft", source, None).expect("compiles");
///
/// assert!(output.go.contains("func NewHello(name string) *Hello"));
/// assert!(output.shader.is_none());
/// assert!(output.diagnostics.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Compiler {
    config: AppConfig,
}

impl Compiler {
    /// Create a new compiler with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse `source` into a syntax tree.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::Parse`] on the first lexing or syntax error.
    pub fn parse(&self, file_name: &str, source: &str) -> Result<CompilationUnit, WeftError> {
        let unit = weft_parser::parse(file_name, source)
            .map_err(|err| WeftError::new_parse_error(err, source))?;
        trace!(unit:?; "Parsed unit");
        Ok(unit)
    }

    /// Run scope analysis over a parsed unit.
    pub fn analyze(&self, unit: &CompilationUnit) -> Analysis {
        let analysis = weft_parser::analyze(unit);
        for warning in analysis.warnings() {
            warn!(diagnostic:% = warning; "Semantic warning");
        }
        analysis
    }

    /// Compile one source file.
    ///
    /// `package` overrides the package clause of the source for the
    /// generated Go files.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::Parse`] for syntax errors and
    /// [`WeftError::Shader`] when a GPU declaration cannot be expressed in
    /// WGSL. Semantic errors are reported in
    /// [`CompileOutput::diagnostics`] instead.
    pub fn compile(
        &self,
        file_name: &str,
        source: &str,
        package: Option<&str>,
    ) -> Result<CompileOutput, WeftError> {
        info!(file = file_name; "Compiling");

        let unit = self.parse(file_name, source)?;
        let diagnostics = self.analyze(&unit).into_diagnostics();
        let package = package.unwrap_or_else(|| unit.package.inner());

        let go = codegen::generate(&unit, package, self.config.codegen());
        let shader = shader::generate(&unit, package, &self.config)
            .map_err(|err| WeftError::new_shader_error(err, source))?;

        debug!(
            go_bytes = go.len(),
            shader = shader.is_some(),
            diagnostics = diagnostics.len();
            "Compilation finished"
        );
        Ok(CompileOutput {
            go,
            shader,
            diagnostics,
        })
    }
}
