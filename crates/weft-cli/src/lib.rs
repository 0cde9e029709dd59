//! Weft CLI library
//!
//! This module contains the core CLI logic for the Weft compiler: load the
//! configuration, compile one source file and write the generated files.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};

use weft::{Compiler, WeftError, printer::AstPrinter};

/// Paths of the files written by one [`run`].
#[derive(Debug, Default)]
pub struct Written {
    pub go: PathBuf,
    pub wgsl: Option<PathBuf>,
    pub host: Option<PathBuf>,
}

/// Run the Weft CLI application
///
/// Compiles the input file and writes `<stem>.gen.go` into the output
/// directory, plus `<stem>.wgsl` and `<stem>_gpu.gen.go` when the file
/// declares GPU items.
///
/// # Errors
///
/// Returns `WeftError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - Semantic errors, unless `--allow-errors` is set
/// - Shader generation errors
pub fn run(args: &Args) -> Result<Written, WeftError> {
    info!(
        input_path = args.input,
        out_dir = args.out_dir;
        "Compiling file"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;
    let compiler = Compiler::new(app_config);

    if args.dump_ast {
        let unit = compiler.parse(&args.input, &source)?;
        print!("{}", AstPrinter::print(&unit));
    }

    let output = compiler.compile(&args.input, &source, args.package.as_deref())?;

    if output.has_errors() {
        if !args.allow_errors {
            return Err(WeftError::new_semantic_error(output.diagnostics, source));
        }
        warn!(
            errors = output.diagnostics.iter().filter(|d| d.severity().is_error()).count();
            "Writing output despite semantic errors"
        );
    }

    let out_dir = Path::new(&args.out_dir);
    fs::create_dir_all(out_dir)?;
    let stem = Path::new(&args.input)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());

    let mut written = Written {
        go: out_dir.join(format!("{stem}.gen.go")),
        ..Written::default()
    };
    fs::write(&written.go, &output.go)?;
    info!(output_file = written.go.display().to_string(); "Go source written");

    if let Some(shader) = output.shader {
        let wgsl = out_dir.join(format!("{stem}.wgsl"));
        fs::write(&wgsl, &shader.wgsl)?;
        info!(output_file = wgsl.display().to_string(); "WGSL written");
        written.wgsl = Some(wgsl);

        if let Some(host) = shader.host {
            let path = out_dir.join(format!("{stem}_gpu.gen.go"));
            fs::write(&path, host)?;
            info!(output_file = path.display().to_string(); "Go host bindings written");
            written.host = Some(path);
        }
    }

    Ok(written)
}
