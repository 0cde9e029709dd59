//! Configuration types for Weft code generation.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file; every field has a default, so an empty file is valid.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`CodegenConfig`] - Runtime import path, alias and file header of the
//!   generated Go source.
//! - [`ShaderConfig`] - Whether the Go host file is produced next to WGSL.
//!
//! # Example
//!
//! ```
//! # use weft::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.codegen().runtime_alias(), "rt");
//! assert!(config.shader().host());
//! ```

use serde::Deserialize;

/// Import path of the Go runtime package used by generated units.
pub const DEFAULT_RUNTIME_IMPORT: &str = "github.com/weft-lang/weft/runtime";

/// First line of every generated Go file.
pub const DEFAULT_HEADER: &str = "// Code generated by weft. DO NOT EDIT.";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Go generator section.
    #[serde(default)]
    codegen: CodegenConfig,

    /// Shader generator section.
    #[serde(default)]
    shader: ShaderConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(codegen: CodegenConfig, shader: ShaderConfig) -> Self {
        Self { codegen, shader }
    }

    /// Returns the Go generator configuration.
    pub fn codegen(&self) -> &CodegenConfig {
        &self.codegen
    }

    /// Returns the shader generator configuration.
    pub fn shader(&self) -> &ShaderConfig {
        &self.shader
    }
}

/// Settings for the generated Go source.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Import path of the runtime package.
    runtime_import: String,

    /// Local name the runtime package is imported under.
    runtime_alias: String,

    /// Comment line written at the top of every generated file.
    header: String,
}

impl CodegenConfig {
    /// Creates a new [`CodegenConfig`].
    ///
    /// # Arguments
    ///
    /// * `runtime_import` - Go import path of the runtime package.
    /// * `runtime_alias` - Identifier the runtime is imported as.
    /// * `header` - First line of generated files.
    pub fn new(
        runtime_import: impl Into<String>,
        runtime_alias: impl Into<String>,
        header: impl Into<String>,
    ) -> Self {
        Self {
            runtime_import: runtime_import.into(),
            runtime_alias: runtime_alias.into(),
            header: header.into(),
        }
    }

    pub fn runtime_import(&self) -> &str {
        &self.runtime_import
    }

    pub fn runtime_alias(&self) -> &str {
        &self.runtime_alias
    }

    pub fn header(&self) -> &str {
        &self.header
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_IMPORT, "rt", DEFAULT_HEADER)
    }
}

/// Settings for the shader generator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Emit the Go host file with buffer structs and binding constants.
    host: bool,
}

impl ShaderConfig {
    pub fn new(host: bool) -> Self {
        Self { host }
    }

    /// Returns `true` when the Go host file is generated.
    pub fn host(&self) -> bool {
        self.host
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self { host: true }
    }
}
