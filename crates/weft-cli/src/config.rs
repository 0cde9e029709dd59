//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use weft::{WeftError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for WeftError {
    fn from(err: ConfigError) -> Self {
        WeftError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (weft/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or fails validation
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, WeftError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("weft/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "weft", "weft") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns error if:
/// - File doesn't exist
/// - File cannot be read
/// - TOML parsing fails
/// - The runtime alias is not a Go identifier
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, WeftError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let alias = config.codegen().runtime_alias();
    let mut chars = alias.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');
    if !valid {
        return Err(ConfigError::Validation(format!(
            "runtime_alias `{alias}` is not a Go identifier"
        )));
    }
    if config.codegen().runtime_import().is_empty() {
        return Err(ConfigError::Validation(
            "runtime_import must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_config(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(text.as_bytes()).expect("Failed to write config");
        file
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let file = write_config(
            "[codegen]\nruntime_import = \"example.com/ui\"\nruntime_alias = \"ui\"\n\n[shader]\nhost = false\n",
        );
        let config = load_config(Some(file.path())).expect("Failed to load config");
        assert_eq!(config.codegen().runtime_import(), "example.com/ui");
        assert_eq!(config.codegen().runtime_alias(), "ui");
        assert!(!config.shader().host());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let file = write_config("[codegen]\nheader = \"\"\n");
        let config = load_config(Some(file.path())).expect("Failed to load config");
        assert_eq!(config.codegen().header(), "");
        assert_eq!(config.codegen().runtime_alias(), "rt");
        assert!(config.shader().host());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = load_config(Some("does/not/exist.toml")).expect_err("missing file");
        assert!(matches!(err, WeftError::Config(msg) if msg.contains("Missing configuration file")));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let file = write_config("[codegen\n");
        let err = load_config(Some(file.path())).expect_err("invalid toml");
        assert!(matches!(err, WeftError::Config(msg) if msg.contains("Failed to parse")));
    }

    #[test]
    fn test_bad_alias_fails_validation() {
        let file = write_config("[codegen]\nruntime_alias = \"not-valid\"\n");
        let err = load_config(Some(file.path())).expect_err("bad alias");
        assert!(matches!(err, WeftError::Config(msg) if msg.contains("not a Go identifier")));
    }
}
