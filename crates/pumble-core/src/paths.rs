//! Locating and creating the configuration file.
//!
//! The client keeps nothing else on disk, so the config file is the only path
//! tracked here.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{APP_NAME, AppConfig, CoreError, Result};

/// File name used inside a config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolved application paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file.
    pub config_file: PathBuf,
}

impl AppPaths {
    /// Resolve the config file.
    ///
    /// An override may name a file or a directory; a directory gets
    /// `config.toml` appended. Without an override the XDG location is used.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Path`] if expansion fails or no config directory
    /// can be determined.
    pub fn discover(override_path: Option<&Path>) -> Result<Self> {
        let config_file = match override_path {
            Some(path) => {
                let expanded = expand_path(path)?;
                if expanded.is_dir() {
                    expanded.join(CONFIG_FILE_NAME)
                } else {
                    expanded
                }
            }
            None => default_config_dir()?.join(CONFIG_FILE_NAME),
        };

        if config_file.file_name().is_none() {
            return Err(CoreError::Path(format!(
                "not a file path: {}",
                config_file.display()
            )));
        }
        Ok(Self { config_file })
    }
}

impl std::fmt::Display for AppPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config: {}", self.config_file.display())
    }
}

/// Expand `~` and environment variables in a path. Non-UTF-8 paths are
/// returned unchanged.
///
/// # Errors
///
/// Returns [`CoreError::Path`] if a referenced variable is undefined.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    path.to_str()
        .map_or_else(|| Ok(path.to_path_buf()), expand_str_path)
}

/// Expand `~` and environment variables in a string path.
///
/// # Errors
///
/// Returns [`CoreError::Path`] if a referenced variable is undefined.
pub fn expand_str_path(text: &str) -> Result<PathBuf> {
    shellexpand::full(text)
        .map(|expanded| PathBuf::from(expanded.into_owned()))
        .map_err(|e| CoreError::Path(format!("expanding {text}: {e}")))
}

/// `$XDG_CONFIG_HOME/pumble`, else the platform config dir, else `~/.config/pumble`.
///
/// # Errors
///
/// Returns [`CoreError::Path`] if not even a home directory is known.
pub fn default_config_dir() -> Result<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .map(|base| base.join(APP_NAME))
        .ok_or_else(|| CoreError::Path("unable to determine configuration directory".to_string()))
}

/// Write the default configuration to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let body = format!(
        "# Configuration for {APP_NAME}\n\
         # File: {}\n\
         # Set the API key with the PUMBLE_API_KEY environment variable\n\
         # or under [api] as api_key.\n\n{}",
        path.display(),
        AppConfig::default().to_toml()?
    );
    fs::write(path, body)?;
    log::info!("wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_directory_resolves_to_config_toml() {
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = AppPaths::discover(Some(dir.path())).expect("discover");
        assert_eq!(paths.config_file, dir.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn override_file_is_used_verbatim() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = dir.path().join("work.toml");
        let paths = AppPaths::discover(Some(&file)).expect("discover");
        assert_eq!(paths.config_file, file);
        assert!(paths.to_string().ends_with("work.toml"));
    }

    #[test]
    fn undefined_variable_is_a_path_error() {
        let err = expand_str_path("$PUMBLE_SURELY_UNDEFINED_VARIABLE/config.toml")
            .expect_err("undefined variable");
        assert!(matches!(err, CoreError::Path(_)));
    }

    #[test]
    fn unwritable_target_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        // The target is an existing directory, so the file write fails.
        let err = write_default_config(dir.path()).expect_err("directory is not a file");
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn default_config_round_trips_through_loader() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        write_default_config(&path).expect("write default config");

        let body = fs::read_to_string(&path).expect("read config");
        assert!(body.starts_with("# Configuration for pumble"));
        assert!(body.contains("[api]"));
        assert!(!body.contains("api_key ="));

        let loaded = AppConfig::load_from_path(&path).expect("load written config");
        assert_eq!(loaded.api.page_size, AppConfig::default().api.page_size);
    }
}
