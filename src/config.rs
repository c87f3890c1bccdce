//! Viewer configuration read from a JSON file.
//!
//! The file is looked up at `$CIRCUIT_VIEWER_CONFIG`, then at
//! `circuit-viewer.json` in the working directory. Every field is optional.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::sample::SAMPLE_FILE_NAME;
use crate::scene::DisplayOptions;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CIRCUIT_VIEWER_CONFIG";

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "circuit-viewer.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Initial display options, including the proximity threshold.
    pub display: DisplayOptions,
    /// Pixel size of exported charts.
    pub export_width: u32,
    pub export_height: u32,
    /// Loaded on start-up when it exists.
    pub default_data_file: PathBuf,
    /// Where "Create example data" writes the sample table.
    pub sample_dir: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            display: DisplayOptions::default(),
            export_width: 1200,
            export_height: 900,
            default_data_file: PathBuf::from("data").join(SAMPLE_FILE_NAME),
            sample_dir: PathBuf::from("data"),
        }
    }
}

impl ViewerConfig {
    /// Read and validate a config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: ViewerConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.display = config.display.sanitized();
        config.export_width = config.export_width.max(1);
        config.export_height = config.export_height.max(1);
        Ok(config)
    }

    /// The config file that would be read, if any.
    pub fn locate() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.is_file().then_some(local)
    }

    /// Load the config, falling back to defaults when none exists or it
    /// cannot be read.
    pub fn load() -> Self {
        match Self::locate() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    /// [`ViewerConfig::from_path`], logging failures and returning defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_path(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorScheme;
    use std::fs;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        fs::write(
            &path,
            r#"{ "display": { "color_scheme": "plasma", "num_bins": 8 }, "export_width": 640 }"#,
        )
        .unwrap();

        let config = ViewerConfig::from_path(&path).unwrap();
        assert_eq!(config.display.color_scheme, ColorScheme::Plasma);
        assert_eq!(config.display.num_bins, 8);
        assert_eq!(config.display.line_width, 2.0);
        assert_eq!(config.export_width, 640);
        assert_eq!(config.export_height, 900);
    }

    #[test]
    fn out_of_range_options_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        fs::write(&path, r#"{ "display": { "num_bins": 100, "marker_size": 0.0 } }"#).unwrap();

        let config = ViewerConfig::from_path(&path).unwrap();
        assert_eq!(config.display.num_bins, 20);
        assert_eq!(config.display.marker_size, 1.0);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ViewerConfig::from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(ViewerConfig::load_or_default(&path), ViewerConfig::default());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ViewerConfig::from_path(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
