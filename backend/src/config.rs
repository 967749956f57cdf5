//! Data source discovery.
//!
//! Resolution order: the `OFERTAS_PATH` environment variable, then an
//! `ofertas.toml` file in the working directory, then the conventional
//! candidate locations. A malformed config file is logged and skipped,
//! never fatal.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// Environment variable naming the snapshot CSV.
pub const DATA_PATH_ENV: &str = "OFERTAS_PATH";

/// Optional config file in the working directory.
pub const CONFIG_FILE: &str = "ofertas.toml";

/// Conventional locations, tried in order.
pub const DEFAULT_CANDIDATES: [&str; 2] = ["data/OFERTAS.csv", "OFERTAS.csv"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub data_path: Option<PathBuf>,
}

impl AppConfig {
    /// Parse a config file; missing or malformed files yield the default.
    pub fn from_file(path: &Path) -> Self {
        let Ok(raw) = std::fs::read_to_string(path) else {
            return AppConfig::default();
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring malformed config file");
                AppConfig::default()
            }
        }
    }
}

/// Resolve the snapshot path: environment, config file, then defaults.
///
/// The returned path is not checked for existence; the loader reports a
/// missing source itself.
pub fn discover_data_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(DATA_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    if let Some(path) = AppConfig::from_file(Path::new(CONFIG_FILE)).data_path {
        return Some(path);
    }

    DEFAULT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_from_valid_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "data_path = \"/srv/ofertas/OFERTAS.csv\"").unwrap();
        f.flush().unwrap();
        let config = AppConfig::from_file(f.path());
        assert_eq!(
            config.data_path.as_deref(),
            Some(Path::new("/srv/ofertas/OFERTAS.csv"))
        );
    }

    #[test]
    fn test_malformed_file_yields_default() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "data_path = [not toml").unwrap();
        f.flush().unwrap();
        let config = AppConfig::from_file(f.path());
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_missing_file_yields_default() {
        let config = AppConfig::from_file(Path::new("/no/such/ofertas.toml"));
        assert!(config.data_path.is_none());
    }
}
