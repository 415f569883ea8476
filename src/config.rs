//! Run settings, read from an optional JSON file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_FEED_URL: &str =
    "https://nap.dgt.es/datex2/v3/dgt/SituationPublication/datex2_v36.xml";

/// Run settings. Loaded from an optional JSON file; missing keys keep their
/// defaults:
/// ```json
/// {
///   "feed_url": "https://nap.dgt.es/datex2/v3/dgt/SituationPublication/datex2_v36.xml",
///   "top_n": 5,
///   "clustering": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub feed_url: String,
    pub local_path: PathBuf,
    pub map_output: PathBuf,
    pub stats_output: PathBuf,
    pub top_n: usize,
    pub html_top_n: usize,
    pub timeout_secs: u64,
    pub clustering: bool,
    pub locations_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            local_path: PathBuf::from("datex2_v36.xml"),
            map_output: PathBuf::from("mapa_v16.html"),
            stats_output: PathBuf::from("estadisticas_v16.html"),
            top_n: crate::report::DEFAULT_TOP_N,
            html_top_n: crate::report::html::DEFAULT_TOP_N,
            timeout_secs: crate::fetch::DEFAULT_TIMEOUT.as_secs(),
            clustering: true,
            locations_file: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if config.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"top_n": 5, "clustering": false}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.top_n, 5);
        assert!(!config.clustering);
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
        assert_eq!(config.html_top_n, 15);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"top": 5}}"#).unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeout_secs": 0}}"#).unwrap();

        // A zero timeout would fail every request.
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = Config::load(Path::new("/nonexistent/dgt.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
