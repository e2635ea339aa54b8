//! Engine configuration, loadable from TOML with CLI overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::grouping::SuggestConfig;

/// Configuration for the curricula engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CurriculaConfig {
    /// Data directory for the catalog store. `None` means the CLI default.
    pub data_dir: Option<PathBuf>,
    /// Directory scanned for external curriculum sources.
    pub sources_dir: Option<PathBuf>,
    pub suggest: SuggestSettings,
}

/// Settings for the external label-suggestion service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SuggestSettings {
    /// Whether to consult the service at all. Disabled runs use the
    /// deterministic pattern rules only.
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SuggestSettings {
    fn default() -> Self {
        let base = SuggestConfig::default();
        Self {
            enabled: true,
            base_url: base.base_url,
            timeout_secs: base.timeout_secs,
        }
    }
}

impl SuggestSettings {
    /// Client configuration for [`crate::grouping::HttpSuggester`].
    pub fn client_config(&self) -> SuggestConfig {
        SuggestConfig {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

impl CurriculaConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_suggest_with_bounded_timeout() {
        let config = CurriculaConfig::default();
        assert!(config.suggest.enabled);
        assert!(config.suggest.timeout_secs > 0);
    }

    #[test]
    fn loads_partial_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("curricula.toml");
        std::fs::write(
            &path,
            "data_dir = \"/var/lib/curricula\"\n\n[suggest]\nenabled = false\n",
        )
        .unwrap();

        let config = CurriculaConfig::load(&path).unwrap();
        assert_eq!(
            config.data_dir.as_deref(),
            Some(Path::new("/var/lib/curricula"))
        );
        assert!(!config.suggest.enabled);
        // Unspecified fields keep their defaults.
        assert_eq!(config.suggest.timeout_secs, 8);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = CurriculaConfig::load(Path::new("/nonexistent/curricula.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
