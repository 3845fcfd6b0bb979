use crate::engine::submission::Platform;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("settings validation failed: {0}")]
    Settings(String),
}

fn default_max_iterations() -> u32 {
    8
}

fn default_min_acceptance_tests() -> usize {
    3
}

fn default_platform() -> Platform {
    Platform::GoogleSheets
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_platform")]
    pub default_platform: Platform,
    #[serde(default = "default_min_acceptance_tests")]
    pub min_acceptance_tests: usize,
    #[serde(default)]
    pub log_root: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            default_platform: default_platform(),
            min_acceptance_tests: default_min_acceptance_tests(),
            log_root: None,
        }
    }
}

impl EngineSettings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Self =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Settings(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.min_acceptance_tests == 0 {
            return Err(ConfigError::Settings(
                "min_acceptance_tests must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::EngineSettings;
    use crate::engine::submission::Platform;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let settings = EngineSettings::default();
        settings.validate().expect("defaults validate");
        assert_eq!(settings.max_iterations, 8);
        assert_eq!(settings.min_acceptance_tests, 3);
        assert_eq!(settings.default_platform, Platform::GoogleSheets);
        assert!(settings.log_root.is_none());
    }

    #[test]
    fn from_path_reads_yaml_and_applies_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("engine.yaml");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "max_iterations: 4").expect("write");
        writeln!(file, "default_platform: excel").expect("write");

        let settings = EngineSettings::from_path(&path).expect("settings");
        assert_eq!(settings.max_iterations, 4);
        assert_eq!(settings.default_platform, Platform::Excel);
        assert_eq!(settings.min_acceptance_tests, 3);
    }

    #[test]
    fn zero_iteration_budget_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("engine.yaml");
        std::fs::write(&path, "max_iterations: 0\n").expect("write");
        assert!(EngineSettings::from_path(&path).is_err());
    }
}
