use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::duplicate::{CopyStrategy, DEFAULT_SUFFIX};
use crate::error::{NotedupError, Result};
use crate::resolve::ResolveStrategy;

/// Defaults for a duplication run, optionally read from a YAML file.
///
/// Command-line flags override whatever the file sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DupConfig {
    pub strategy: ResolveStrategy,
    pub copy: CopyStrategy,
    pub recursive: bool,
    /// Appended to the source name to form the new folder's name.
    pub suffix: String,
    /// Base log level ("error", "warn", "info", "debug", "trace").
    pub log_level: String,
}

impl Default for DupConfig {
    fn default() -> Self {
        Self {
            strategy: ResolveStrategy::default(),
            copy: CopyStrategy::default(),
            recursive: false,
            suffix: DEFAULT_SUFFIX.to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub strategy: Option<ResolveStrategy>,
    pub copy: Option<CopyStrategy>,
    pub recursive: Option<bool>,
    pub suffix: Option<String>,
}

impl DupConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: DupConfig = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the file if one is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(strategy) = overrides.strategy {
            self.strategy = strategy;
        }
        if let Some(copy) = overrides.copy {
            self.copy = copy;
        }
        if let Some(recursive) = overrides.recursive {
            self.recursive = recursive;
        }
        if let Some(suffix) = overrides.suffix {
            self.suffix = suffix;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        // an empty suffix would name the copy exactly like its source
        if self.suffix.is_empty() {
            return Err(NotedupError::Config("suffix must not be empty".to_string()));
        }
        if self.suffix.contains('/') {
            return Err(NotedupError::Config(format!(
                "suffix {:?} must not contain '/'",
                self.suffix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DupConfig::default();
        assert_eq!(config.strategy, ResolveStrategy::Strict);
        assert_eq!(config.copy, CopyStrategy::Field);
        assert!(!config.recursive);
        assert_eq!(config.suffix, "*");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: DupConfig = serde_yaml::from_str("copy: native\nrecursive: true\n").unwrap();
        assert_eq!(config.copy, CopyStrategy::Native);
        assert!(config.recursive);
        assert_eq!(config.strategy, ResolveStrategy::Strict);
        assert_eq!(config.suffix, "*");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notedup.yaml");
        fs::write(&path, "strategy: exhaustive\nsuffix: \" (copy)\"\n").unwrap();

        let config = DupConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.strategy, ResolveStrategy::Exhaustive);
        assert_eq!(config.suffix, " (copy)");
    }

    #[test]
    fn test_flags_override_file() {
        let config = DupConfig {
            strategy: ResolveStrategy::Exhaustive,
            suffix: "-old".to_string(),
            ..DupConfig::default()
        };
        let merged = config
            .apply(Overrides {
                strategy: Some(ResolveStrategy::Strict),
                suffix: Some("*".to_string()),
                recursive: Some(true),
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(merged.strategy, ResolveStrategy::Strict);
        assert_eq!(merged.suffix, "*");
        assert!(merged.recursive);
        assert_eq!(merged.copy, CopyStrategy::Field);
    }

    #[test]
    fn test_flag_turns_recursion_off() {
        let config: DupConfig = serde_yaml::from_str("recursive: true\n").unwrap();
        let merged = config
            .clone()
            .apply(Overrides {
                recursive: Some(false),
                ..Overrides::default()
            })
            .unwrap();
        assert!(!merged.recursive);

        let untouched = config.apply(Overrides::default()).unwrap();
        assert!(untouched.recursive);
    }

    #[test]
    fn test_empty_suffix_rejected() {
        let result = DupConfig::default().apply(Overrides {
            suffix: Some(String::new()),
            ..Overrides::default()
        });
        assert!(matches!(result, Err(NotedupError::Config(_))));
    }

    #[test]
    fn test_unknown_strategy_is_yaml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "strategy: fuzzy\n").unwrap();
        assert!(matches!(DupConfig::load(&path), Err(NotedupError::Yaml(_))));
    }
}
