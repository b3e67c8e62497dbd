//! Configuration for evaluation runs.
//!
//! Handles YAML loading of the rank cutoffs and the AP denominator policy.
//! Command-line flags override values read from file.

use crate::metrics::Denominator;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML configuration: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("At least one rank cutoff is required")]
    InvalidCutoffs,

    #[error("Invalid denominator: {0}")]
    InvalidDenominator(String),

    #[error("Invalid output format: {0}")]
    InvalidFormat(String),
}

/// Evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvalConfig {
    /// Rank cutoffs K, reported in this order
    #[serde(default = "default_cutoffs")]
    pub cutoffs: Vec<usize>,
    /// AP normalization policy
    #[serde(default)]
    pub denominator: Denominator,
}

fn default_cutoffs() -> Vec<usize> {
    vec![1, 10, 100]
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            cutoffs: default_cutoffs(),
            denominator: Denominator::default(),
        }
    }
}

impl EvalConfig {
    /// Load configuration from YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load configuration from YAML string
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or validated.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace cutoffs when a non-empty override is given
    #[must_use]
    pub fn with_cutoffs(mut self, cutoffs: Vec<usize>) -> Self {
        if !cutoffs.is_empty() {
            self.cutoffs = cutoffs;
        }
        self
    }

    #[must_use]
    pub const fn with_denominator(mut self, denominator: Denominator) -> Self {
        self.denominator = denominator;
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidCutoffs` if no cutoff is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cutoffs.is_empty() {
            return Err(ConfigError::InvalidCutoffs);
        }
        Ok(())
    }
}

/// Report rendering format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Plain text table
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// Markdown tables
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    /// Parse output format from string
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFormat` if the string doesn't match a known format.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(ConfigError::InvalidFormat(s.to_string())),
        }
    }
}

/// Parse a denominator policy name
///
/// # Errors
///
/// Returns `ConfigError::InvalidDenominator` for unknown names.
pub fn parse_denominator(s: &str) -> Result<Denominator, ConfigError> {
    s.parse().map_err(ConfigError::InvalidDenominator)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_eval_config_default() {
        let config = EvalConfig::default();
        assert_eq!(config.cutoffs, vec![1, 10, 100]);
        assert_eq!(config.denominator, Denominator::Returned);
    }

    #[test]
    fn test_from_yaml_full() {
        let yaml = "cutoffs: [5, 50]\ndenominator: relevant-capped\n";
        let config = EvalConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.cutoffs, vec![5, 50]);
        assert_eq!(config.denominator, Denominator::RelevantCapped);
    }

    #[test]
    fn test_from_yaml_defaults() {
        let config = EvalConfig::from_yaml("denominator: returned\n").unwrap();
        assert_eq!(config.cutoffs, vec![1, 10, 100]);
    }

    #[test]
    fn test_from_yaml_rejects_empty_cutoffs() {
        let result = EvalConfig::from_yaml("cutoffs: []\n");
        assert!(matches!(result, Err(ConfigError::InvalidCutoffs)));
    }

    #[test]
    fn test_from_yaml_rejects_unknown_denominator() {
        let result = EvalConfig::from_yaml("denominator: everything\n");
        assert!(matches!(result, Err(ConfigError::YamlError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eval.yaml");
        std::fs::write(&path, "cutoffs: [1, 3]\n").unwrap();

        let config = EvalConfig::load(&path).unwrap();
        assert_eq!(config.cutoffs, vec![1, 3]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = EvalConfig::load("/nonexistent/eval.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_overrides() {
        let config = EvalConfig::default()
            .with_cutoffs(vec![2])
            .with_denominator(Denominator::RelevantCapped);
        assert_eq!(config.cutoffs, vec![2]);
        assert_eq!(config.denominator, Denominator::RelevantCapped);

        let unchanged = EvalConfig::default().with_cutoffs(Vec::new());
        assert_eq!(unchanged.cutoffs, vec![1, 10, 100]);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!(matches!(
            "xml".parse::<OutputFormat>(),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_denominator() {
        assert_eq!(
            parse_denominator("relevant-capped").unwrap(),
            Denominator::RelevantCapped
        );
        assert!(matches!(
            parse_denominator("nope"),
            Err(ConfigError::InvalidDenominator(_))
        ));
    }
}
