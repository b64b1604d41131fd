use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Serializable diff settings.
///
/// Holds the flags and thresholds of [`DiffOptions`](crate::DiffOptions)
/// that make sense to persist; the path filter and early-quit predicate are
/// supplied per call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Descend into subtrees that differ.
    pub recursive: bool,
    /// While recursing, also report the directory entries themselves.
    pub tree_in_recursive: bool,
    /// Report unchanged pairs too, so they can serve as copy sources.
    pub find_copies_harder: bool,
    /// Track a single literal path across renames and copies.
    pub follow_renames: bool,
    /// Run rename/copy detection in [`diff_trees`](crate::diff_trees).
    pub detect_renames: bool,
    /// Minimum dissimilarity at which a modification is split into a
    /// delete/add pair for rename detection. `None` disables breaking.
    pub break_threshold: Option<f64>,
    /// Minimum similarity for two files to be paired as a rename or copy.
    pub rename_threshold: f64,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            tree_in_recursive: false,
            find_copies_harder: false,
            follow_renames: false,
            detect_renames: true,
            break_threshold: None,
            rename_threshold: 0.5,
        }
    }
}

impl DiffConfig {
    /// Parse a TOML document, e.g. a `[diff]` table already extracted by
    /// the caller. Missing keys fall back to the defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that thresholds are ratios.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ratio("rename_threshold", self.rename_threshold)?;
        if let Some(value) = self.break_threshold {
            check_ratio("break_threshold", value)?;
        }
        Ok(())
    }
}

fn check_ratio(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ThresholdOutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DiffConfig::default();
        assert!(c.recursive);
        assert!(!c.tree_in_recursive);
        assert!(!c.find_copies_harder);
        assert!(!c.follow_renames);
        assert!(c.detect_renames);
        assert_eq!(c.break_threshold, None);
        assert_eq!(c.rename_threshold, 0.5);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = DiffConfig::from_toml_str(
            r#"
            follow_renames = true
            rename_threshold = 0.8
            "#,
        )
        .unwrap();
        assert!(c.follow_renames);
        assert_eq!(c.rename_threshold, 0.8);
        assert!(c.recursive);
        assert_eq!(c.break_threshold, None);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(DiffConfig::from_toml_str("").unwrap(), DiffConfig::default());
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let err = DiffConfig::from_toml_str("break_threshold = 1.5").unwrap_err();
        assert_eq!(
            err,
            ConfigError::ThresholdOutOfRange {
                name: "break_threshold",
                value: 1.5
            }
        );
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = DiffConfig::from_toml_str("recursive = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
