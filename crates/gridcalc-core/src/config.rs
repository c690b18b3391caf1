//! Engine configuration, read from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives a
//! 1000 x 100 sheet with a 100-entry undo log.
//!
//! ```toml
//! rows = 500
//! undo_capacity = 50
//!
//! [limits]
//! max_range_values = 5000
//! ```

use gridcalc_engine::engine::{DEFAULT_PRECISION, EvalLimits};
use serde::Deserialize;
use std::path::Path;

use crate::error::{GridcalcError, Result};

/// Config files larger than this are refused.
pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;

/// Upper bound for `limits.max_nesting`; the evaluator recurses once per level.
pub const MAX_NESTING_LIMIT: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub rows: usize,
    pub cols: usize,
    pub undo_capacity: usize,
    pub default_column_width: usize,
    pub default_row_height: usize,
    pub default_precision: usize,
    pub limits: EvalLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            rows: 1000,
            cols: 100,
            undo_capacity: 100,
            default_column_width: 10,
            default_row_height: 1,
            default_precision: DEFAULT_PRECISION,
            limits: EvalLimits::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file, refusing anything over [`MAX_CONFIG_FILE_BYTES`].
    pub fn load(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > MAX_CONFIG_FILE_BYTES {
            return Err(GridcalcError::InvalidConfig(format!(
                "refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Like [`EngineConfig::load`], but a missing file gives the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.rows, "rows"),
            (self.cols, "cols"),
            (self.undo_capacity, "undo_capacity"),
            (self.limits.max_range_values, "limits.max_range_values"),
            (self.limits.max_nesting, "limits.max_nesting"),
        ];
        for (value, name) in checks {
            if value == 0 {
                return Err(GridcalcError::InvalidConfig(format!("{} must be at least 1", name)));
            }
        }
        if self.limits.max_nesting > MAX_NESTING_LIMIT {
            return Err(GridcalcError::InvalidConfig(format!(
                "limits.max_nesting must be at most {}",
                MAX_NESTING_LIMIT
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.rows, 1000);
        assert_eq!(config.cols, 100);
        assert_eq!(config.limits.max_range_values, 1000);
    }

    #[test]
    fn test_partial_config_overrides_fields() {
        let config = EngineConfig::from_toml_str(
            "rows = 20\nundo_capacity = 3\n\n[limits]\nmax_nesting = 8\n",
        )
        .unwrap();
        assert_eq!(config.rows, 20);
        assert_eq!(config.cols, 100);
        assert_eq!(config.undo_capacity, 3);
        assert_eq!(config.limits.max_nesting, 8);
        assert_eq!(config.limits.max_range_values, 1000);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = EngineConfig::from_toml_str("colour = \"red\"").unwrap_err();
        assert!(matches!(err, GridcalcError::Config(_)));
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let err = EngineConfig::from_toml_str("cols = 0").unwrap_err();
        assert!(matches!(err, GridcalcError::InvalidConfig(ref m) if m.contains("cols")));
        let err = EngineConfig::from_toml_str("[limits]\nmax_range_values = 0").unwrap_err();
        assert!(matches!(err, GridcalcError::InvalidConfig(_)));
    }

    #[test]
    fn test_nesting_limit_is_capped() {
        let err = EngineConfig::from_toml_str("[limits]\nmax_nesting = 1000000").unwrap_err();
        assert!(matches!(err, GridcalcError::InvalidConfig(ref m) if m.contains("max_nesting")));
        let config = EngineConfig::from_toml_str("[limits]\nmax_nesting = 1024").unwrap();
        assert_eq!(config.limits.max_nesting, MAX_NESTING_LIMIT);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join(format!(
            "gridcalc_missing_config_{}_{:?}.toml",
            std::process::id(),
            std::thread::current().id(),
        ));
        let config = EngineConfig::load_or_default(&path).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join(format!(
            "gridcalc_config_{}_{:?}.toml",
            std::process::id(),
            std::thread::current().id(),
        ));
        struct Cleanup(std::path::PathBuf);
        impl Drop for Cleanup {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
        let _cleanup = Cleanup(path.clone());
        std::fs::write(&path, "rows = 7\ncols = 3\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!((config.rows, config.cols), (7, 3));
    }
}
