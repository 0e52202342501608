//! Configuration for geodump

mod logging;
mod markup;
mod scan;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use markup::MarkupConfig;
pub use scan::{DumpConfig, ScanConfig, TitleConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dump and index locations
    #[serde(default)]
    pub dump: DumpConfig,
    /// Offset scan configuration
    #[serde(default)]
    pub scan: ScanConfig,
    /// Title backfill configuration
    #[serde(default)]
    pub titles: TitleConfig,
    /// Markup conventions used by the scanner and coordinate extractor
    #[serde(default)]
    pub markup: MarkupConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects every problem and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Scan validation
        if self.scan.commit_every == 0 {
            errors.push("scan.commit_every must be positive".to_string());
        }
        if !(self.scan.sample_fraction > 0.0 && self.scan.sample_fraction <= 1.0) {
            errors.push("scan.sample_fraction must be between 0.0 (exclusive) and 1.0".to_string());
        }
        if self.scan.is_sampled() && self.scan.estimated_records == 0 {
            errors.push("scan.estimated_records must be positive for a sampled scan".to_string());
        }
        if self.scan.buffer_capacity == 0 {
            errors.push("scan.buffer_capacity must be positive".to_string());
        }

        // Title validation
        if self.titles.batch_size == 0 {
            errors.push("titles.batch_size must be positive".to_string());
        }
        if self.titles.page_size == 0 {
            errors.push("titles.page_size must be positive".to_string());
        }

        // Markup validation
        if self.markup.page_open.is_empty() {
            errors.push("markup.page_open must not be empty".to_string());
        }
        if self.markup.page_close.is_empty() {
            errors.push("markup.page_close must not be empty".to_string());
        }
        if self.markup.coord_tag.trim().is_empty() {
            errors.push("markup.coord_tag must not be empty".to_string());
        }
        if self.markup.coord_tag.contains('|') || self.markup.coord_tag.contains('}') {
            errors.push("markup.coord_tag must not contain '|' or '}'".to_string());
        }

        // Location validation
        if self.dump.index_dir.as_os_str().is_empty() {
            errors.push("dump.index_dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn default_config_passes_validation() {
        let cfg = valid_config();
        assert!(cfg.validate().is_ok(), "default config should be valid");
    }

    #[test]
    fn validate_rejects_zero_commit_interval() {
        let mut cfg = valid_config();
        cfg.scan.commit_every = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("scan.commit_every must be positive"));
    }

    #[test]
    fn validate_rejects_sample_fraction_out_of_range() {
        let mut cfg = valid_config();
        cfg.scan.sample_fraction = 0.0;
        assert!(cfg.validate().is_err());

        cfg.scan.sample_fraction = 1.5;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("scan.sample_fraction"));
    }

    #[test]
    fn validate_requires_estimate_for_sampled_scan() {
        let mut cfg = valid_config();
        cfg.scan.sample_fraction = 0.1;
        cfg.scan.estimated_records = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("scan.estimated_records"));
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let mut cfg = valid_config();
        cfg.titles.batch_size = 0;
        cfg.markup.coord_tag = "  ".to_string();
        cfg.dump.index_dir = PathBuf::new();
        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("titles.batch_size must be positive"));
        assert!(msg.contains("markup.coord_tag must not be empty"));
        assert!(msg.contains("dump.index_dir must not be empty"));
    }

    #[test]
    fn partial_toml_uses_section_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [dump]
            path = "enwiki-20200101-pages-articles-multistream.xml"

            [scan]
            sample_fraction = 0.05
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.dump.path,
            PathBuf::from("enwiki-20200101-pages-articles-multistream.xml")
        );
        assert_eq!(cfg.scan.sample_fraction, 0.05);
        assert_eq!(cfg.scan.commit_every, 1000);
        assert_eq!(cfg.titles.batch_size, 1000);
        assert_eq!(cfg.markup.coord_tag, "coord");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/geodump.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
