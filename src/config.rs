//! Dashboard configuration.
//!
//! Loaded from a TOML file; every section and field has a default so a
//! partial (or missing) file is fine.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "seo-dashboard.toml";

const ENV_SEED: &str = "SEO_DASHBOARD_SEED";
const ENV_NO_FALLBACK: &str = "SEO_DASHBOARD_NO_FALLBACK";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub crawl: CrawlSettings,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: "Mozilla/5.0 (compatible; SeoDashboardBot/0.2; +https://example.com/bot)"
                .to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Per-crawl settings. The config file provides defaults; the dashboard
/// can override them per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub max_pages: usize,
    pub delay_between_requests_ms: u64,
    pub include_external_links: bool,
    pub check_links: bool,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: 10,
            delay_between_requests_ms: 250,
            include_external_links: false,
            check_links: false,
        }
    }
}

impl CrawlSettings {
    pub const MAX_PAGES_LIMIT: usize = 10_000;

    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(AppError::invalid_input("max_pages must be at least 1"));
        }
        if self.max_pages > Self::MAX_PAGES_LIMIT {
            return Err(AppError::invalid_input(format!(
                "max_pages must be at most {}",
                Self::MAX_PAGES_LIMIT
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Show generated data when live fetching fails instead of erroring.
    pub fallback_enabled: bool,
    /// Fixed RNG seed for reproducible simulated output.
    pub seed: Option<u64>,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            seed: None,
            min_latency_ms: 0,
            max_latency_ms: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: AppConfig = toml::from_str(&text)
            .map_err(|e| AppError::config(format!("invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults if loading fails.
    pub fn load_or_default(path: &Path) -> Self {
        let config = if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                tracing::warn!("Using default configuration.");
                Self::default()
            })
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };
        config.with_env_overrides()
    }

    /// Apply `SEO_DASHBOARD_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var(ENV_SEED) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => self.simulation.seed = Some(seed),
                Err(_) => tracing::warn!("Ignoring non-numeric {}={}", ENV_SEED, raw),
            }
        }
        if std::env::var_os(ENV_NO_FALLBACK).is_some() {
            self.simulation.fallback_enabled = false;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.crawl.validate()?;
        if self.simulation.min_latency_ms > self.simulation.max_latency_ms {
            return Err(AppError::config(
                "simulation.min_latency_ms must not exceed max_latency_ms",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[crawl]\nmax_pages = 3\n\n[simulation]\nseed = 42").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.crawl.max_pages, 3);
        assert_eq!(config.crawl.delay_between_requests_ms, 250);
        assert_eq!(config.simulation.seed, Some(42));
        assert!(config.simulation.fallback_enabled);
        assert_eq!(config.http.timeout_secs, 15);
    }

    #[test]
    fn invalid_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[crawl]\nmax_pages = \"lots\"").unwrap();
        assert!(matches!(AppConfig::load(file.path()), Err(AppError::Config(_))));
    }

    #[test]
    fn zero_pages_is_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[crawl]\nmax_pages = 0").unwrap();
        assert!(AppConfig::load(file.path()).is_err());
    }

    #[test]
    fn max_pages_is_capped() {
        let mut settings = CrawlSettings {
            max_pages: CrawlSettings::MAX_PAGES_LIMIT,
            ..CrawlSettings::default()
        };
        assert!(settings.validate().is_ok());

        settings.max_pages = usize::MAX;
        assert!(matches!(settings.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn inverted_latency_bounds_are_invalid() {
        let mut config = AppConfig::default();
        config.simulation.min_latency_ms = 500;
        config.simulation.max_latency_ms = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml"));
        assert_eq!(config.crawl, CrawlSettings::default());
        assert_eq!(config.http, HttpConfig::default());
    }
}
