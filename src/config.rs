//! Core configuration.
//!
//! One JSON document with a section per component. Every section has
//! defaults, so `{}` is a valid configuration (with no provider
//! credentials, which means every analysis uses the local fallback).

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::extraction::normalizer::{NormalizerConfig, MAX_SAMPLE_INTERVAL_SECS};
use crate::metrics::health::HealthBreakpoints;
use crate::orchestrator::candidates::OrchestratorConfig;
use crate::sources::client::SourceEndpoints;

pub const MAX_FETCH_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub normalizer: NormalizerConfig,
    pub health: HealthBreakpoints,
    pub orchestrator: OrchestratorConfig,
    pub sources: SourceEndpoints,
}

impl CoreConfig {
    /// Parse and validate.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let config: CoreConfig =
            serde_json::from_str(json).map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !(1..=MAX_SAMPLE_INTERVAL_SECS).contains(&self.normalizer.sample_interval_secs) {
            return Err(CoreError::InvalidConfig(format!(
                "normalizer.sample_interval_secs must be within 1..={}",
                MAX_SAMPLE_INTERVAL_SECS
            )));
        }
        self.health.validate().map_err(CoreError::InvalidConfig)?;
        self.orchestrator.validate()?;
        if !(1..=MAX_FETCH_TIMEOUT_SECS).contains(&self.sources.fetch_timeout_secs) {
            return Err(CoreError::InvalidConfig(format!(
                "sources.fetch_timeout_secs must be within 1..={}",
                MAX_FETCH_TIMEOUT_SECS
            )));
        }
        Ok(())
    }
}

/// Load and validate a JSON configuration file.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<CoreConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config = CoreConfig::from_json_str(&text)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    log::info!(
        "CONFIG_LOADED path={} primary={} credentials={}",
        path.display(),
        config.orchestrator.primary.name,
        config.orchestrator.primary.credentials.len()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::candidates::ProviderKind;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config.normalizer.sample_interval_secs, 60);
        assert_eq!(config.orchestrator.attempt_timeout_secs, 12);
        assert_eq!(config.orchestrator.primary.models.len(), 3);
        assert_eq!(config.health, HealthBreakpoints::default());
    }

    #[test]
    fn test_explicit_credentials() {
        let json = r#"{
            "orchestrator": {
                "primary": {
                    "name": "gemini",
                    "kind": "gemini",
                    "endpoint": "https://example.test/v1beta",
                    "credentials": [{"api_key": "k1"}, {"api_key": "k2", "label": "backup"}],
                    "models": ["flash-lite"]
                },
                "secondary": null,
                "attempt_timeout_secs": 10
            },
            "normalizer": {"sample_interval_secs": 30}
        }"#;
        let config = CoreConfig::from_json_str(json).unwrap();

        assert_eq!(config.orchestrator.primary.kind, ProviderKind::Gemini);
        assert_eq!(config.orchestrator.primary.credentials.len(), 2);
        assert!(config.orchestrator.secondary.is_none());
        assert_eq!(config.normalizer.sample_interval_secs, 30);
    }

    #[test]
    fn test_rejections() {
        assert!(CoreConfig::from_json_str(r#"{"normalizer": {"sample_interval_secs": 0}}"#).is_err());
        assert!(CoreConfig::from_json_str(r#"{"orchestrator": {"attempt_timeout_secs": 0}}"#).is_err());
        assert!(CoreConfig::from_json_str(r#"{"sources": {"fetch_timeout_secs": 0}}"#).is_err());
        assert!(CoreConfig::from_json_str(r#"{"sources": {"fetch_timeout_secs": 121}}"#).is_err());
        assert!(CoreConfig::from_json_str(
            r#"{"health": {"pm25": {"steps": [{"up_to": 12.0, "deduction": 10}, {"up_to": 5.0, "deduction": 0}], "beyond": 50}}}"#
        )
        .is_err());
        assert!(CoreConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_sample_interval_is_bounded() {
        assert!(CoreConfig::from_json_str(r#"{"normalizer": {"sample_interval_secs": 86400}}"#).is_ok());
        assert!(CoreConfig::from_json_str(r#"{"normalizer": {"sample_interval_secs": 86401}}"#).is_err());
        assert!(CoreConfig::from_json_str(
            r#"{"normalizer": {"sample_interval_secs": 10000000000000000}}"#
        )
        .is_err());
    }

    #[test]
    fn test_oversized_health_deduction_is_rejected() {
        let json = r#"{"health": {"pm25": {"steps": [{"up_to": 12.0, "deduction": 10}], "beyond": 4294967295}}}"#;
        assert!(CoreConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_duplicate_provider_names_are_rejected() {
        let json = r#"{
            "orchestrator": {
                "primary": {"name": "gemini", "kind": "gemini", "endpoint": "https://a.test", "credentials": [{"api_key": "k1"}], "models": ["m"]},
                "secondary": {"name": "gemini", "kind": "gemini", "endpoint": "https://b.test", "credentials": [{"api_key": "k2"}], "models": ["m"]}
            }
        }"#;
        assert!(CoreConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!("airsense-config-{}.json", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(br#"{"normalizer": {"sample_interval_secs": 15}}"#).unwrap();
        drop(file);

        let config = load_config(&path).unwrap();
        assert_eq!(config.normalizer.sample_interval_secs, 15);
        fs::remove_file(&path).unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }
}
