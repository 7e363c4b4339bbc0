//! HTTP pulls for the telemetry and public air-quality sources.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

use super::air_quality::{AirQualityLocation, AirQualityPayload};
use super::telemetry::TelemetryFeed;

const USER_AGENT: &str = concat!("airsense-core/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceEndpoints {
    pub telemetry_base_url: String,
    pub air_quality_base_url: String,
    pub fetch_timeout_secs: u64,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            telemetry_base_url: "https://api.thingspeak.com".to_string(),
            air_quality_base_url: "https://api.openaq.org".to_string(),
            fetch_timeout_secs: 15,
        }
    }
}

impl SourceEndpoints {
    pub fn telemetry_url(
        &self,
        channel_id: &str,
        read_key: Option<&str>,
        results: usize,
    ) -> CoreResult<Url> {
        let base = format!(
            "{}/channels/{}/feeds.json",
            self.telemetry_base_url.trim_end_matches('/'),
            channel_id
        );
        let mut params = vec![("results", results.to_string())];
        if let Some(key) = read_key {
            params.push(("api_key", key.to_string()));
        }
        Url::parse_with_params(&base, &params).map_err(|e| CoreError::Fetch(e.to_string()))
    }

    pub fn air_quality_url(&self, city: &str, limit: usize) -> CoreResult<Url> {
        let base = format!(
            "{}/v2/latest",
            self.air_quality_base_url.trim_end_matches('/')
        );
        Url::parse_with_params(
            &base,
            &[("city", city.to_string()), ("limit", limit.to_string())],
        )
        .map_err(|e| CoreError::Fetch(e.to_string()))
    }
}

/// Pulls raw payloads; decoding into rows happens in the source modules.
pub struct SourceClient {
    http: reqwest::Client,
    endpoints: SourceEndpoints,
}

impl SourceClient {
    pub fn new(endpoints: SourceEndpoints) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(endpoints.fetch_timeout_secs))
            .build()
            .map_err(|e| CoreError::Fetch(e.to_string()))?;

        Ok(Self { http, endpoints })
    }

    pub async fn fetch_telemetry(
        &self,
        channel_id: &str,
        read_key: Option<&str>,
        results: usize,
    ) -> CoreResult<TelemetryFeed> {
        let url = self.endpoints.telemetry_url(channel_id, read_key, results)?;
        log::debug!("SOURCE_FETCH kind=telemetry channel={}", channel_id);
        self.get_json(url).await
    }

    pub async fn fetch_air_quality(
        &self,
        city: &str,
        limit: usize,
    ) -> CoreResult<Vec<AirQualityLocation>> {
        let url = self.endpoints.air_quality_url(city, limit)?;
        log::debug!("SOURCE_FETCH kind=air_quality city={}", city);
        let payload: AirQualityPayload = self.get_json(url).await?;
        Ok(payload.into_locations())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> CoreResult<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("SOURCE_FETCH_FAILED status={} body_len={}", status, body.len());
            return Err(CoreError::Fetch(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CoreError::Fetch(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| CoreError::PayloadDecode(e.to_string()))
    }
}
