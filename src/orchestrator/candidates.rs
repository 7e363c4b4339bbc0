//! Provider configuration and candidate enumeration.
//!
//! Credentials are an explicit, validated list handed in through
//! configuration. Candidate order is: every primary credential in declared
//! order, every model under each credential (fastest first), then the
//! single secondary candidate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 12;
pub const MIN_ATTEMPT_TIMEOUT_SECS: u64 = 1;
pub const MAX_ATTEMPT_TIMEOUT_SECS: u64 = 120;

/// Wire format spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// `POST {endpoint}/models/{model}:generateContent`
    Gemini,
    /// `POST {endpoint}/chat/completions`
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAiCompatible => "openai_compatible",
        }
    }
}

/// One API key. `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub api_key: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl Credential {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            label: None,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"<redacted>")
            .field("label", &self.label)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    pub endpoint: String,
    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub models: Vec<String>,
}

impl ProviderConfig {
    pub fn gemini_default() -> Self {
        Self {
            name: "gemini".to_string(),
            kind: ProviderKind::Gemini,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            credentials: Vec::new(),
            models: vec![
                "gemini-2.0-flash-lite".to_string(),
                "gemini-2.0-flash".to_string(),
                "gemini-1.5-flash".to_string(),
            ],
        }
    }

    pub fn groq_default() -> Self {
        Self {
            name: "groq".to_string(),
            kind: ProviderKind::OpenAiCompatible,
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            credentials: Vec::new(),
            models: vec!["llama-3.3-70b-versatile".to_string()],
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |msg: String| Err(CoreError::InvalidConfig(msg));

        if self.name.trim().is_empty() || self.name.contains(':') {
            return invalid(format!("provider name {:?} is empty or contains ':'", self.name));
        }
        if self.endpoint.trim().is_empty() {
            return invalid(format!("provider {} has no endpoint", self.name));
        }
        if let Some(i) = self
            .credentials
            .iter()
            .position(|c| c.api_key.trim().is_empty())
        {
            return invalid(format!("provider {} credential {} has a blank key", self.name, i + 1));
        }
        if !self.credentials.is_empty() && self.models.is_empty() {
            return invalid(format!("provider {} has credentials but no models", self.name));
        }
        if self.models.iter().any(|m| m.trim().is_empty()) {
            return invalid(format!("provider {} has a blank model name", self.name));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub primary: ProviderConfig,
    pub secondary: Option<ProviderConfig>,
    pub attempt_timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            primary: ProviderConfig::gemini_default(),
            secondary: Some(ProviderConfig::groq_default()),
            attempt_timeout_secs: DEFAULT_ATTEMPT_TIMEOUT_SECS,
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> CoreResult<()> {
        self.primary.validate()?;
        if let Some(secondary) = &self.secondary {
            secondary.validate()?;
            // Quota bookkeeping and provider labels are keyed by name
            if secondary.name == self.primary.name {
                return Err(CoreError::InvalidConfig(format!(
                    "primary and secondary providers share the name {:?}",
                    secondary.name
                )));
            }
        }
        if !(MIN_ATTEMPT_TIMEOUT_SECS..=MAX_ATTEMPT_TIMEOUT_SECS).contains(&self.attempt_timeout_secs)
        {
            return Err(CoreError::InvalidConfig(format!(
                "orchestrator.attempt_timeout_secs must be within {}..={}",
                MIN_ATTEMPT_TIMEOUT_SECS, MAX_ATTEMPT_TIMEOUT_SECS
            )));
        }
        Ok(())
    }
}

/// One `(provider, credential, model)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub provider: String,
    pub kind: ProviderKind,
    pub endpoint: String,
    /// Zero-based index into the provider's credential list.
    pub credential_index: usize,
    pub credential: Credential,
    pub model: String,
}

impl Candidate {
    /// `provider:keyN:model`, N one-based. Used as `provider_used`.
    pub fn label(&self) -> String {
        format!("{}:key{}:{}", self.provider, self.credential_index + 1, self.model)
    }

    /// Identity of the credential for quota bookkeeping.
    pub fn credential_key(&self) -> (String, usize) {
        (self.provider.clone(), self.credential_index)
    }
}

fn candidate(provider: &ProviderConfig, index: usize, credential: &Credential, model: &str) -> Candidate {
    Candidate {
        provider: provider.name.clone(),
        kind: provider.kind,
        endpoint: provider.endpoint.clone(),
        credential_index: index,
        credential: credential.clone(),
        model: model.to_string(),
    }
}

/// Build the ordered candidate list.
///
/// The secondary provider contributes one candidate: its first credential
/// with its first model.
pub fn enumerate_candidates(config: &OrchestratorConfig) -> Vec<Candidate> {
    let primary = &config.primary;
    let mut candidates: Vec<Candidate> = primary
        .credentials
        .iter()
        .enumerate()
        .flat_map(move |(index, credential)| {
            primary
                .models
                .iter()
                .map(move |model| candidate(primary, index, credential, model))
        })
        .collect();

    if let Some(secondary) = &config.secondary {
        if let (Some(credential), Some(model)) =
            (secondary.credentials.first(), secondary.models.first())
        {
            candidates.push(candidate(secondary, 0, credential, model));
        }
    }

    candidates
}
