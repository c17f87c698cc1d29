//! Credential store: the user's API keys and LLM endpoint overrides.
//!
//! The record is a single JSON object under [`STORAGE_KEY`]. It is read at the
//! start of every run and written only by the settings action. The store is an
//! explicit service handed to whoever needs it; there is no global instance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::backend::types::SearchSource;
use crate::error::{RunError, StoreError};
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};

/// Fixed storage key of the credential record.
pub const STORAGE_KEY: &str = "openresearch.keys.v1";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// One field of the credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    OpenAiApiKey,
    OpenAiBaseUrl,
    OpenAiModel,
    SerperApiKey,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 4] = [
        Self::OpenAiApiKey,
        Self::OpenAiBaseUrl,
        Self::OpenAiModel,
        Self::SerperApiKey,
    ];

    /// Name used on the command line (`keys set <name> <value>`).
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::OpenAiApiKey => "openai-key",
            Self::OpenAiBaseUrl => "openai-base-url",
            Self::OpenAiModel => "openai-model",
            Self::SerperApiKey => "serper-key",
        }
    }

    /// Environment variable consulted when env fallback is enabled.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::OpenAiApiKey => "OPENAI_API_KEY",
            Self::OpenAiBaseUrl => "OPENAI_BASE_URL",
            Self::OpenAiModel => "OPENAI_MODEL",
            Self::SerperApiKey => "SERPER_API_KEY",
        }
    }

    /// Secrets are masked in `keys show` and in the settings form.
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::OpenAiApiKey | Self::SerperApiKey)
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenAiApiKey => "OpenAI API key",
            Self::OpenAiBaseUrl => "OpenAI base URL",
            Self::OpenAiModel => "OpenAI model",
            Self::SerperApiKey => "Serper API key",
        })
    }
}

impl FromStr for CredentialKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.cli_name() == s.trim())
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.cli_name()).collect();
                format!("unknown key '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// The persisted record. Every field is optional.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serper_api_key: Option<String>,
}

impl Credentials {
    pub fn get(&self, key: CredentialKey) -> Option<&str> {
        match key {
            CredentialKey::OpenAiApiKey => self.openai_api_key.as_deref(),
            CredentialKey::OpenAiBaseUrl => self.openai_base_url.as_deref(),
            CredentialKey::OpenAiModel => self.openai_model.as_deref(),
            CredentialKey::SerperApiKey => self.serper_api_key.as_deref(),
        }
    }

    fn slot(&mut self, key: CredentialKey) -> &mut Option<String> {
        match key {
            CredentialKey::OpenAiApiKey => &mut self.openai_api_key,
            CredentialKey::OpenAiBaseUrl => &mut self.openai_base_url,
            CredentialKey::OpenAiModel => &mut self.openai_model,
            CredentialKey::SerperApiKey => &mut self.serper_api_key,
        }
    }

    /// Builder used by the CLI and tests.
    pub fn with(mut self, key: CredentialKey, value: impl Into<String>) -> Self {
        *self.slot(key) = Some(value.into());
        self
    }

    /// Overlay `partial` onto `self`.
    ///
    /// Fields absent from `partial` are kept; present fields replace, and a
    /// present-but-blank field clears the stored value.
    pub fn merged(mut self, partial: &Credentials) -> Self {
        for key in CredentialKey::ALL {
            if let Some(value) = partial.get(key) {
                *self.slot(key) = non_blank(Some(value));
            }
        }
        self
    }

    /// Fill fields that are absent or blank using `lookup`.
    fn fill_missing(mut self, lookup: &(dyn Fn(&str) -> Option<String> + Send + Sync)) -> Self {
        for key in CredentialKey::ALL {
            if non_blank(self.get(key)).is_none() {
                if let Some(value) = non_blank(lookup(key.env_var()).as_deref()) {
                    *self.slot(key) = Some(value);
                }
            }
        }
        self
    }

    /// Apply defaults and check the keys required by `source`.
    ///
    /// Defaulting of base URL and model happens independently of key
    /// validation. The LLM key is checked first, so a record missing both keys
    /// reports the LLM key.
    pub fn resolve(&self, source: SearchSource) -> Result<ResolvedCredentials, RunError> {
        let base_url = non_blank(self.openai_base_url.as_deref())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        let model = non_blank(self.openai_model.as_deref())
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

        let openai_api_key = non_blank(self.openai_api_key.as_deref())
            .ok_or(RunError::MissingCredential(CredentialKey::OpenAiApiKey))?;

        let serper_api_key = non_blank(self.serper_api_key.as_deref());
        if serper_api_key.is_none() && source.uses_search_provider() {
            return Err(RunError::MissingCredential(CredentialKey::SerperApiKey));
        }

        Ok(ResolvedCredentials {
            openai_api_key,
            openai_base_url: base_url,
            openai_model: model,
            serper_api_key,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &self.openai_api_key.as_deref().map(mask))
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("serper_api_key", &self.serper_api_key.as_deref().map(mask))
            .finish()
    }
}

/// Credentials with defaults applied, ready for one run.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    /// `None` only for categories that do not query the search provider.
    pub serper_api_key: Option<String>,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("serper_api_key", &self.serper_api_key.as_deref().map(mask))
            .finish()
    }
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Injectable credential service shared by the settings dialog and the run
/// pipeline.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn KeyValueStorage>,
    env_lookup: Option<EnvLookup>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            env_lookup: None,
        }
    }

    /// Store backed by files in the per-user config dir, falling back to
    /// process memory when no such dir exists.
    pub fn open_default() -> Self {
        match crate::config::config_dir() {
            Some(dir) => Self::new(Arc::new(FileStorage::new(dir))),
            None => {
                tracing::warn!("No config directory available; keys will not persist");
                Self::new(Arc::new(MemoryStorage::new()))
            }
        }
    }

    /// Fill fields missing from the stored record from process environment
    /// variables (`OPENAI_API_KEY`, `SERPER_API_KEY`, ...).
    pub fn with_env_fallback(self) -> Self {
        self.with_env_lookup(|name| std::env::var(name).ok())
    }

    pub fn with_env_lookup(
        mut self,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.env_lookup = Some(Arc::new(lookup));
        self
    }

    /// Current credentials. Never fails: missing, unreadable or corrupt
    /// storage yields an empty record.
    pub fn load(&self) -> Credentials {
        let stored = self.load_saved();
        match &self.env_lookup {
            Some(lookup) => stored.fill_missing(lookup.as_ref()),
            None => stored,
        }
    }

    /// The persisted record only, without env fallback. The settings form
    /// edits this so environment values are never written back.
    pub fn load_saved(&self) -> Credentials {
        let raw = match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Credentials::default(),
            Err(e) => {
                tracing::warn!("Credential storage unavailable: {}", e);
                return Credentials::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring corrupt credential record: {}", e);
            Credentials::default()
        })
    }

    /// Merge `partial` over the stored record and persist immediately.
    /// Returns the record as stored.
    pub fn save(&self, partial: &Credentials) -> Result<Credentials, StoreError> {
        let next = self.load_saved().merged(partial);
        let raw = serde_json::to_string(&next)?;
        self.storage.set(STORAGE_KEY, &raw)?;
        tracing::info!("Saved credentials");
        Ok(next)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.storage.remove(STORAGE_KEY)?;
        tracing::info!("Cleared credentials");
        Ok(())
    }

    /// Load, apply defaults and validate for `source`.
    pub fn require_or_fail(&self, source: SearchSource) -> Result<ResolvedCredentials, RunError> {
        self.load().resolve(source)
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("env_fallback", &self.env_lookup.is_some())
            .finish_non_exhaustive()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Show only the last four characters of a secret.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
