use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use ticketglass_core::reasoning::http::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_PROTOCOL_VERSION};
use ticketglass_core::{AgentConfig, ReasoningConfig, DEFAULT_REPETITION_THRESHOLD};

/// Contents of `ticketglass.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketGlassConfig {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub reasoning: ReasoningSection,
    #[serde(default)]
    pub agent: AgentSection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Demo tickets in memory, nothing persists
    #[default]
    Memory,
    /// redb file under `data_dir`
    Redb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Load the bundled demo tickets into an empty redb store on open.
    #[serde(default = "default_true")]
    pub seed_demo_data: bool,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            data_dir: default_data_dir(),
            seed_demo_data: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key. Unset means no key is sent.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_true")]
    pub model_in_body: bool,
}

impl Default for ReasoningSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            protocol_version: default_protocol_version(),
            max_tokens: default_max_tokens(),
            model_in_body: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Replaces the built-in system prompt when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_file: Option<PathBuf>,
    #[serde(default = "default_repetition_threshold")]
    pub repetition_threshold: f64,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            system_prompt_file: None,
            repetition_threshold: default_repetition_threshold(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_endpoint() -> String {
    ReasoningConfig::default().endpoint
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("TICKETGLASS_API_KEY".to_string())
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_repetition_threshold() -> f64 {
    DEFAULT_REPETITION_THRESHOLD
}

impl TicketGlassConfig {
    /// Parse a config file. Fails if it is missing or invalid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse a config file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage.data_dir.join("ticketglass.redb")
    }

    /// Human-readable problems; empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let endpoint = &self.reasoning.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(format!("reasoning.endpoint must be an http(s) URL, got '{}'", endpoint));
        }
        if self.reasoning.model.trim().is_empty() {
            errors.push("reasoning.model is empty".to_string());
        }
        if self.reasoning.protocol_version.trim().is_empty() {
            errors.push("reasoning.protocol_version is empty".to_string());
        }
        if self.reasoning.max_tokens == 0 {
            errors.push("reasoning.max_tokens must be greater than 0".to_string());
        }
        if let Some(var) = &self.reasoning.api_key_env {
            if var.trim().is_empty() {
                errors.push("reasoning.api_key_env is empty; remove it to send no key".to_string());
            }
        }

        let threshold = self.agent.repetition_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            errors.push(format!(
                "agent.repetition_threshold must be in (0, 1], got {}",
                threshold
            ));
        }
        if let Some(file) = &self.agent.system_prompt_file {
            if !file.is_file() {
                errors.push(format!(
                    "agent.system_prompt_file {} does not exist",
                    file.display()
                ));
            }
        }

        if self.storage.backend == Backend::Redb && self.storage.data_dir.as_os_str().is_empty() {
            errors.push("storage.data_dir is empty".to_string());
        }

        errors
    }

    /// Client settings, with the API key read from the configured variable.
    pub fn reasoning_config(&self) -> ReasoningConfig {
        let api_key = self
            .reasoning
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty());
        ReasoningConfig {
            endpoint: self.reasoning.endpoint.clone(),
            model: self.reasoning.model.clone(),
            api_key,
            protocol_version: self.reasoning.protocol_version.clone(),
            max_tokens: self.reasoning.max_tokens,
            model_in_body: self.reasoning.model_in_body,
        }
    }

    pub fn agent_config(&self) -> Result<AgentConfig> {
        let mut config = AgentConfig {
            repetition_threshold: self.agent.repetition_threshold,
            ..AgentConfig::default()
        };
        if let Some(file) = &self.agent.system_prompt_file {
            config.system_prompt = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read system prompt {}", file.display()))?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = TicketGlassConfig::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.storage.backend, Backend::Memory);
        assert_eq!(config.reasoning.max_tokens, 1024);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[storage]\nbackend = \"redb\"\ndata_dir = \"/tmp/tg\"\n\n[agent]\nrepetition_threshold = 0.8"
        )
        .unwrap();

        let config = TicketGlassConfig::load(file.path()).unwrap();
        assert_eq!(config.storage.backend, Backend::Redb);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/tg/ticketglass.redb"));
        assert!(config.storage.seed_demo_data);
        assert_eq!(config.agent.repetition_threshold, 0.8);
        assert_eq!(config.reasoning.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut config = TicketGlassConfig::default();
        config.reasoning.endpoint = "localhost:8089".to_string();
        config.reasoning.max_tokens = 0;
        config.agent.repetition_threshold = 1.5;
        config.agent.system_prompt_file = Some(PathBuf::from("/definitely/missing.txt"));

        let errors = config.validate();
        assert_eq!(errors.len(), 4, "{:?}", errors);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[storage\nbackend = ").unwrap();
        assert!(TicketGlassConfig::load(file.path()).is_err());
        assert!(TicketGlassConfig::load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_show_round_trips() {
        let config = TicketGlassConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: TicketGlassConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.reasoning.endpoint, config.reasoning.endpoint);
    }

    #[test]
    fn test_prompt_override() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Be brief.").unwrap();
        let mut config = TicketGlassConfig::default();
        config.agent.system_prompt_file = Some(file.path().to_path_buf());
        assert_eq!(config.agent_config().unwrap().system_prompt, "Be brief.");
    }
}
