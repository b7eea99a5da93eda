//! Scribble runtime configuration schema.
//!
//! Every field is optional on disk; `defaults::apply_all_defaults` fills the
//! gaps and the accessors below fall back to the same constants.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::defaults::{
    DEFAULT_BIND, DEFAULT_KEEP_ALIVE, DEFAULT_LOG_LEVEL, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_PORT,
    DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScribbleConfig {
    /// Vision model backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama: Option<OllamaConfig>,

    /// HTTP gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Logging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl ScribbleConfig {
    pub fn ollama(&self) -> OllamaConfig {
        self.ollama.clone().unwrap_or_default()
    }

    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OllamaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Hard deadline for one guess request, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// How long the backend keeps the model loaded between calls ("10m", "-1").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

impl OllamaConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS)
    }

    pub fn keep_alive(&self) -> &str {
        self.keep_alive.as_deref().unwrap_or(DEFAULT_KEEP_ALIVE)
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Largest accepted request body; canvas snapshots can be several MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_body_bytes: Option<usize>,
}

impl ServerConfig {
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind(), self.port())
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rolling JSON log; console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
ollama:
  baseUrl: http://gpu-box:11434
  model: llava:13b
  timeoutSecs: 30
server:
  port: 8080
"#;
        let config: ScribbleConfig = serde_yaml::from_str(yaml).unwrap();
        let ollama = config.ollama();
        assert_eq!(ollama.base_url(), "http://gpu-box:11434");
        assert_eq!(ollama.model(), "llava:13b");
        assert_eq!(ollama.timeout(), Duration::from_secs(30));
        assert_eq!(config.server().port(), 8080);
        assert_eq!(config.server().bind(), DEFAULT_BIND);
    }

    #[test]
    fn accessors_fall_back_to_defaults() {
        let config = ScribbleConfig::default();
        assert_eq!(config.ollama().timeout(), Duration::from_secs(120));
        assert_eq!(config.ollama().keep_alive(), "10m");
        assert_eq!(config.logging().level(), "info");
    }
}
