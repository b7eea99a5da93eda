//! Config defaults: applies sensible default values to parsed config.

use crate::schema::{LoggingConfig, OllamaConfig, ScribbleConfig, ServerConfig};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const DEFAULT_MODEL: &str = "llava";

/// Hard deadline for a guess request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Low randomness keeps the two-line format stable.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 50;

pub const DEFAULT_KEEP_ALIVE: &str = "10m";

pub const DEFAULT_BIND: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: ScribbleConfig) -> ScribbleConfig {
    let config = apply_ollama_defaults(config);
    let config = apply_server_defaults(config);
    apply_logging_defaults(config)
}

fn apply_ollama_defaults(mut config: ScribbleConfig) -> ScribbleConfig {
    let ollama = config.ollama.get_or_insert_with(OllamaConfig::default);
    ollama
        .base_url
        .get_or_insert_with(|| DEFAULT_OLLAMA_URL.to_string());
    ollama.model.get_or_insert_with(|| DEFAULT_MODEL.to_string());
    ollama.timeout_secs.get_or_insert(DEFAULT_TIMEOUT_SECS);
    ollama.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    ollama.max_output_tokens.get_or_insert(DEFAULT_MAX_OUTPUT_TOKENS);
    ollama
        .keep_alive
        .get_or_insert_with(|| DEFAULT_KEEP_ALIVE.to_string());
    config
}

fn apply_server_defaults(mut config: ScribbleConfig) -> ScribbleConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server.max_body_bytes.get_or_insert(DEFAULT_MAX_BODY_BYTES);
    config
}

fn apply_logging_defaults(mut config: ScribbleConfig) -> ScribbleConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}
