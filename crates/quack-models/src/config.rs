use serde::{Deserialize, Serialize};

/// Top-level configuration for Quack.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuackConfig {
    pub llm: LlmConfig,
    pub agents: AgentsConfig,
    pub server: ServerConfig,
}

/// Settings for the hosted chat-completion API.
///
/// The API key is deliberately absent: it comes from the environment and is
/// injected into the client at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    /// Model used by agents without an override.
    pub default_model: String,
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Sent as `HTTP-Referer` for OpenRouter attribution.
    pub referer: String,
    /// Sent as `X-Title` for OpenRouter attribution.
    pub title: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            default_model: "google/gemini-1.5-pro".to_string(),
            temperature: 0.7,
            timeout_seconds: 60,
            referer: "https://github.com/your-repo".to_string(),
            title: "Quack Hedge Fund Agent".to_string(),
        }
    }
}

/// The agent roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentsConfig {
    pub roster: Vec<AgentConfig>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        let roster = ["quant", "fundamental", "sentiment", "risk", "macro"]
            .into_iter()
            .map(|name| AgentConfig {
                name: name.to_string(),
                model: None,
                enabled: true,
            })
            .collect();
        Self { roster }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Persona name; must match one of the built-in personas.
    pub name: String,
    /// Override model for this agent. Falls back to `LlmConfig::default_model`.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8088".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_quack_config() {
        let config = QuackConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: QuackConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn default_roster_has_five_enabled_agents() {
        let agents = AgentsConfig::default();
        assert_eq!(agents.roster.len(), 5);
        assert!(agents.roster.iter().all(|a| a.enabled && a.model.is_none()));
    }

    #[test]
    fn default_llm_settings() {
        let llm = LlmConfig::default();
        assert_eq!(llm.default_model, "google/gemini-1.5-pro");
        assert_eq!(llm.temperature, 0.7);
        assert!(llm.endpoint.ends_with("/chat/completions"));
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[llm]
default_model = "anthropic/claude-3.5-sonnet"
timeout_seconds = 30

[[agents.roster]]
name = "quant"

[[agents.roster]]
name = "risk"
model = "openai/gpt-4o"
enabled = false

[server]
bind = "0.0.0.0:9000"
"#;

        let config: QuackConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.default_model, "anthropic/claude-3.5-sonnet");
        assert_eq!(config.llm.timeout_seconds, 30);
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.agents.roster.len(), 2);
        assert!(config.agents.roster[0].enabled);
        assert!(!config.agents.roster[1].enabled);
        assert_eq!(config.agents.roster[1].model.as_deref(), Some("openai/gpt-4o"));
        assert_eq!(config.server.bind, "0.0.0.0:9000");
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config: QuackConfig = toml::from_str("").unwrap();
        assert_eq!(config, QuackConfig::default());
    }
}
