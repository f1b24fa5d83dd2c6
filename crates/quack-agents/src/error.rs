use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(
        "OPENROUTER_API_KEY environment variable is not set. \
         Please set it in your .env file or environment variables."
    )]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error reported by the model API; the message is passed through verbatim.
    #[error("{message}")]
    Api { status: Option<u16>, message: String },

    #[error("No content in model response. Response structure: {0}")]
    NoContent(String),

    #[error("Failed to parse JSON response from model. Content: {0}...")]
    InvalidJson(String),

    #[error("Agent response parse error: {0}")]
    Parse(String),

    #[error("No agents configured")]
    NoAgents,

    #[error("Agent {agent} failed: {reason}")]
    Agent { agent: String, reason: String },

    #[error("{0}")]
    Consensus(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
