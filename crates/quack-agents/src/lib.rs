pub mod agent;
pub mod consensus;
pub mod error;
pub mod llm;
pub mod openrouter;
pub mod orchestrator;
pub mod parser;
pub mod prompts;

pub mod test_support;

pub use agent::{LlmAgent, SharedAgent, TradingAgent};
pub use consensus::calculate_consensus;
pub use error::AgentError;
pub use llm::{LanguageModelClient, ModelHandle};
pub use openrouter::{OpenRouterClient, OpenRouterConfig};
pub use orchestrator::Orchestrator;
