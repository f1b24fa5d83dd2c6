//! Quack - multi-agent trading decisions
//!
//! A roster of persona agents, each backed by a hosted language model, gives
//! an independent YES/NO opinion on a market, revises it after seeing its
//! peers, and the revised opinions are folded into one weighted decision.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use quack::models::config::QuackConfig;
//! use serde_json::json;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let service = quack::build_service(&QuackConfig::default(), std::env::var("OPENROUTER_API_KEY").ok())?;
//! let response = service
//!     .process_decision(&json!({"market": {"symbol": "BTC", "price": 43250.5}, "data": {}}))
//!     .await;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

pub use quack_agents as agents;
pub use quack_models as models;

pub mod env;
pub mod server;
pub mod service;

use std::sync::Arc;

use anyhow::bail;
use quack_agents::prompts::persona;
use quack_agents::{
    LanguageModelClient, LlmAgent, ModelHandle, OpenRouterClient, OpenRouterConfig, Orchestrator,
    SharedAgent,
};
use quack_models::config::QuackConfig;

pub use service::{Decision, DecisionError, DecisionService};

/// Build the enabled agents of the roster, in roster order.
pub fn build_agents(
    config: &QuackConfig,
    client: Arc<dyn LanguageModelClient>,
) -> Result<Vec<SharedAgent>, anyhow::Error> {
    let mut agents: Vec<SharedAgent> = Vec::new();
    for entry in config.agents.roster.iter().filter(|a| a.enabled) {
        let Some(persona) = persona(&entry.name) else {
            bail!("Unknown agent persona: {}", entry.name);
        };
        let model = entry
            .model
            .clone()
            .unwrap_or_else(|| config.llm.default_model.clone());
        agents.push(Arc::new(LlmAgent::new(
            persona,
            ModelHandle::new(Arc::clone(&client), model),
        )));
    }
    Ok(agents)
}

/// Build an Orchestrator from configuration and a model client.
pub fn build_orchestrator(
    config: &QuackConfig,
    client: Arc<dyn LanguageModelClient>,
) -> Result<Orchestrator, anyhow::Error> {
    Ok(Orchestrator::new(build_agents(config, client)?))
}

/// Build the full decision service backed by OpenRouter.
///
/// A missing key is not an error here; it surfaces on the first model call.
pub fn build_service(
    config: &QuackConfig,
    api_key: Option<String>,
) -> Result<DecisionService, anyhow::Error> {
    let client = OpenRouterClient::new(OpenRouterConfig::from_llm_config(&config.llm, api_key))?;
    let orchestrator = build_orchestrator(config, Arc::new(client))?;
    Ok(DecisionService::new(orchestrator))
}
