use std::sync::Arc;

use async_trait::async_trait;
use quack_models::{AgentData, AgentDecision, AgentOutput, MarketData};
use tracing::debug;

use crate::error::AgentError;
use crate::llm::ModelHandle;
use crate::parser::parse_agent_decision;
use crate::prompts::{analysis_prompt, debate_prompt, Persona};

/// Trait for trading agents. Mockable for testing.
#[async_trait]
pub trait TradingAgent: Send + Sync {
    fn name(&self) -> &str;

    /// First, independent opinion on the market.
    async fn analyze(
        &self,
        market: &MarketData,
        data: &AgentData,
    ) -> Result<AgentDecision, AgentError>;

    /// Debate turn: see the peers' outputs and keep or revise `own`.
    async fn reconsider(
        &self,
        market: &MarketData,
        own: &AgentOutput,
        peers: &[AgentOutput],
    ) -> Result<AgentDecision, AgentError>;
}

/// An agent backed by a hosted language model.
pub struct LlmAgent {
    persona: &'static Persona,
    model: ModelHandle,
}

impl LlmAgent {
    pub fn new(persona: &'static Persona, model: ModelHandle) -> Self {
        Self { persona, model }
    }

    pub fn persona(&self) -> &Persona {
        self.persona
    }

    pub fn model(&self) -> &str {
        self.model.model()
    }

    async fn ask(&self, prompt: String) -> Result<AgentDecision, AgentError> {
        debug!(agent = self.persona.name, model = self.model.model(), "Querying model");
        let value = self.model.generate_json(&prompt).await?;
        parse_agent_decision(&value)
    }
}

#[async_trait]
impl TradingAgent for LlmAgent {
    fn name(&self) -> &str {
        self.persona.name
    }

    async fn analyze(
        &self,
        market: &MarketData,
        data: &AgentData,
    ) -> Result<AgentDecision, AgentError> {
        self.ask(analysis_prompt(self.persona, market, data)?).await
    }

    async fn reconsider(
        &self,
        market: &MarketData,
        own: &AgentOutput,
        peers: &[AgentOutput],
    ) -> Result<AgentDecision, AgentError> {
        self.ask(debate_prompt(self.persona, market, own, peers)?).await
    }
}

/// Shared agent handle as stored by the orchestrator.
pub type SharedAgent = Arc<dyn TradingAgent>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::persona;
    use crate::test_support::ScriptedModel;
    use quack_models::Direction;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn market() -> MarketData {
        MarketData::new("ETH", dec!(2310.75))
    }

    #[tokio::test]
    async fn llm_agent_parses_model_answer() {
        let model = Arc::new(ScriptedModel::always(json!({
            "direction": "YES",
            "confidence": 0.7,
            "size": 800,
            "reasoning": "Higher lows on the daily chart"
        })));
        let agent = LlmAgent::new(
            persona("quant").unwrap(),
            ModelHandle::new(model.clone(), "google/gemini-1.5-pro"),
        );

        let decision = agent
            .analyze(&market(), &AgentData(json!({"historicalData": []})))
            .await
            .unwrap();

        assert_eq!(agent.name(), "quant");
        assert_eq!(decision.direction, Direction::Yes);
        assert_eq!(decision.size, dec!(800));

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains("quantitative analyst"));
        assert!(calls[0].0.contains("ETH"));
        assert_eq!(calls[0].1, "google/gemini-1.5-pro");
    }

    #[tokio::test]
    async fn llm_agent_reconsider_sends_debate_prompt() {
        let model = Arc::new(ScriptedModel::always(json!({
            "direction": "NO",
            "confidence": 0.55,
            "size": 0,
            "reasoning": "Risk manager's liquidity point is fair"
        })));
        let agent = LlmAgent::new(persona("macro").unwrap(), ModelHandle::new(model.clone(), "m"));
        let own = AgentOutput::new(
            "macro",
            AgentDecision {
                direction: Direction::Yes,
                confidence: dec!(0.6),
                size: dec!(500),
                reasoning: "Liquidity is expanding".to_string(),
            },
        );

        let revised = agent.reconsider(&market(), &own, &[]).await.unwrap();

        assert_eq!(revised.direction, Direction::No);
        assert!(model.calls()[0].0.contains("YOUR CURRENT POSITION"));
    }

    #[tokio::test]
    async fn llm_agent_rejects_malformed_answer() {
        let model = Arc::new(ScriptedModel::always(json!({"verdict": "buy"})));
        let agent = LlmAgent::new(persona("sentiment").unwrap(), ModelHandle::new(model, "m"));

        let err = agent
            .analyze(&market(), &AgentData(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }
}
