use quack_agents::{calculate_consensus, AgentError, Orchestrator};
use quack_models::{
    AgentOutput, ConsensusDecision, DecisionRequest, DecisionResponse, ValidationError,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, Instrument};
use uuid::Uuid;

/// Why a decision request produced no decision.
#[derive(Error, Debug)]
pub enum DecisionError {
    #[error("Invalid JSON input: {0}")]
    InvalidJson(serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Execution(#[from] AgentError),
}

/// A successful run: the consensus plus the debated agent outputs it came from.
#[derive(Debug, Clone)]
pub struct Decision {
    pub consensus: ConsensusDecision,
    pub agents: Vec<AgentOutput>,
}

impl From<Decision> for DecisionResponse {
    fn from(decision: Decision) -> Self {
        DecisionResponse::ok(decision.consensus, decision.agents)
    }
}

impl From<DecisionError> for DecisionResponse {
    fn from(e: DecisionError) -> Self {
        DecisionResponse::error(e.to_string())
    }
}

/// Collapse a pipeline result into the tagged response.
pub fn respond(result: Result<Decision, DecisionError>) -> DecisionResponse {
    match result {
        Ok(decision) => decision.into(),
        Err(e) => e.into(),
    }
}

/// Validates requests and runs agents → debate → consensus.
pub struct DecisionService {
    orchestrator: Orchestrator,
}

impl DecisionService {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Run the pipeline for an already-validated request.
    pub async fn decide(&self, request: &DecisionRequest) -> Result<Decision, AgentError> {
        let market = &request.market;

        info!(symbol = %market.symbol, "Running agents");
        let outputs = self.orchestrator.run_agents(market, &request.data).await?;
        info!(agents = outputs.len(), "Initial agent outputs received");

        info!("Running debate round");
        let outputs = self.orchestrator.debate(market, outputs).await?;
        info!("Debate round completed");

        let consensus = calculate_consensus(&outputs)?;
        info!(
            direction = %consensus.direction,
            size = %consensus.size,
            confidence = %consensus.confidence,
            "Consensus reached"
        );

        Ok(Decision {
            consensus,
            agents: outputs,
        })
    }

    /// Validate a raw `{market, data}` value and run the pipeline.
    pub async fn evaluate(&self, raw: &Value) -> Result<Decision, DecisionError> {
        let request = DecisionRequest::from_value(raw)?;
        Ok(self.decide(&request).await?)
    }

    /// Parse, validate and run a raw JSON request body.
    pub async fn evaluate_json(&self, input: &str) -> Result<Decision, DecisionError> {
        let raw: Value =
            serde_json::from_str(input.trim()).map_err(DecisionError::InvalidJson)?;
        self.evaluate(&raw).await
    }

    /// Like [`evaluate`](Self::evaluate), but always answers with a tagged
    /// response; failures never escape as errors.
    pub async fn process_decision(&self, raw: &Value) -> DecisionResponse {
        let request_id = Uuid::new_v4();
        let result = self
            .evaluate(raw)
            .instrument(tracing::info_span!("decision", %request_id))
            .await;
        log_failure(&result);
        respond(result)
    }

    /// Like [`evaluate_json`](Self::evaluate_json), but always answers with a
    /// tagged response.
    pub async fn process_json(&self, input: &str) -> DecisionResponse {
        let request_id = Uuid::new_v4();
        let result = self
            .evaluate_json(input)
            .instrument(tracing::info_span!("decision", %request_id))
            .await;
        log_failure(&result);
        respond(result)
    }
}

fn log_failure(result: &Result<Decision, DecisionError>) {
    if let Err(e) = result {
        error!(error = %e, "Error processing decision");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quack_agents::test_support::FixedAgent;
    use quack_agents::SharedAgent;
    use quack_models::{Direction, ResponseStatus};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::Arc;

    fn service(agents: Vec<Arc<FixedAgent>>) -> DecisionService {
        DecisionService::new(Orchestrator::new(
            agents.into_iter().map(|a| a as SharedAgent).collect(),
        ))
    }

    fn valid_request() -> Value {
        json!({
            "market": {"symbol": "BTC", "price": 43250.5},
            "data": {"portfolio": {"cash": 100000}}
        })
    }

    #[tokio::test]
    async fn success_bundles_consensus_and_debated_agents() {
        let quant = Arc::new(
            FixedAgent::yes("quant", dec!(0.8), dec!(1000)).revising_to(Direction::Yes, dec!(0.9)),
        );
        let risk = Arc::new(FixedAgent::no("risk", dec!(0.4)));
        let svc = service(vec![quant, risk]);

        let response = svc.process_decision(&valid_request()).await;

        assert_eq!(response.status, ResponseStatus::Ok);
        let decision = response.decision.unwrap();
        assert_eq!(decision.direction, Direction::Yes);
        assert_eq!(decision.size, dec!(1000));

        let agents = response.agents.unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].decision.confidence, dec!(0.9));
        assert_eq!(agents[1].agent, "risk");
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn invalid_market_skips_every_agent() {
        let quant = Arc::new(FixedAgent::yes("quant", dec!(0.8), dec!(1000)));
        let svc = service(vec![quant.clone()]);

        let response = svc
            .process_decision(&json!({"market": {"price": 10}, "data": {}}))
            .await;

        assert_eq!(response.status, ResponseStatus::Error);
        assert_eq!(
            response.error.as_deref(),
            Some("Invalid request: market must include symbol and price")
        );
        assert_eq!(quant.analyze_calls(), 0);
        assert_eq!(quant.reconsider_calls(), 0);
    }

    #[tokio::test]
    async fn missing_data_skips_every_agent() {
        let quant = Arc::new(FixedAgent::yes("quant", dec!(0.8), dec!(1000)));
        let svc = service(vec![quant.clone()]);

        let response = svc
            .process_decision(&json!({"market": {"symbol": "BTC", "price": 1}, "data": null}))
            .await;

        assert_eq!(response.error.as_deref(), Some("Invalid request: data is required"));
        assert_eq!(quant.analyze_calls(), 0);
    }

    #[tokio::test]
    async fn agent_failure_becomes_error_response() {
        let svc = service(vec![
            Arc::new(FixedAgent::yes("quant", dec!(0.8), dec!(1000))),
            Arc::new(FixedAgent::no("risk", dec!(0.4)).failing_analysis("model overloaded")),
        ]);

        let response = svc.process_decision(&valid_request()).await;

        assert_eq!(response.status, ResponseStatus::Error);
        assert_eq!(response.error.as_deref(), Some("model overloaded"));
        assert!(response.decision.is_none());
        assert!(response.agents.is_none());
    }

    #[tokio::test]
    async fn debate_failure_becomes_error_response() {
        let svc = service(vec![Arc::new(
            FixedAgent::yes("quant", dec!(0.8), dec!(1000)).failing_debate("timeout upstream"),
        )]);

        let response = svc.process_decision(&valid_request()).await;
        assert_eq!(response.error.as_deref(), Some("timeout upstream"));
    }

    #[tokio::test]
    async fn consensus_overflow_becomes_error_response() {
        let huge = dec!(50000000000000000000000000000);
        let svc = service(vec![
            Arc::new(FixedAgent::yes("quant", dec!(1), huge)),
            Arc::new(FixedAgent::yes("macro", dec!(1), huge)),
        ]);

        let response = svc
            .process_decision(&json!({"market": {"symbol": "BTC", "price": 1}, "data": {}}))
            .await;

        assert_eq!(response.status, ResponseStatus::Error);
        assert!(response.error.unwrap().contains("overflow"));
        assert!(response.decision.is_none());
    }

    #[tokio::test]
    async fn empty_roster_becomes_error_response() {
        let svc = service(vec![]);
        let response = svc.process_decision(&valid_request()).await;
        assert_eq!(response.error.as_deref(), Some("No agents configured"));
    }

    #[tokio::test]
    async fn malformed_json_is_reported() {
        let svc = service(vec![Arc::new(FixedAgent::no("risk", dec!(0.4)))]);

        let response = svc.process_json("{\"market\": ").await;
        assert_eq!(response.status, ResponseStatus::Error);
        assert!(response.error.unwrap().starts_with("Invalid JSON input:"));
    }

    #[tokio::test]
    async fn process_json_accepts_surrounding_whitespace() {
        let svc = service(vec![Arc::new(FixedAgent::no("risk", dec!(0.4)))]);

        let input = format!("\n  {}\n\n", valid_request());
        let response = svc.process_json(&input).await;
        assert!(response.is_ok());
        assert_eq!(response.decision.unwrap().direction, Direction::No);
    }

    #[tokio::test]
    async fn evaluate_distinguishes_error_kinds() {
        let svc = service(vec![Arc::new(
            FixedAgent::no("risk", dec!(0.4)).failing_analysis("down"),
        )]);

        assert!(matches!(
            svc.evaluate_json("nope").await,
            Err(DecisionError::InvalidJson(_))
        ));
        assert!(matches!(
            svc.evaluate(&json!({})).await,
            Err(DecisionError::Validation(ValidationError::InvalidMarket))
        ));
        assert!(matches!(
            svc.evaluate(&valid_request()).await,
            Err(DecisionError::Execution(_))
        ));
    }
}
