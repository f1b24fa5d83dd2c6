use std::sync::Arc;
use std::time::Instant;

use quack_models::{AgentData, AgentDecision, AgentOutput, MarketData};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::agent::SharedAgent;
use crate::error::AgentError;

type AgentTask = JoinHandle<Result<AgentDecision, AgentError>>;

/// Runs the agent roster: the initial fan-out and the debate round.
pub struct Orchestrator {
    agents: Vec<SharedAgent>,
}

impl Orchestrator {
    pub fn new(agents: Vec<SharedAgent>) -> Self {
        Self { agents }
    }

    pub fn agents(&self) -> &[SharedAgent] {
        &self.agents
    }

    /// Ask every agent for an independent decision, concurrently.
    ///
    /// Outputs come back in roster order. Any failing agent fails the whole
    /// stage; the first failure in roster order is returned.
    pub async fn run_agents(
        &self,
        market: &MarketData,
        data: &AgentData,
    ) -> Result<Vec<AgentOutput>, AgentError> {
        if self.agents.is_empty() {
            return Err(AgentError::NoAgents);
        }

        let tasks = self
            .agents
            .iter()
            .map(|agent| {
                let agent = Arc::clone(agent);
                let market = market.clone();
                let data = data.clone();
                let name = agent.name().to_string();
                let handle: AgentTask =
                    tokio::spawn(async move { agent.analyze(&market, &data).await });
                (name, handle)
            })
            .collect();

        collect_outputs("analysis", tasks).await
    }

    /// One debate round.
    ///
    /// Each agent sees its own output and every peer's, and returns a
    /// possibly revised decision. Output order and length match `outputs`.
    pub async fn debate(
        &self,
        market: &MarketData,
        outputs: Vec<AgentOutput>,
    ) -> Result<Vec<AgentOutput>, AgentError> {
        // Resolve every debater before any turn is spawned.
        let debaters = outputs
            .iter()
            .enumerate()
            .map(|(i, own)| self.debater(i, &own.agent))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tasks = Vec::with_capacity(outputs.len());
        for (i, (own, agent)) in outputs.iter().zip(debaters).enumerate() {
            let peers: Vec<AgentOutput> = outputs
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, o)| o.clone())
                .collect();
            let own = own.clone();
            let name = own.agent.clone();
            let market = market.clone();

            let handle: AgentTask =
                tokio::spawn(async move { agent.reconsider(&market, &own, &peers).await });
            tasks.push((name, handle));
        }

        collect_outputs("debate", tasks).await
    }

    /// The agent that produced output `index`: the roster slot at the same
    /// position when its name matches, else the first agent with that name.
    fn debater(&self, index: usize, name: &str) -> Result<SharedAgent, AgentError> {
        self.agents
            .get(index)
            .filter(|a| a.name() == name)
            .or_else(|| self.agents.iter().find(|a| a.name() == name))
            .map(Arc::clone)
            .ok_or_else(|| AgentError::Agent {
                agent: name.to_string(),
                reason: "not on the roster".to_string(),
            })
    }
}

/// Await every task in order and pair results with agent names.
async fn collect_outputs(
    stage: &str,
    tasks: Vec<(String, AgentTask)>,
) -> Result<Vec<AgentOutput>, AgentError> {
    let start = Instant::now();
    let mut outputs = Vec::with_capacity(tasks.len());
    let mut first_error: Option<AgentError> = None;

    for (name, handle) in tasks {
        match handle.await {
            Ok(Ok(decision)) => {
                info!(
                    stage,
                    agent = %name,
                    direction = %decision.direction,
                    confidence = %decision.confidence,
                    size = %decision.size,
                    "Agent responded"
                );
                outputs.push(AgentOutput::new(name, decision));
            }
            Ok(Err(e)) => {
                warn!(stage, agent = %name, error = %e, "Agent failed");
                first_error.get_or_insert(e);
            }
            Err(e) => {
                error!(stage, agent = %name, error = %e, "Agent task panicked");
                first_error.get_or_insert(AgentError::Agent {
                    agent: name,
                    reason: format!("task panicked: {e}"),
                });
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    info!(
        stage,
        agents = outputs.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Stage complete"
    );
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedAgent;
    use quack_models::Direction;
    use rust_decimal_macros::dec;

    fn market() -> MarketData {
        MarketData::new("BTC", dec!(43000))
    }

    fn data() -> AgentData {
        AgentData(serde_json::json!({}))
    }

    fn roster(agents: Vec<Arc<FixedAgent>>) -> Orchestrator {
        Orchestrator::new(agents.into_iter().map(|a| a as SharedAgent).collect())
    }

    #[tokio::test]
    async fn run_agents_preserves_roster_order() {
        let orchestrator = roster(vec![
            Arc::new(FixedAgent::yes("quant", dec!(0.8), dec!(1000))),
            Arc::new(FixedAgent::no("risk", dec!(0.6))),
            Arc::new(FixedAgent::yes("macro", dec!(0.5), dec!(400))),
        ]);

        let outputs = orchestrator.run_agents(&market(), &data()).await.unwrap();

        let names: Vec<&str> = outputs.iter().map(|o| o.agent.as_str()).collect();
        assert_eq!(names, vec!["quant", "risk", "macro"]);
        assert_eq!(outputs[1].decision.direction, Direction::No);
    }

    #[tokio::test]
    async fn run_agents_fails_when_any_agent_fails() {
        let ok = Arc::new(FixedAgent::yes("quant", dec!(0.8), dec!(1000)));
        let bad = Arc::new(FixedAgent::yes("risk", dec!(0.6), dec!(0)).failing_analysis("boom"));
        let orchestrator = roster(vec![ok.clone(), bad]);

        let err = orchestrator.run_agents(&market(), &data()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(ok.analyze_calls(), 1);
    }

    #[tokio::test]
    async fn run_agents_reports_first_failure_in_roster_order() {
        let orchestrator = roster(vec![
            Arc::new(FixedAgent::yes("quant", dec!(0.8), dec!(1)).failing_analysis("first")),
            Arc::new(FixedAgent::yes("risk", dec!(0.8), dec!(1)).failing_analysis("second")),
        ]);

        let err = orchestrator.run_agents(&market(), &data()).await.unwrap_err();
        assert_eq!(err.to_string(), "first");
    }

    #[tokio::test]
    async fn panicking_agent_becomes_an_error() {
        let orchestrator = roster(vec![Arc::new(
            FixedAgent::yes("quant", dec!(0.8), dec!(1)).panicking(),
        )]);

        let err = orchestrator.run_agents(&market(), &data()).await.unwrap_err();
        assert!(matches!(err, AgentError::Agent { ref agent, .. } if agent == "quant"));
    }

    #[tokio::test]
    async fn empty_roster_is_an_error() {
        let orchestrator = Orchestrator::new(vec![]);
        let err = orchestrator.run_agents(&market(), &data()).await.unwrap_err();
        assert!(matches!(err, AgentError::NoAgents));
    }

    #[tokio::test]
    async fn debate_revises_each_agent_once_in_order() {
        let quant = Arc::new(
            FixedAgent::yes("quant", dec!(0.8), dec!(1000)).revising_to(Direction::No, dec!(0.4)),
        );
        let risk = Arc::new(FixedAgent::no("risk", dec!(0.6)));
        let orchestrator = roster(vec![quant.clone(), risk.clone()]);

        let initial = orchestrator.run_agents(&market(), &data()).await.unwrap();
        let debated = orchestrator.debate(&market(), initial).await.unwrap();

        assert_eq!(debated.len(), 2);
        assert_eq!(debated[0].agent, "quant");
        assert_eq!(debated[0].decision.direction, Direction::No);
        assert_eq!(debated[0].decision.confidence, dec!(0.4));
        assert_eq!(debated[1].agent, "risk");
        assert_eq!(quant.reconsider_calls(), 1);
        assert_eq!(risk.reconsider_calls(), 1);
    }

    #[tokio::test]
    async fn debate_shows_each_agent_its_peers() {
        let quant = Arc::new(FixedAgent::yes("quant", dec!(0.8), dec!(1000)));
        let risk = Arc::new(FixedAgent::no("risk", dec!(0.6)));
        let macro_agent = Arc::new(FixedAgent::no("macro", dec!(0.5)));
        let orchestrator = roster(vec![quant.clone(), risk, macro_agent]);

        let initial = orchestrator.run_agents(&market(), &data()).await.unwrap();
        orchestrator.debate(&market(), initial).await.unwrap();

        assert_eq!(quant.last_peers(), vec!["risk".to_string(), "macro".to_string()]);
    }

    #[tokio::test]
    async fn debate_rejects_unknown_agent() {
        let orchestrator = roster(vec![Arc::new(FixedAgent::no("risk", dec!(0.6)))]);
        let stray = vec![AgentOutput::new(
            "ghost",
            AgentDecision {
                direction: Direction::Yes,
                confidence: dec!(0.5),
                size: dec!(1),
                reasoning: String::new(),
            },
        )];

        let err = orchestrator.debate(&market(), stray).await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn debate_failure_fails_the_stage() {
        let orchestrator = roster(vec![
            Arc::new(FixedAgent::yes("quant", dec!(0.8), dec!(1)).failing_debate("rate limited")),
            Arc::new(FixedAgent::no("risk", dec!(0.6))),
        ]);

        let initial = orchestrator.run_agents(&market(), &data()).await.unwrap();
        let err = orchestrator.debate(&market(), initial).await.unwrap_err();
        assert_eq!(err.to_string(), "rate limited");
    }

    #[tokio::test]
    async fn debate_keeps_same_named_agents_apart() {
        let cautious = Arc::new(
            FixedAgent::yes("quant", dec!(0.8), dec!(1000)).revising_to(Direction::No, dec!(0.3)),
        );
        let bold = Arc::new(FixedAgent::yes("quant", dec!(0.6), dec!(500)));
        let orchestrator = roster(vec![cautious.clone(), bold.clone()]);

        let initial = orchestrator.run_agents(&market(), &data()).await.unwrap();
        let debated = orchestrator.debate(&market(), initial).await.unwrap();

        assert_eq!(cautious.reconsider_calls(), 1);
        assert_eq!(bold.reconsider_calls(), 1);
        assert_eq!(debated[0].decision.direction, Direction::No);
        assert_eq!(debated[1].decision.direction, Direction::Yes);
        assert_eq!(debated[1].decision.size, dec!(500));
    }

    #[tokio::test]
    async fn unknown_debater_starts_no_turns() {
        let risk = Arc::new(FixedAgent::no("risk", dec!(0.6)));
        let orchestrator = roster(vec![risk.clone()]);
        let mut outputs = orchestrator.run_agents(&market(), &data()).await.unwrap();
        let copied = outputs[0].decision.clone();
        outputs.push(AgentOutput::new("ghost", copied));

        let err = orchestrator.debate(&market(), outputs).await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
        assert_eq!(risk.reconsider_calls(), 0);
    }
}
