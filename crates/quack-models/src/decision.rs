use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Directional call on a market. `Yes` takes the position, `No` stays out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Yes,
    No,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Yes => "YES",
            Direction::No => "NO",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" => Ok(Direction::Yes),
            "NO" => Ok(Direction::No),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// One agent's recommendation for one round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentDecision {
    pub direction: Direction,
    /// 0.0 to 1.0.
    pub confidence: Decimal,
    /// Position size in currency units.
    pub size: Decimal,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentOutput {
    pub agent: String,
    pub decision: AgentDecision,
}

impl AgentOutput {
    pub fn new(agent: impl Into<String>, decision: AgentDecision) -> Self {
        Self {
            agent: agent.into(),
            decision,
        }
    }
}

/// Aggregated outcome across all agents after the debate round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusDecision {
    pub direction: Direction,
    pub size: Decimal,
    /// Share of total confidence weight behind `direction`.
    pub confidence: Decimal,
    pub reasoning: String,
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Tagged response written to stdout or returned over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<ConsensusDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<AgentOutput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DecisionResponse {
    pub fn ok(decision: ConsensusDecision, agents: Vec<AgentOutput>) -> Self {
        Self {
            status: ResponseStatus::Ok,
            decision: Some(decision),
            agents: Some(agents),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            decision: None,
            agents: None,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }
}
