pub mod config;
pub mod decision;
pub mod market;
pub mod request;

pub use config::{AgentConfig, AgentsConfig, LlmConfig, QuackConfig, ServerConfig};
pub use decision::{
    AgentDecision, AgentOutput, ConsensusDecision, DecisionResponse, Direction, ResponseStatus,
};
pub use market::{AgentData, MarketData};
pub use request::{DecisionRequest, ValidationError};
