//! Test doubles for the model client and for agents.
//!
//! `ScriptedModel` stands in for a hosted model and records every prompt it
//! receives. `FixedAgent` skips the model entirely and returns canned
//! decisions, counting how often each stage called it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use quack_models::{AgentData, AgentDecision, AgentOutput, Direction, MarketData};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::agent::TradingAgent;
use crate::error::AgentError;
use crate::llm::LanguageModelClient;

pub const SCRIPTED_MODEL_ID: &str = "scripted/model";

type Responder = Box<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// A `LanguageModelClient` that answers from a closure.
pub struct ScriptedModel {
    responder: Responder,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    /// Answer each prompt with whatever `responder` returns. `Err` becomes an
    /// API error carrying the string as its message.
    pub fn responder<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(value: Value) -> Self {
        Self::responder(move |_| Ok(value.clone()))
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::responder(move |_| Err(message.clone()))
    }

    /// `(prompt, model)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModelClient for ScriptedModel {
    fn default_model(&self) -> &str {
        SCRIPTED_MODEL_ID
    }

    async fn complete_json(&self, prompt: &str, model: &str) -> Result<Value, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((prompt.to_string(), model.to_string()));
        }
        (self.responder)(prompt).map_err(|message| AgentError::Api {
            status: None,
            message,
        })
    }
}

/// A `TradingAgent` with canned answers.
pub struct FixedAgent {
    name: String,
    initial: AgentDecision,
    revised: Option<AgentDecision>,
    analysis_failure: Option<String>,
    debate_failure: Option<String>,
    panic_on_analyze: bool,
    analyze_calls: AtomicUsize,
    reconsider_calls: AtomicUsize,
    last_peers: Mutex<Vec<String>>,
}

impl FixedAgent {
    pub fn new(name: &str, initial: AgentDecision) -> Self {
        Self {
            name: name.to_string(),
            initial,
            revised: None,
            analysis_failure: None,
            debate_failure: None,
            panic_on_analyze: false,
            analyze_calls: AtomicUsize::new(0),
            reconsider_calls: AtomicUsize::new(0),
            last_peers: Mutex::new(Vec::new()),
        }
    }

    pub fn yes(name: &str, confidence: Decimal, size: Decimal) -> Self {
        Self::new(
            name,
            AgentDecision {
                direction: Direction::Yes,
                confidence,
                size,
                reasoning: format!("{name} favors the trade"),
            },
        )
    }

    pub fn no(name: &str, confidence: Decimal) -> Self {
        Self::new(
            name,
            AgentDecision {
                direction: Direction::No,
                confidence,
                size: Decimal::ZERO,
                reasoning: format!("{name} prefers to stay out"),
            },
        )
    }

    /// Change position during the debate round.
    pub fn revising_to(mut self, direction: Direction, confidence: Decimal) -> Self {
        let mut revised = self.initial.clone();
        revised.direction = direction;
        revised.confidence = confidence;
        revised.reasoning = format!("{} changed its mind", self.name);
        self.revised = Some(revised);
        self
    }

    pub fn failing_analysis(mut self, message: &str) -> Self {
        self.analysis_failure = Some(message.to_string());
        self
    }

    pub fn failing_debate(mut self, message: &str) -> Self {
        self.debate_failure = Some(message.to_string());
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_analyze = true;
        self
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn reconsider_calls(&self) -> usize {
        self.reconsider_calls.load(Ordering::SeqCst)
    }

    /// Peer names seen in the most recent debate turn.
    pub fn last_peers(&self) -> Vec<String> {
        self.last_peers.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

fn failure(message: &str) -> AgentError {
    AgentError::Api {
        status: None,
        message: message.to_string(),
    }
}

#[async_trait]
impl TradingAgent for FixedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(
        &self,
        _market: &MarketData,
        _data: &AgentData,
    ) -> Result<AgentDecision, AgentError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_analyze {
            panic!("{} blew up", self.name);
        }
        match &self.analysis_failure {
            Some(message) => Err(failure(message)),
            None => Ok(self.initial.clone()),
        }
    }

    async fn reconsider(
        &self,
        _market: &MarketData,
        own: &AgentOutput,
        peers: &[AgentOutput],
    ) -> Result<AgentDecision, AgentError> {
        self.reconsider_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_peers.lock() {
            *last = peers.iter().map(|p| p.agent.clone()).collect();
        }
        if let Some(message) = &self.debate_failure {
            return Err(failure(message));
        }
        Ok(self
            .revised
            .clone()
            .unwrap_or_else(|| own.decision.clone()))
    }
}
