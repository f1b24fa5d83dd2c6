use chrono::Utc;
use quack_models::{AgentOutput, ConsensusDecision, Direction};
use rust_decimal::Decimal;

use crate::error::AgentError;

/// Reduce the debated agent outputs to one decision.
///
/// Confidence-weighted vote: the side with more total confidence wins, equal
/// weight falls back to head count, and a full tie resolves to `NO`. Size is
/// the confidence-weighted mean size of the winning side.
pub fn calculate_consensus(outputs: &[AgentOutput]) -> Result<ConsensusDecision, AgentError> {
    if outputs.is_empty() {
        return Err(AgentError::Consensus(
            "No agent outputs to aggregate".to_string(),
        ));
    }

    let weight = |direction: Direction| -> Result<Decimal, AgentError> {
        checked_sum(
            outputs
                .iter()
                .filter(|o| o.decision.direction == direction)
                .map(|o| Ok(o.decision.confidence)),
        )
    };
    let count = |direction: Direction| -> usize {
        outputs
            .iter()
            .filter(|o| o.decision.direction == direction)
            .count()
    };

    let yes_weight = weight(Direction::Yes)?;
    let no_weight = weight(Direction::No)?;

    let direction = if yes_weight != no_weight {
        if yes_weight > no_weight {
            Direction::Yes
        } else {
            Direction::No
        }
    } else if count(Direction::Yes) > count(Direction::No) {
        Direction::Yes
    } else {
        Direction::No
    };

    let winners: Vec<&AgentOutput> = outputs
        .iter()
        .filter(|o| o.decision.direction == direction)
        .collect();
    let winning_weight = weight(direction)?;

    let size = if winners.is_empty() {
        Decimal::ZERO
    } else if winning_weight.is_zero() {
        let total = checked_sum(winners.iter().map(|o| Ok(o.decision.size)))?;
        checked_div(total, Decimal::from(winners.len()))?
    } else {
        let weighted = checked_sum(winners.iter().map(|o| {
            o.decision
                .confidence
                .checked_mul(o.decision.size)
                .ok_or_else(overflow)
        }))?;
        checked_div(weighted, winning_weight)?
    };

    let total_weight = yes_weight.checked_add(no_weight).ok_or_else(overflow)?;
    let confidence = if total_weight.is_zero() {
        checked_div(Decimal::from(winners.len()), Decimal::from(outputs.len()))?
    } else {
        checked_div(winning_weight, total_weight)?
    };

    let names: Vec<&str> = winners.iter().map(|o| o.agent.as_str()).collect();
    let reasoning = format!(
        "{}/{} agents favor {} (weighted YES {} vs NO {}): {}",
        winners.len(),
        outputs.len(),
        direction,
        yes_weight.round_dp(2),
        no_weight.round_dp(2),
        names.join(", ")
    );

    Ok(ConsensusDecision {
        direction,
        size: size.round_dp(2),
        confidence: confidence.round_dp(4),
        reasoning,
        decided_at: Utc::now(),
    })
}

fn overflow() -> AgentError {
    AgentError::Consensus("Decimal overflow while aggregating agent outputs".to_string())
}

fn checked_sum(
    mut values: impl Iterator<Item = Result<Decimal, AgentError>>,
) -> Result<Decimal, AgentError> {
    values.try_fold(Decimal::ZERO, |acc, value| {
        acc.checked_add(value?).ok_or_else(overflow)
    })
}

fn checked_div(numerator: Decimal, denominator: Decimal) -> Result<Decimal, AgentError> {
    numerator.checked_div(denominator).ok_or_else(overflow)
}
