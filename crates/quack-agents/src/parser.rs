use std::str::FromStr;

use quack_models::{AgentDecision, Direction};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::AgentError;

/// Parse an agent's JSON completion into an [`AgentDecision`].
///
/// Accepts numbers or numeric strings for `confidence` and `size`.
/// Confidence above 1 but at most 100 is read as a percentage; the result is
/// clamped to `[0, 1]`. A negative size is rejected. `reasoning` may be absent.
pub fn parse_agent_decision(value: &Value) -> Result<AgentDecision, AgentError> {
    let obj = value.as_object().ok_or_else(|| {
        AgentError::Parse(format!("expected a JSON object, got: {value}"))
    })?;

    let direction = obj
        .get("direction")
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::Parse("Missing field: direction".to_string()))?;
    let direction = Direction::from_str(direction).map_err(AgentError::Parse)?;

    let mut confidence = decimal_field(value, "confidence")?;
    if confidence > Decimal::ONE && confidence <= Decimal::ONE_HUNDRED {
        confidence /= Decimal::ONE_HUNDRED;
    }
    let confidence = confidence.clamp(Decimal::ZERO, Decimal::ONE);

    let size = decimal_field(value, "size")?;
    if size < Decimal::ZERO {
        return Err(AgentError::Parse(format!("size must not be negative: {size}")));
    }

    let reasoning = match obj.get("reasoning") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Ok(AgentDecision {
        direction,
        confidence,
        size,
        reasoning,
    })
}

fn decimal_field(value: &Value, field: &str) -> Result<Decimal, AgentError> {
    let text = match value.get(field) {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().trim_start_matches('$').replace(',', ""),
        Some(other) => {
            return Err(AgentError::Parse(format!(
                "{field} must be a number, got: {other}"
            )))
        }
        None => return Err(AgentError::Parse(format!("Missing field: {field}"))),
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| AgentError::Parse(format!("{field}: {e} (value: {text})")))
}
