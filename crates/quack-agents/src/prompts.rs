use quack_models::{AgentData, AgentOutput, MarketData};

/// A built-in agent persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub name: &'static str,
    pub title: &'static str,
    pub focus: &'static str,
}

pub const PERSONAS: &[Persona] = &[
    Persona {
        name: "quant",
        title: "quantitative analyst",
        focus: "price action, momentum, volatility and volume. Use `historicalData` and \
                `marketData` when present; compare the current price with recent ranges \
                and moving averages you can derive from them.",
    },
    Persona {
        name: "fundamental",
        title: "fundamental analyst",
        focus: "valuation and intrinsic worth: market capitalization, adoption, supply \
                dynamics and any fundamentals present in `marketData`. Ignore short-term \
                noise.",
    },
    Persona {
        name: "sentiment",
        title: "sentiment analyst",
        focus: "crowd positioning: the `sentiment` block (news tone, social volume, \
                fear/greed readings). Contrarian signals at extremes are valid.",
    },
    Persona {
        name: "risk",
        title: "risk manager",
        focus: "capital preservation: position sizing against the `portfolio` (cash, \
                exposure, open positions), drawdown risk and liquidity. Prefer NO when \
                the downside is poorly bounded and keep sizes conservative.",
    },
    Persona {
        name: "macro",
        title: "macro strategist",
        focus: "the wider regime: rates, liquidity, risk-on/risk-off conditions and \
                cross-asset correlation, as far as the data allows.",
    },
];

/// Look up a persona by name.
pub fn persona(name: &str) -> Option<&'static Persona> {
    PERSONAS.iter().find(|p| p.name == name)
}

/// Output schema included in every agent prompt.
fn response_schema() -> String {
    let example = serde_json::json!({
        "direction": "YES | NO",
        "confidence": 0.65,
        "size": 2500,
        "reasoning": "<two or three sentences>"
    });
    serde_json::to_string_pretty(&example).unwrap_or_default()
}

fn schema_section() -> String {
    format!(
        "## RESPONSE FORMAT\n\n\
         Respond with a single JSON object:\n{}\n\n\
         - `direction`: \"YES\" to take the position, \"NO\" to stay out.\n\
         - `confidence`: number between 0 and 1.\n\
         - `size`: position size in US dollars (0 or more).\n\
         - `reasoning`: why, citing the data you used.",
        response_schema()
    )
}

fn pretty(value: &impl serde::Serialize) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Prompt for an agent's first, independent opinion.
pub fn analysis_prompt(
    persona: &Persona,
    market: &MarketData,
    data: &AgentData,
) -> Result<String, serde_json::Error> {
    Ok(format!(
        "You are the {title} on the investment committee of Quack, a multi-agent hedge fund. \
         Decide whether the fund should take a position in {symbol}.\n\n\
         Your focus is {focus}\n\n\
         ## MARKET\n\n{market}\n\n\
         ## DATA\n\n{data}\n\n\
         {schema}",
        title = persona.title,
        symbol = market.symbol,
        focus = persona.focus,
        market = pretty(market)?,
        data = pretty(data)?,
        schema = schema_section(),
    ))
}

/// Prompt for the debate round: the agent sees every peer's position and may
/// keep or revise its own.
pub fn debate_prompt(
    persona: &Persona,
    market: &MarketData,
    own: &AgentOutput,
    peers: &[AgentOutput],
) -> Result<String, serde_json::Error> {
    Ok(format!(
        "You are the {title} on the investment committee of Quack, a multi-agent hedge fund. \
         The committee is debating a position in {symbol}. Your focus is {focus}\n\n\
         ## MARKET\n\n{market}\n\n\
         ## YOUR CURRENT POSITION\n\n{own}\n\n\
         ## OTHER MEMBERS\n\n{peers}\n\n\
         Weigh the other members' arguments. Keep your position if their reasoning does not \
         change your view; otherwise revise direction, confidence or size. Mention which \
         arguments moved you, if any.\n\n\
         {schema}",
        title = persona.title,
        symbol = market.symbol,
        focus = persona.focus,
        market = pretty(market)?,
        own = pretty(&own.decision)?,
        peers = pretty(&peers)?,
        schema = schema_section(),
    ))
}
