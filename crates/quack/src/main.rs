use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quack::agents::openrouter::API_KEY_ENV;
use quack::models::config::QuackConfig;
use quack::models::DecisionResponse;
use quack::DecisionService;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quack", about = "Multi-agent trading decisions over a hosted language model")]
struct Cli {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Read the request JSON from a file instead of stdin
    #[arg(short, long)]
    input: Option<String>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve decisions over HTTP
    Serve {
        /// Address to bind, overriding `server.bind`
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);
    quack::env::load_env_file();

    match &cli.command {
        Some(Command::Serve { bind }) => match serve(&cli, bind.as_deref()).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Server failed");
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
        None => decide(&cli).await,
    }
}

fn init_tracing(json: bool) {
    // Logs go to stderr; stdout carries the response.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&str>) -> Result<QuackConfig> {
    let Some(path) = path else {
        return Ok(QuackConfig::default());
    };
    let config_str =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
    toml::from_str(&config_str).with_context(|| format!("Failed to parse config: {path}"))
}

fn api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok()
}

fn read_input(input: Option<&str>) -> Result<String> {
    if let Some(path) = input {
        return std::fs::read_to_string(path).with_context(|| format!("Failed to read input: {path}"));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read from stdin")?;
    Ok(buf)
}

fn prepare(cli: &Cli) -> Result<(DecisionService, String)> {
    let config = load_config(cli.config.as_deref())?;
    let service = quack::build_service(&config, api_key()).context("Failed to build service")?;
    let input = read_input(cli.input.as_deref())?;
    Ok((service, input))
}

async fn decide(cli: &Cli) -> ExitCode {
    let response = match prepare(cli) {
        Ok((service, input)) => service.process_json(&input).await,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Error processing decision");
            DecisionResponse::error(format!("{e:#}"))
        }
    };

    let output = if cli.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    };
    match output {
        Ok(line) => println!("{line}"),
        Err(e) => {
            eprintln!("Error: failed to serialize response: {e}");
            return ExitCode::FAILURE;
        }
    }

    if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn serve(cli: &Cli, bind: Option<&str>) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let service = quack::build_service(&config, api_key()).context("Failed to build service")?;
    let bind = bind.unwrap_or(&config.server.bind).to_string();
    quack::server::serve(Arc::new(service), &bind).await
}
