use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tutorlane::agents::affinity_scores;
use tutorlane::{AgentId, AnthropicOracle, FinalAnswer, RoutingDecision, ToolCall, ToolRegistry, ToolResult, Tutor};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging(config: &Config, verbose: bool) -> Result<()> {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "info".to_string())
    };

    // RUST_LOG wins over the configured level
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));

    if config.log_to_file {
        let log_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tutorlane")
            .join("logs");

        fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

        let log_file = log_dir.join("tutorlane.log");
        let target = Box::new(
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .context("Failed to open log file")?,
        );
        builder.target(env_logger::Target::Pipe(target));
        builder.init();
        info!("Logging initialized, writing to: {}", log_file.display());
    } else {
        builder.init();
    }

    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    if cli.is_verbose() {
        eprintln!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Ask { query, agent, json } => handle_ask_command(query, agent.as_deref(), *json, config).await,
        Commands::Route { query } => handle_route_command(query, config).await,
        Commands::Agents => handle_agents_command(),
        Commands::Tools => handle_tools_command(),
        Commands::Scores { query } => handle_scores_command(query),
        Commands::Tool { name, args } => handle_tool_command(name, args),
    }
}

fn build_tutor(config: &Config) -> Result<Tutor<AnthropicOracle>> {
    let oracle = AnthropicOracle::new(config.anthropic_config()).context("Failed to create oracle client")?;
    let registry = ToolRegistry::standard().context("Failed to build tool registry")?;
    let tutor = Tutor::new(Arc::new(oracle), Arc::new(registry), config.to_tutor_config()?)
        .context("Failed to assemble tutor")?;
    Ok(tutor)
}

async fn handle_ask_command(query: &str, agent: Option<&str>, json: bool, config: &Config) -> Result<()> {
    let tutor = build_tutor(config)?;

    let answer = match agent {
        Some(name) => {
            let id: AgentId = name.parse().context("Invalid --agent")?;
            info!("Direct dispatch to {}", id);
            tutor.ask_direct(query, id).await
        }
        None => tutor.ask(query).await,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        print_answer(&answer);
    }
    Ok(())
}

fn print_answer(answer: &FinalAnswer) {
    let agent = answer
        .selected_agent
        .map(|id| id.display_name().to_string())
        .unwrap_or_else(|| "none".to_string());

    println!("{}", answer.text);
    println!();
    let summary = format!(
        "agent: {}  confidence: {:.2}  routing: {:.2}  latency: {}ms",
        agent, answer.confidence, answer.routing_confidence, answer.latency_ms
    );
    if answer.degraded {
        println!("{}", summary.red());
    } else {
        println!("{}", summary.dimmed());
    }
    if !answer.tools_used.is_empty() {
        println!("{} {}", "tools:".dimmed(), answer.tools_used.join(", "));
    }
}

async fn handle_route_command(query: &str, config: &Config) -> Result<()> {
    let tutor = build_tutor(config)?;
    let decision = tutor.routing_info(query).await.context("Routing failed")?;

    match &decision {
        RoutingDecision::Delegate { target, .. } => {
            println!("{} {}", "Delegate to:".green(), target.display_name());
        }
        RoutingDecision::Reject { .. } => {
            println!("{}", "Reject".red());
        }
    }
    println!("  Confidence: {:.2}", decision.confidence());
    println!("  Reasoning:  {}", decision.reasoning());
    Ok(())
}

fn handle_agents_command() -> Result<()> {
    for id in AgentId::all() {
        println!("{} ({})", id.display_name().green(), id.as_str());
        println!("  {}", id.description());
        println!("  {} {}", "tools:".dimmed(), id.tool_names().join(", "));
    }
    Ok(())
}

fn handle_tools_command() -> Result<()> {
    let registry = ToolRegistry::standard().context("Failed to build tool registry")?;
    for schema in registry.schemas() {
        println!("{}", schema.name.green());
        println!("  {}", schema.description);
        for param in &schema.parameters {
            let required = if param.required { "required" } else { "optional" };
            println!(
                "  - {} ({}, {}): {}",
                param.name.cyan(),
                param.param_type.as_str(),
                required,
                param.description
            );
        }
    }
    Ok(())
}

fn handle_scores_command(query: &str) -> Result<()> {
    for (id, score) in affinity_scores(query) {
        println!("{:<10} {:.2}", id.as_str(), score);
    }
    Ok(())
}

fn handle_tool_command(name: &str, args: &str) -> Result<()> {
    let arguments: serde_json::Value = serde_json::from_str(args).context("Tool arguments must be JSON")?;
    let registry = ToolRegistry::standard().context("Failed to build tool registry")?;

    let result = registry.execute(&ToolCall::new(name, arguments));
    println!("{}", serde_json::to_string_pretty(&result)?);

    match result {
        ToolResult::Ok { .. } => Ok(()),
        ToolResult::Err { error, .. } => Err(eyre!("{} failed: {}", name, error)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config, cli.is_verbose()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
