//! CLI command definitions using clap.
//!
//! - ask: route a question (or send it straight to one specialist)
//! - route: show the routing decision only
//! - agents / tools: list the static roster and tool schemas
//! - scores: keyword-affinity scores per specialist
//! - tool: run one tool locally

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tutorlane - routes math and physics questions to tool-using specialists
#[derive(Parser, Debug)]
#[command(name = "tutorlane")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question
    Ask {
        /// The question text
        query: String,

        /// Skip routing and use this specialist (math, physics)
        #[arg(short, long)]
        agent: Option<String>,

        /// Print the full answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which specialist the router would choose
    Route {
        /// The question text
        query: String,
    },

    /// List specialists and their tools
    Agents,

    /// List tool schemas
    Tools,

    /// Keyword-affinity scores per specialist
    Scores {
        /// The question text
        query: String,
    },

    /// Run a tool directly
    Tool {
        /// Tool name (equation_solver, calculator, formula_lookup)
        name: String,

        /// Arguments as a JSON object
        args: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["tutorlane"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["tutorlane", "-v", "agents"]).unwrap();
        assert!(cli.is_verbose());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["tutorlane", "tools", "-c", "/path/to/tutorlane.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/tutorlane.yml")));
    }

    #[test]
    fn test_ask_command() {
        let cli = Cli::try_parse_from(["tutorlane", "ask", "Solve 2x + 5 = 15"]).unwrap();
        match cli.command {
            Commands::Ask { query, agent, json } => {
                assert_eq!(query, "Solve 2x + 5 = 15");
                assert!(agent.is_none());
                assert!(!json);
            }
            _ => panic!("Expected ask command"),
        }
    }

    #[test]
    fn test_ask_direct_with_json() {
        let cli = Cli::try_parse_from(["tutorlane", "ask", "What is F = ma?", "-a", "physics", "--json"]).unwrap();
        match cli.command {
            Commands::Ask { agent, json, .. } => {
                assert_eq!(agent.as_deref(), Some("physics"));
                assert!(json);
            }
            _ => panic!("Expected ask command"),
        }
    }

    #[test]
    fn test_route_command() {
        let cli = Cli::try_parse_from(["tutorlane", "route", "What is momentum?"]).unwrap();
        assert!(matches!(cli.command, Commands::Route { query } if query == "What is momentum?"));
    }

    #[test]
    fn test_listing_commands() {
        let cli = Cli::try_parse_from(["tutorlane", "agents"]).unwrap();
        assert!(matches!(cli.command, Commands::Agents));

        let cli = Cli::try_parse_from(["tutorlane", "tools"]).unwrap();
        assert!(matches!(cli.command, Commands::Tools));
    }

    #[test]
    fn test_scores_command() {
        let cli = Cli::try_parse_from(["tutorlane", "scores", "velocity of 5 m/s"]).unwrap();
        assert!(matches!(cli.command, Commands::Scores { .. }));
    }

    #[test]
    fn test_tool_command() {
        let cli = Cli::try_parse_from(["tutorlane", "tool", "calculator", r#"{"expression": "2+2"}"#]).unwrap();
        match cli.command {
            Commands::Tool { name, args } => {
                assert_eq!(name, "calculator");
                assert!(args.contains("expression"));
            }
            _ => panic!("Expected tool command"),
        }
    }

    #[test]
    fn test_help_works() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["tutorlane", "--version"]);
        // Version flag causes early exit with error (expected)
        assert!(result.is_err());
    }
}
