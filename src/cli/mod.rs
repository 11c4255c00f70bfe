//! CLI module for tutorlane - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
