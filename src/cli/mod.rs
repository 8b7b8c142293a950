//! CLI for the waterdesk service

pub mod serve;

use clap::{Parser, Subcommand};

/// waterdesk - support chatbot for water treatment plant operations
#[derive(Parser)]
#[command(name = "waterdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the chat API server
    Serve,
}
