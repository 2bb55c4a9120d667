//! Command-line argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "counsel")]
#[command(about = "Multi-model advisory council for startup questions")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a config file (overrides discovered configs)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ignore all config files and use built-in defaults
    #[arg(long, global = true)]
    pub no_config: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask an advisor and wait for the answer
    Run {
        /// Advisory domain: legal, finance, investor, competitor
        #[arg(short, long)]
        domain: String,

        /// The question to ask
        question: String,

        /// Document file(s) to include as context
        #[arg(long = "doc")]
        documents: Vec<PathBuf>,

        /// Name(s) to anonymize before prompts leave the system
        #[arg(long = "identifier")]
        identifiers: Vec<String>,

        /// Print the full task record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enqueue a task and print its id without waiting
    Submit {
        /// Advisory domain: legal, finance, investor, competitor
        #[arg(short, long)]
        domain: String,

        /// The question to ask
        question: String,

        /// Document file(s) to include as context
        #[arg(long = "doc")]
        documents: Vec<PathBuf>,

        /// Name(s) to anonymize before prompts leave the system
        #[arg(long = "identifier")]
        identifiers: Vec<String>,
    },

    /// Show the persisted state of a task
    Status {
        /// Task id returned by submit
        task_id: String,

        /// Print the full task record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stream a task's progress events until it finishes
    Watch {
        /// Task id returned by submit
        task_id: String,
    },

    /// Show where configuration is loaded from
    ConfigSources,
}
