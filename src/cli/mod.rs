// src/cli/mod.rs
// CLI module for copycat commands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod detect;
pub mod history;
pub mod serve;

pub use detect::run_detect;
pub use history::run_history;
pub use serve::run_serve;

use crate::remote::DEFAULT_SERVER_URL;

#[derive(Parser)]
#[command(name = "copycat")]
#[command(about = "Find accounts that copied a tweet")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Address to bind (overrides COPYCAT_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides COPYCAT_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a detection against a running server
    Detect {
        /// Original tweet text
        #[arg(short, long)]
        text: Option<String>,

        /// Original tweet URL
        #[arg(short, long)]
        url: Option<String>,

        /// Original tweet date
        #[arg(short, long)]
        date: Option<String>,

        /// Server base URL
        #[arg(long, env = "COPYCAT_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
        server: String,

        /// Print the final result as JSON instead of a report.
        /// This is the `result` field of the done event, not the whole event.
        #[arg(long)]
        json: bool,

        /// Don't echo model output while it streams
        #[arg(short, long)]
        quiet: bool,
    },

    /// Manage saved tweet history
    History {
        /// Server base URL
        #[arg(long, env = "COPYCAT_SERVER_URL", default_value = DEFAULT_SERVER_URL, global = true)]
        server: String,

        /// Visitor id file (default: <data dir>/copycat/visitor_id)
        #[arg(long, global = true)]
        visitor_file: Option<PathBuf>,

        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List the most recent entries
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save an entry
    Add {
        /// Original text
        #[arg(long)]
        original: String,

        /// Improved text
        #[arg(long)]
        improved: String,

        /// Mark the entry as a thread
        #[arg(long)]
        thread: bool,

        /// Generation mode
        #[arg(long)]
        mode: Option<String>,
    },

    /// Delete an entry by id
    Delete {
        #[arg(index = 1)]
        id: String,
    },
}
