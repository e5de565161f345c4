//! CLI command definitions.

use clap::{Subcommand, ValueEnum};

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter workflow file
    Init {
        /// Overwrite an existing workflow file
        #[arg(long)]
        force: bool,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow file
        path: Option<String>,
    },

    /// List the jobs a workflow defines
    Jobs {
        /// Path to workflow file
        path: Option<String>,
    },

    /// Run the job matrix for a simulated repository event
    Run {
        /// Path to workflow file
        path: Option<String>,

        /// Head branch of the simulated pull request
        #[arg(short, long)]
        branch: Option<String>,

        /// Target branch of the simulated pull request
        #[arg(long, default_value = "main")]
        base: String,

        /// Revision to check out (defaults to the current HEAD)
        #[arg(short, long)]
        revision: Option<String>,

        /// Event kind to simulate
        #[arg(long, value_enum, default_value_t = EventKind::PullRequest)]
        event: EventKind,

        /// Run a single job by name
        #[arg(short, long)]
        job: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventKind {
    PullRequest,
    Push,
    Manual,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::PullRequest => "pull-request",
            EventKind::Push => "push",
            EventKind::Manual => "manual",
        };
        write!(f, "{}", s)
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Key
        key: String,

        /// Value
        value: String,
    },
}
