use clap::{Parser, Subcommand};

/// job-archiver - archives expired job postings of the recruitment portal
#[derive(Parser, Debug)]
#[command(name = "job-archiver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API and the hourly reconcile worker (default)
    Serve,

    /// Run one reconciliation sweep and exit
    Reconcile,

    /// Remove duplicate history records, keeping the most recent per job
    DedupeHistory,

    /// Apply database migrations and exit
    Migrate,
}

impl Cli {
    /// The requested command, `serve` when none is given
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}
