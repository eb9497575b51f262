pub mod commands;

use clap::{Parser, Subcommand};

use crate::fetcher::batch::DEFAULT_WORKERS;

#[derive(Parser)]
#[command(name = "kindling")]
#[command(about = "A terminal Hacker News reader", long_about = None)]
pub struct Cli {
    /// Number of parallel workers for fetching items
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, global = true)]
    pub workers: usize,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the TUI (the default when no subcommand is given)
    Tui,
    /// Print the first page of new stories
    News,
    /// Print the first page of job postings
    Jobs,
    /// Fetch and print the demo poll with its options
    Poll,
    /// Watch both listings and print a line whenever new content appears
    Watch,
}
