//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod ask;
pub mod batch;
pub mod compare;
pub mod index;

use crate::app::AppContext;
use crate::error::Result;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Index(args) => index::run(ctx, args),
        Commands::Ask(args) => ask::run(ctx, args),
        Commands::Batch(args) => batch::run(ctx, args),
        Commands::Compare(args) => compare::run(ctx, args),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the index from a chunk records file
    Index(index::IndexArgs),

    /// Answer one question
    Ask(ask::AskArgs),

    /// Answer a file of questions in every mode
    Batch(batch::BatchArgs),

    /// Compare top scores of every mode
    Compare(compare::CompareArgs),
}
