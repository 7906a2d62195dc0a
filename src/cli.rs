use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(author, version, about = "Pooled SQLite access with undoable CRUD commands")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the create/list/update/delete/undo walkthrough
    Demo {
        /// Database file (overrides the config file)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a SQL migration file once, recorded under NAME
    Migrate {
        /// Migration name
        #[arg(required = true)]
        name: String,

        /// File containing the migration SQL
        #[arg(required = true)]
        file: PathBuf,

        /// Database file (overrides the config file)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// List applied migrations
    Migrations {
        /// Database file (overrides the config file)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show version information
    Version,
}
