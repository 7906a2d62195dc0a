mod cli;

use tabula::{config, demo};
use tabula_db::migration::Migrator;
use tabula_db::Store;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn open_store(config: &config::AppConfig, database: Option<PathBuf>) -> Result<Store> {
    let mut store_config = config.store.clone();
    if let Some(path) = database {
        store_config.location = path.to_string_lossy().into_owned();
    }

    tracing::info!("Opening database at {}", store_config.location);
    Store::from_config(&store_config)
        .with_context(|| format!("Failed to open database {}", store_config.location))
}

fn run_demo(config: &config::AppConfig, database: Option<PathBuf>, json: bool) -> Result<()> {
    let store = open_store(config, database)?;
    for line in demo::run_demo(&store, json)? {
        println!("{line}");
    }
    Ok(())
}

fn migrate(
    config: &config::AppConfig,
    name: &str,
    file: &Path,
    database: Option<PathBuf>,
) -> Result<()> {
    let sql = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read migration file: {:?}", file))?;

    let store = open_store(config, database)?;
    if Migrator::new(&store).apply(name, &sql)? {
        println!("Applied {name}");
    } else {
        println!("{name} is already applied");
    }
    Ok(())
}

fn list_migrations(config: &config::AppConfig, database: Option<PathBuf>) -> Result<()> {
    let store = open_store(config, database)?;
    let applied = Migrator::new(&store).applied()?;
    if applied.is_empty() {
        println!("No migrations applied");
    }
    for name in applied {
        println!("{name}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config_or_default(cli.config.as_deref())?;

    // Respect RUST_LOG env var if set, otherwise use the config filter
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tabula=trace,tabula_db=trace,tabula_core=debug".to_string()
        } else {
            config.log.filter.clone()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Demo { database, json } => run_demo(&config, database, json),
        Commands::Migrate {
            name,
            file,
            database,
        } => migrate(&config, &name, &file, database),
        Commands::Migrations { database } => list_migrations(&config, database),
        Commands::Version => {
            println!("tabula {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
