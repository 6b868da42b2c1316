use crate::args::{Cli, Commands};
use crate::handlers;
use crate::handlers::calls::CallsArgs;
use crate::types::LogLevel;
use anyhow::{Result, anyhow};
use mods_index::SqliteStore;
use mods_sdk::{Client, Config, resolve_data_dir};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DB_FILE: &str = "mods.db";
const CONFIG_FILE: &str = "config.toml";

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_level);

    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    let config = load_config(&data_dir)?;
    let db_path = data_dir.join(DB_FILE);
    let store = Arc::new(
        SqliteStore::open(&db_path, &cli.project)
            .map_err(|e| anyhow!("failed to open store at {}: {}", db_path.display(), e))?,
    );
    tracing::debug!(path = %db_path.display(), project = %cli.project, "opened store");

    let format = cli.format;
    let client = || Client::new(store.clone()).with_config(config.clone());

    match cli.command {
        Commands::Import { file } => handlers::import::handle(&store, &file, format),
        Commands::Calls {
            op,
            input_refs,
            roots_only,
            limit,
            sort,
            column,
            describe,
            no_cache,
        } => {
            let args = CallsArgs {
                op,
                input_refs,
                roots_only,
                limit,
                sort,
                columns: column,
                describe,
                no_cache,
            };
            handlers::calls::handle(&client(), args, format)
        }
        Commands::Ops { all_versions } => {
            handlers::ops::handle_list(&client(), !all_versions, format)
        }
        Commands::OpVersions { name, counts } => {
            handlers::ops::handle_versions(&client(), &name, counts, format)
        }
        Commands::Objs {
            types,
            all_versions,
        } => handlers::objs::handle(&client(), &types, !all_versions, format),
        Commands::Resolve { refs } => handlers::resolve::handle(&client(), &refs, format),
    }
}

/// Loads `<data_dir>/config.toml`; a disk cache without an explicit dir lives under `data_dir`.
fn load_config(data_dir: &Path) -> Result<Config> {
    let mut config = Config::load_from(&data_dir.join(CONFIG_FILE))?;
    if config.cache.dir.is_none() {
        config.cache.dir = Some(data_dir.join("cache"));
    }
    Ok(config)
}

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "mods_cli={0},mods_sdk={0},mods_index={0}",
            level
        ))
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
