use crate::output::print_table;
use crate::types::OutputFormat;
use anyhow::Result;
use mods_sdk::{Calls, Client, QueryCache, SortBy};

pub struct CallsArgs {
    pub op: Vec<String>,
    pub input_refs: Vec<String>,
    pub roots_only: bool,
    pub limit: Option<usize>,
    pub sort: Vec<SortBy>,
    pub columns: Vec<String>,
    pub describe: bool,
    pub no_cache: bool,
}

pub fn handle(client: &Client, args: CallsArgs, format: OutputFormat) -> Result<()> {
    let calls = fetch(client, &args)?;

    if args.describe {
        println!("{}", calls);
        return Ok(());
    }
    print_table(calls.table(), "index", format)
}

fn fetch(client: &Client, args: &CallsArgs) -> Result<Calls> {
    let mut query = client
        .calls()
        .op(args.op.clone())
        .input_refs(args.input_refs.iter().cloned())
        .on_progress(|fetched| tracing::info!(fetched, "fetching calls"));
    if args.roots_only {
        query = query.trace_roots_only(true);
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }
    if !args.sort.is_empty() {
        query = query.sort_by(args.sort.clone());
    }
    if !args.columns.is_empty() {
        query = query.columns(args.columns.iter().cloned());
    }

    let cache = if args.no_cache {
        None
    } else {
        QueryCache::from_config(client.config())?
    };
    let calls = match cache {
        Some(cache) => query.fetch_cached(&cache)?,
        None => query.fetch()?,
    };
    Ok(calls)
}
