use crate::output::print_table;
use crate::types::OutputFormat;
use anyhow::Result;
use mods_sdk::{Client, QueryCache};

pub fn handle(client: &Client, refs: &[String], format: OutputFormat) -> Result<()> {
    let table = match QueryCache::from_config(client.config())? {
        Some(cache) => client.resolve_refs_cached(refs, &cache)?,
        None => client.resolve_refs(refs)?,
    };
    print_table(&table, "ref", format)
}
