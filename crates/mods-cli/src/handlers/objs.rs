use crate::output::{print_json, print_table};
use crate::types::OutputFormat;
use anyhow::Result;
use mods_sdk::{Client, Obj, Table};
use serde_json::{Value, json};

pub fn handle(
    client: &Client,
    types: &[String],
    latest_only: bool,
    format: OutputFormat,
) -> Result<()> {
    let types: Vec<&str> = types.iter().map(String::as_str).collect();
    let types = if types.is_empty() {
        None
    } else {
        Some(types.as_slice())
    };
    let objs = client.get_objs(types, latest_only)?;

    match format {
        OutputFormat::Json => print_json(&objs),
        _ => print_table(&objs_table(&objs)?, "index", format),
    }
}

fn objs_table(objs: &[Obj]) -> Result<Table> {
    let columns = ["label", "class", "created_at", "uri"];
    let mut table = Table::new(columns.into_iter().map(String::from).collect());
    for obj in objs {
        table.push_row(vec![
            json!(obj.label()),
            obj.base_object_class
                .as_ref()
                .map_or(Value::Null, |c| json!(c)),
            json!(obj.created_at.to_rfc3339()),
            json!(obj.uri()),
        ])?;
    }
    Ok(table)
}
