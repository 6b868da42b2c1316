use crate::output::{print_json, print_table};
use crate::types::OutputFormat;
use anyhow::{Result, bail};
use mods_sdk::{Client, Op, Table};
use serde_json::{Value, json};

pub fn handle_list(client: &Client, latest_only: bool, format: OutputFormat) -> Result<()> {
    let ops = client.get_ops(latest_only)?;
    render(&ops, format)
}

pub fn handle_versions(
    client: &Client,
    name: &str,
    counts: bool,
    format: OutputFormat,
) -> Result<()> {
    let Some(op) = client.get_ops(true)?.into_iter().find(|op| op.name == name) else {
        bail!("op not found: {}", name);
    };
    let versions = client.get_op_versions(&op, counts)?;
    render(&versions, format)
}

fn render(ops: &[Op], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(ops),
        _ => print_table(&ops_table(ops)?, "index", format),
    }
}

fn ops_table(ops: &[Op]) -> Result<Table> {
    let with_counts = ops.iter().any(|op| op.call_count.is_some());
    let mut columns = vec!["label", "name", "version", "digest"];
    if with_counts {
        columns.push("calls");
    }
    let mut table = Table::new(columns.into_iter().map(String::from).collect());
    for op in ops {
        let mut row = vec![
            json!(op.label()),
            json!(op.name),
            json!(op.version_index),
            json!(op.digest),
        ];
        if with_counts {
            row.push(op.call_count.map_or(Value::Null, |n| json!(n)));
        }
        table.push_row(row)?;
    }
    Ok(table)
}
