use crate::types::OutputFormat;
use anyhow::Result;
use mods_sdk::Table;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{self, Write};

const MAX_CELL_WIDTH: usize = 60;

/// Cell text for plain and CSV output: strings unquoted, null empty, the rest as JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", truncated)
}

/// Header plus rows, with the table index (if any) as a leading `index` column.
fn grid(table: &Table, index_name: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut header = Vec::with_capacity(table.width() + 1);
    if table.index().is_some() {
        header.push(index_name.to_string());
    }
    header.extend(table.columns().iter().cloned());

    let rows = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut cells = Vec::with_capacity(header.len());
            if let Some(index) = table.index() {
                cells.push(index.get(i).cloned().unwrap_or_default());
            }
            cells.extend(row.iter().map(cell_text));
            cells
        })
        .collect();
    (header, rows)
}

pub fn write_plain_table<W: Write>(out: &mut W, table: &Table, index_name: &str) -> Result<()> {
    let (header, rows) = grid(table, index_name);
    if header.is_empty() {
        writeln!(out, "(no rows)")?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = rows
        .into_iter()
        .map(|row| row.iter().map(|c| truncate(c, MAX_CELL_WIDTH)).collect())
        .collect();
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    writeln!(out, "{}", line(&header))?;
    for row in &rows {
        writeln!(out, "{}", line(row))?;
    }
    Ok(())
}

pub fn write_csv_table<W: Write>(out: W, table: &Table, index_name: &str) -> Result<()> {
    let (header, rows) = grid(table, index_name);
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(&header)?;
    for row in rows {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Table rows as JSON objects; the index becomes an `index_name` field.
pub fn table_records(table: &Table, index_name: &str) -> Vec<Map<String, Value>> {
    let records = table.to_records();
    let Some(index) = table.index() else {
        return records;
    };
    records
        .into_iter()
        .zip(index)
        .map(|(record, idx)| {
            let mut keyed = Map::with_capacity(record.len() + 1);
            keyed.insert(index_name.to_string(), Value::String(idx.clone()));
            keyed.extend(record);
            keyed
        })
        .collect()
}

pub fn print_table(table: &Table, index_name: &str, format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Plain => write_plain_table(&mut out, table, index_name),
        OutputFormat::Csv => write_csv_table(out, table, index_name),
        OutputFormat::Json => print_json(&table_records(table, index_name)),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        let mut table = Table::from_records(&[
            json!({"name": "a", "score": 1.5, "tags": ["x"]}),
            json!({"name": "b", "score": null}),
        ]);
        table
            .set_index(vec!["ref-a".to_string(), "ref-b".to_string()])
            .unwrap();
        table
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!(null)), "");
        assert_eq!(cell_text(&json!("s")), "s");
        assert_eq!(cell_text(&json!(2)), "2");
        assert_eq!(cell_text(&json!(["x"])), "[\"x\"]");
    }

    #[test]
    fn test_plain_table_aligns_columns() {
        let mut out = Vec::new();
        write_plain_table(&mut out, &sample(), "ref").unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ref    name  score"));
        assert!(lines[1].starts_with("ref-a  a     1.5"));
        assert_eq!(lines[2], "ref-b  b");
    }

    #[test]
    fn test_csv_table_has_index_column() {
        let mut out = Vec::new();
        write_csv_table(&mut out, &sample(), "ref").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().next(), Some("ref,name,score,tags"));
        assert_eq!(text.lines().nth(1), Some("ref-a,a,1.5,\"[\"\"x\"\"]\""));
    }

    #[test]
    fn test_table_records_put_index_first() {
        let records = table_records(&sample(), "ref");
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, ["ref", "name", "score", "tags"]);
    }

    #[test]
    fn test_truncate_long_cells() {
        assert_eq!(truncate("abcdef", 5), "ab...");
        assert_eq!(truncate("abc", 5), "abc");
    }
}
