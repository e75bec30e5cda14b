use std::path::Path;

use anyhow::{bail, Result};
use comfy_table::Table;
use sparkify_shared::{schema::TABLE_NAMES, RowSet, WarehouseStore};

use crate::cli::QueryOutputFormat;

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub table: String,
    pub limit: usize,
    pub offset: usize,
    pub format: QueryOutputFormat,
}

pub fn run(db_path: &Path, options: QueryOptions) -> Result<()> {
    let store = WarehouseStore::open_existing(db_path)?;
    let table = open_table(&store, &options.table)?;

    let rows = store.fetch_rows(table, options.limit, options.offset)?;
    if rows.is_empty() {
        tracing::info!("No rows found.");
        return Ok(());
    }

    let formatted = match options.format {
        QueryOutputFormat::Table => format_table(&rows),
        QueryOutputFormat::Vertical => format_vertical(&rows),
    };
    tracing::info!("\n{formatted}");
    Ok(())
}

pub fn describe(db_path: &Path, table: &str) -> Result<()> {
    let store = WarehouseStore::open_existing(db_path)?;
    let table = open_table(&store, table)?;
    let columns = store.table_columns(table)?;
    let row_count = store.count_rows(table)?;

    tracing::info!("Table: {table}");
    tracing::info!("Rows: {row_count}");
    tracing::info!("Schema:");
    for column in columns {
        tracing::info!(
            "- {}: {}{}{}",
            column.name,
            column.data_type,
            if column.primary_key { " (primary key)" } else { "" },
            if column.not_null { " (not null)" } else { "" }
        );
    }
    Ok(())
}

pub fn stats(db_path: &Path) -> Result<()> {
    let store = WarehouseStore::open_existing(db_path)?;
    let existing = store.existing_tables()?;
    if existing.is_empty() {
        tracing::info!("No tables found in {}", db_path.display());
        return Ok(());
    }

    for table in TABLE_NAMES {
        if existing.iter().any(|name| name == table) {
            tracing::info!("{table}: {} rows", store.count_rows(table)?);
        } else {
            tracing::info!("{table}: missing");
        }
    }
    Ok(())
}

/// Map user input onto a managed table that exists in `store`.
fn open_table(store: &WarehouseStore, table: &str) -> Result<&'static str> {
    let Some(name) = TABLE_NAMES
        .iter()
        .copied()
        .find(|name| name.eq_ignore_ascii_case(table.trim()))
    else {
        let candidates = TABLE_NAMES.iter().map(|name| name.to_string()).collect::<Vec<_>>();
        let suggestions = suggest_names(table, &candidates);
        if suggestions.is_empty() {
            bail!("unknown table `{table}`; available tables: {}", TABLE_NAMES.join(", "));
        }
        bail!("unknown table `{table}`; did you mean: {}", suggestions.join(", "));
    };

    if !store.existing_tables()?.iter().any(|existing| existing == name) {
        bail!("table `{name}` not found; run `sparkify-cli create-tables` or `sparkify-cli etl` first");
    }
    Ok(name)
}

pub fn suggest_names(input: &str, candidates: &[String]) -> Vec<String> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut scored = candidates
        .iter()
        .filter_map(|candidate| {
            let value = candidate.to_lowercase();
            let score = if value == needle {
                0
            } else if value.starts_with(&needle) || needle.starts_with(&value) {
                1
            } else if value.contains(&needle) || needle.contains(&value) {
                2
            } else {
                return None;
            };
            Some((score, candidate.clone()))
        })
        .collect::<Vec<_>>();

    scored.sort_by(|left, right| left.0.cmp(&right.0).then_with(|| left.1.cmp(&right.1)));
    scored
        .into_iter()
        .map(|(_, candidate)| candidate)
        .take(3)
        .collect()
}

// Same border preset Arrow's pretty printer loads.
const TABLE_PRESET: &str = "||--+-++|    ++++++";

pub fn format_table(rows: &RowSet) -> String {
    let mut table = Table::new();
    table.load_preset(TABLE_PRESET).set_header(&rows.columns);
    for row in &rows.rows {
        table.add_row(row);
    }
    table.to_string()
}

pub fn format_vertical(rows: &RowSet) -> String {
    let mut output = String::new();

    for (row_idx, row) in rows.rows.iter().enumerate() {
        output.push_str(&format!(
            "*************************** [{}] ***************************\n",
            row_idx + 1
        ));
        for (column, value) in rows.columns.iter().zip(row) {
            output.push_str(&format!("{column}: {value}\n"));
        }
        output.push('\n');
    }

    if output.is_empty() {
        output.push_str("(no rows)\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RowSet {
        RowSet {
            columns: vec!["user_id".to_string(), "level".to_string()],
            rows: vec![
                vec!["15".to_string(), "paid".to_string()],
                vec!["8".to_string(), "free".to_string()],
            ],
        }
    }

    #[test]
    fn table_output_aligns_columns() {
        let output = format_table(&sample());
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "+---------+-------+");
        assert_eq!(lines[1], "| user_id | level |");
        assert_eq!(lines[3], "| 15      | paid  |");
        assert_eq!(lines[4], "| 8       | free  |");
        assert_eq!(lines[5], lines[0]);
    }

    #[test]
    fn table_output_keeps_header_for_wide_values() {
        let rows = RowSet {
            columns: vec!["title".to_string()],
            rows: vec![vec!["Sweet Child O' Mine".to_string()]],
        };
        let output = format_table(&rows);
        assert!(output.contains(&format!("| {:<19} |", "title")));
        assert!(output.contains("| Sweet Child O' Mine |"));
    }

    #[test]
    fn vertical_output_numbers_rows() {
        let output = format_vertical(&sample());
        assert!(output.starts_with("*************************** [1] ***"));
        assert!(output.contains("user_id: 15\nlevel: paid\n"));
        assert!(output.contains("[2]"));
        assert_eq!(format_vertical(&RowSet::default()), "(no rows)\n");
    }

    #[test]
    fn suggestions_prefer_prefix_matches() {
        let candidates = TABLE_NAMES.iter().map(|name| name.to_string()).collect::<Vec<_>>();
        assert_eq!(suggest_names("song", &candidates), vec!["songplays", "songs"]);
        assert_eq!(suggest_names("user", &candidates), vec!["users"]);
        assert!(suggest_names("albums", &candidates).is_empty());
    }
}
