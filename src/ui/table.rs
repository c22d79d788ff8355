use tabled::{builder::Builder, settings::Style, Table, Tabled};
use crate::catalog::CatalogEntry;
use crate::storage::QueryTable;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

/// Render a query result with its own column headers
pub fn query_table(result: &QueryTable) -> String {
    let mut builder = Builder::default();
    builder.push_record(result.columns.iter().cloned());
    for row in &result.rows {
        builder.push_record(row.iter().map(cell_text));
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Render the catalog menu
pub fn catalog_table(entries: &[CatalogEntry]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["#", "Key", "Question"]);
    for entry in entries {
        builder.push_record([entry.number.to_string(), entry.key.to_string(), entry.question.to_string()]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_table_renders_headers_and_nulls() {
        let result = QueryTable {
            columns: vec!["title".to_string(), "rank".to_string()],
            rows: vec![
                vec![json!("Tetradrachm"), json!(12.5)],
                vec![serde_json::Value::Null, json!(3)],
            ],
        };

        let rendered = query_table(&result);
        assert!(rendered.contains("title"));
        assert!(rendered.contains("Tetradrachm"));
        assert!(rendered.contains("12.5"));
        assert!(rendered.contains("NULL"));
        assert!(!rendered.contains("\"Tetradrachm\""));
    }

    #[test]
    fn test_empty_stats_table_is_blank() {
        assert!(stats_table(&[]).is_empty());
        assert!(stats_table(&[("Artifacts", "2")]).contains("Artifacts"));
    }

    #[test]
    fn test_catalog_table_lists_keys() {
        let rendered = catalog_table(crate::catalog::entries());
        assert!(rendered.contains("top-ranked-grey"));
        assert!(rendered.contains("Question"));
    }
}
