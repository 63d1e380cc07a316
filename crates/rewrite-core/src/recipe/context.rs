use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::RewriteError;
use crate::result::Result;

/// A recipe error recorded instead of aborting the run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFailure {
    pub recipe: String,
    pub source_path: String,
    pub message: String,
}

/// State a recipe run threads through every visitor
///
/// Each file is visited with its own [`fork`](Self::fork) of the context;
/// the scheduler merges the forks back in file order, so data-table rows
/// come out in a deterministic order however the visits interleave.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    cycle: usize,
    messages: HashMap<String, serde_json::Value>,
    data_tables: BTreeMap<String, Vec<serde_json::Value>>,
    failures: Vec<RecipeFailure>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1-based cycle number; 0 outside a scheduler run
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    pub(crate) fn set_cycle(&mut self, cycle: usize) {
        self.cycle = cycle;
    }

    pub fn put_message(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.messages.insert(key.into(), value);
    }

    pub fn message(&self, key: &str) -> Option<&serde_json::Value> {
        self.messages.get(key)
    }

    /// Append a serialized row to `table`
    pub fn insert_row<T: Serialize>(&mut self, table: &str, row: &T) -> Result<()> {
        let row = serde_json::to_value(row).map_err(|e| {
            RewriteError::internal_error(format!("data table '{table}' row: {e}"))
        })?;
        self.data_tables.entry(table.to_string()).or_default().push(row);
        Ok(())
    }

    pub fn rows(&self, table: &str) -> &[serde_json::Value] {
        self.data_tables
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn data_tables(&self) -> &BTreeMap<String, Vec<serde_json::Value>> {
        &self.data_tables
    }

    pub fn record_failure(&mut self, failure: RecipeFailure) {
        tracing::warn!(
            recipe = %failure.recipe,
            source_path = %failure.source_path,
            "recipe failed: {}",
            failure.message
        );
        self.failures.push(failure);
    }

    pub fn failures(&self) -> &[RecipeFailure] {
        &self.failures
    }

    /// Child context for one file: same cycle and messages, empty output
    pub fn fork(&self) -> Self {
        Self {
            cycle: self.cycle,
            messages: self.messages.clone(),
            data_tables: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    /// Fold a child's output back in
    pub fn merge(&mut self, child: ExecutionContext) {
        self.messages.extend(child.messages);
        for (table, rows) in child.data_tables {
            self.data_tables.entry(table).or_default().extend(rows);
        }
        self.failures.extend(child.failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_are_appended_per_table() {
        let mut ctx = ExecutionContext::new();
        ctx.insert_row("matches", &json!({"path": "a"})).unwrap();
        ctx.insert_row("matches", &json!({"path": "b"})).unwrap();
        assert_eq!(ctx.rows("matches").len(), 2);
        assert!(ctx.rows("other").is_empty());
    }

    #[test]
    fn test_fork_and_merge() {
        let mut parent = ExecutionContext::new();
        parent.set_cycle(2);
        parent.put_message("seen", json!(true));
        parent.insert_row("t", &json!(1)).unwrap();

        let mut child = parent.fork();
        assert_eq!(child.cycle(), 2);
        assert_eq!(child.message("seen"), Some(&json!(true)));
        assert!(child.rows("t").is_empty());

        child.insert_row("t", &json!(2)).unwrap();
        child.record_failure(RecipeFailure {
            recipe: "r".into(),
            source_path: "a.json".into(),
            message: "boom".into(),
        });
        parent.merge(child);

        assert_eq!(parent.rows("t"), &[json!(1), json!(2)]);
        assert_eq!(parent.failures().len(), 1);
    }
}
