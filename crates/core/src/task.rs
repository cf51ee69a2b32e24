//! Task model - one item of work plus the parameters shared by its run.

use crate::id::TaskId;
use serde_json::Value;
use std::sync::Arc;

/// Named parameters passed verbatim to every task of a run.
pub type ExtraParams = serde_json::Map<String, Value>;

/// A single unit of work submitted to the dispatcher.
///
/// The item is opaque to the dispatcher: a filename, an index, a list of
/// files that belong together. Parameters are shared by reference across all
/// tasks of the same run.
#[derive(Debug, Clone)]
pub struct Task {
    /// Input position of this task
    pub id: TaskId,

    /// The item to process
    pub item: Value,

    /// Parameters shared by every task in the run
    pub params: Arc<ExtraParams>,
}

impl Task {
    /// Create a task.
    pub fn new(id: TaskId, item: impl Into<Value>, params: Arc<ExtraParams>) -> Self {
        Self {
            id,
            item: item.into(),
            params,
        }
    }

    /// Build the tasks of one run, numbered in input order.
    pub fn batch<I>(items: I, params: ExtraParams) -> Vec<Task>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let params = Arc::new(params);
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| Task::new(TaskId::new(index), item, Arc::clone(&params)))
            .collect()
    }

    /// Textual form of the item.
    ///
    /// Strings are returned without JSON quoting, everything else as compact JSON.
    pub fn item_text(&self) -> String {
        value_text(&self.item)
    }

    /// Look up a shared parameter.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

/// Render a JSON value the way it should appear on a command line.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
