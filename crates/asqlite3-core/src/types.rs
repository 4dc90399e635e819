// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value, parameter and row types shared between the native adapter and the
//! async facade.

use std::ops::Index;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use rusqlite::types::Value;

/// Transaction mode used when a DML statement opens an implicit transaction.
///
/// `None` (no isolation level) leaves the engine in autocommit mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum IsolationLevel {
    #[serde(alias = "deferred")]
    Deferred,
    #[serde(alias = "immediate")]
    Immediate,
    #[serde(alias = "exclusive")]
    Exclusive,
}

impl IsolationLevel {
    /// The statement that opens a transaction in this mode.
    pub fn begin_statement(self) -> &'static str {
        match self {
            Self::Deferred => "BEGIN DEFERRED",
            Self::Immediate => "BEGIN IMMEDIATE",
            Self::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

/// Parameters bound to a single statement execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Bound in order to `?`/`?NNN` placeholders.
    Positional(Vec<Value>),
    /// Bound by name to `:name`, `@name` or `$name` placeholders.
    Named(Vec<(String, Value)>),
}

impl Params {
    /// An empty positional parameter list.
    pub fn empty() -> Self {
        Self::Positional(Vec::new())
    }

    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Treat an absent parameter set as an empty one.
    pub fn normalize(params: Option<Params>) -> Self {
        params.unwrap_or_else(Self::empty)
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Positional(values) => values.len(),
            Self::Named(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

impl From<Vec<(String, Value)>> for Params {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Self::Named(pairs)
    }
}

/// One result row. Column names are shared with the producing cursor's description.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Looks a value up by column name, ASCII case-insensitively.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|idx| self.values.get(idx))
    }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, idx: usize) -> &Value {
        &self.values[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn missing_params_normalize_to_empty_positional() {
        let params = Params::normalize(None);
        assert_eq!(params, Params::Positional(Vec::new()));
        assert!(params.is_empty());
    }

    #[test]
    fn supplied_params_pass_through_normalize() {
        let params = Params::normalize(Some(Params::positional([1i64, 2])));
        assert_eq!(
            params,
            Params::Positional(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn named_params_convert_keys_and_values() {
        let params = Params::named([("a", 1i64), ("b", 2i64)]);
        match params {
            Params::Named(pairs) => {
                assert_eq!(pairs[0], ("a".to_string(), Value::Integer(1)));
                assert_eq!(pairs[1].0, "b");
            }
            other => panic!("expected named params, got {other:?}"),
        }
    }

    #[test]
    fn row_lookup_by_index_and_name() {
        let columns: Arc<[String]> = vec!["id".to_string(), "Name".to_string()].into();
        let row = Row::new(columns, vec![Value::Integer(7), Value::Text("x".into())]);
        assert_eq!(row[0], Value::Integer(7));
        assert_eq!(row.get_by_name("name"), Some(&Value::Text("x".into())));
        assert_eq!(row.get_by_name("missing"), None);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn isolation_level_parses_case_insensitively() {
        assert_eq!(
            IsolationLevel::from_str("immediate").unwrap(),
            IsolationLevel::Immediate
        );
        assert_eq!(IsolationLevel::Deferred.to_string(), "DEFERRED");
        assert_eq!(IsolationLevel::Exclusive.begin_statement(), "BEGIN EXCLUSIVE");
    }

    #[test]
    fn isolation_level_serde_accepts_both_cases() {
        let upper: IsolationLevel = serde_json::from_str("\"IMMEDIATE\"").unwrap();
        let lower: IsolationLevel = serde_json::from_str("\"immediate\"").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(
            serde_json::to_string(&IsolationLevel::Deferred).unwrap(),
            "\"DEFERRED\""
        );
    }
}
