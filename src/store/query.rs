//! Match query construction.
//!
//! Each search is rendered into a single `SELECT` over one dataset table. The
//! user text is embedded as a quoted literal produced by [`quote_literal`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sanitize::quote_literal;

/// Unicode-aware lowercase function registered on every store connection.
/// The built-in `LOWER()` folds ASCII letters only.
pub const FOLD_CASE: &str = "fold_case";

/// Which credential table a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Passwords,
    Usernames,
}

impl Dataset {
    pub const ALL: [Dataset; 2] = [Dataset::Passwords, Dataset::Usernames];

    pub fn table(self) -> &'static str {
        match self {
            Dataset::Passwords => "passwords",
            Dataset::Usernames => "usernames",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Dataset::Passwords => "password",
            Dataset::Usernames => "username",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// A validated search against one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    pub dataset: Dataset,
    pub text: String,
    pub ignore_case: bool,
    pub substring: bool,
}

impl MatchQuery {
    pub fn new(dataset: Dataset, text: impl Into<String>) -> Self {
        Self {
            dataset,
            text: text.into(),
            ignore_case: false,
            substring: false,
        }
    }

    pub fn ignore_case(mut self, yes: bool) -> Self {
        self.ignore_case = yes;
        self
    }

    pub fn substring(mut self, yes: bool) -> Self {
        self.substring = yes;
        self
    }

    /// Render the statement sent to the engine.
    ///
    /// Substring matching uses `instr` rather than `LIKE`: SQLite's `LIKE`
    /// folds ASCII case unconditionally and treats `%` and `_` in the user
    /// text as wildcards.
    pub fn to_sql(&self) -> String {
        let column = self.dataset.column();
        let literal = quote_literal(&self.text);

        let (column_expr, input_expr) = if self.ignore_case {
            (format!("{FOLD_CASE}({column})"), format!("{FOLD_CASE}({literal})"))
        } else {
            (column.to_string(), literal)
        };

        let predicate = if self.substring {
            format!("instr({column_expr}, {input_expr}) > 0")
        } else {
            format!("{column_expr} = {input_expr}")
        };

        format!(
            "SELECT {column}, source FROM {table} WHERE {predicate}",
            table = self.dataset.table()
        )
    }
}
