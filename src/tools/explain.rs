//! Natural-language summary of what a SQL string appears to do.
//!
//! Backs the `explain_query_purpose` prompt. Nothing is executed; the text
//! depends only on the input.

use crate::tools::sql_validator::{self, SqlStatementClass};
use schemars::JsonSchema;
use serde::Deserialize;

/// Number of leading words quoted back in the explanation.
const HEAD_WORDS: usize = 6;

/// Arguments for the explain_query_purpose prompt.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExplainPromptArgs {
    /// The SQL statement to describe
    pub sql: String,
}

pub fn explain_query_purpose(sql: &str) -> String {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return "Empty SQL.".to_string();
    }

    let head = trimmed
        .split_whitespace()
        .take(HEAD_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    let mut text = match sql_validator::keyword_class(trimmed) {
        SqlStatementClass::Read => format!(
            "This appears to be a SELECT query (starts with: '{}'). It reads data without modifying the database.",
            head
        ),
        SqlStatementClass::Write => format!(
            "This appears to be a WRITE query (starts with: '{}'). It modifies data in the database.",
            head
        ),
        SqlStatementClass::Invalid => {
            format!("This looks like a SQL statement (starts with: '{}').", head)
        }
    };

    if sql_validator::has_internal_separator(trimmed) {
        text.push_str(
            " It contains more than one statement, so run_sql and run_sql_write would reject it.",
        );
    }
    text
}
