//! Raw read tool.
//!
//! This module implements the `run_sql` MCP tool: one SELECT statement,
//! positional or named parameters, every row returned.

use crate::context::CallContext;
use crate::db::{Database, execute_read, resolve_params};
use crate::error::DbResult;
use crate::models::{QueryParam, QueryParamsInput, ReadResult};
use crate::tools::sql_validator;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::SqliteConnection;
use tracing::info;

/// Input for the run_sql tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunSqlInput {
    /// A single SELECT statement. Other statements and multiple statements are rejected.
    pub query: String,
    /// Either an array bound to `?` placeholders in order, or an object bound
    /// to `:name` / `@name` / `$name` placeholders
    #[serde(default)]
    pub params: QueryParamsInput,
}

/// Output from the run_sql tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RunSqlOutput {
    /// Column names in result order
    pub columns: Vec<String>,
    /// Rows as arrays aligned with `columns`. BLOBs appear as "<N bytes>".
    pub rows: Vec<Vec<JsonValue>>,
    pub row_count: usize,
}

impl From<ReadResult> for RunSqlOutput {
    fn from(result: ReadResult) -> Self {
        let row_count = result.row_count();
        Self {
            columns: result.columns,
            rows: result.rows,
            row_count,
        }
    }
}

pub struct QueryToolHandler {
    db: Database,
}

impl QueryToolHandler {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Validate and run one SELECT inside a transaction.
    pub async fn run_sql(&self, ctx: &CallContext, input: RunSqlInput) -> DbResult<RunSqlOutput> {
        ctx.observe(async {
            sql_validator::validate_read(&input.query)?;
            let (sql, params) = resolve_params(&input.query, input.params)?;

            let result = self
                .db
                .with_transaction(move |conn| Box::pin(read_tx(conn, sql, params)))
                .await?;

            info!(
                columns = result.columns.len(),
                rows = result.row_count(),
                "Query executed"
            );
            Ok(result.into())
        })
        .await
    }
}

async fn read_tx(
    conn: &mut SqliteConnection,
    sql: String,
    params: Vec<QueryParam>,
) -> DbResult<ReadResult> {
    execute_read(conn, &sql, &params).await
}
