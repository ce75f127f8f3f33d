//! Raw write tool.
//!
//! This module implements the `run_sql_write` MCP tool: one INSERT, UPDATE,
//! DELETE or REPLACE statement, committed only if it touched no more rows than
//! the configured cap.

use crate::context::CallContext;
use crate::db::{Database, execute_write, resolve_params};
use crate::error::DbResult;
use crate::models::{DEFAULT_MAX_AFFECTED_ROWS, QueryParam, QueryParamsInput};
use crate::tools::sql_validator;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::info;

/// Input for the run_sql_write tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunSqlWriteInput {
    /// A single INSERT, UPDATE, DELETE or REPLACE statement
    pub query: String,
    /// Either an array bound to `?` placeholders in order, or an object bound
    /// to `:name` / `@name` / `$name` placeholders
    #[serde(default)]
    pub params: QueryParamsInput,
}

/// Output from run_sql_write and update_customer_email.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AffectedRowsOutput {
    /// Number of rows affected by the statement
    pub affected_rows: u64,
}

pub struct WriteToolHandler {
    db: Database,
    max_affected: u64,
}

impl WriteToolHandler {
    pub fn new(db: Database) -> Self {
        Self::with_limit(db, DEFAULT_MAX_AFFECTED_ROWS)
    }

    pub fn with_limit(db: Database, max_affected: u64) -> Self {
        Self { db, max_affected }
    }

    pub async fn run_sql_write(
        &self,
        ctx: &CallContext,
        input: RunSqlWriteInput,
    ) -> DbResult<AffectedRowsOutput> {
        ctx.observe(async {
            sql_validator::validate_write(&input.query)?;
            let (sql, params) = resolve_params(&input.query, input.params)?;
            let limit = self.max_affected;

            let affected_rows = self
                .db
                .with_transaction(move |conn| Box::pin(write_tx(conn, sql, params, limit)))
                .await?;

            info!(affected_rows, "Write committed");
            Ok(AffectedRowsOutput { affected_rows })
        })
        .await
    }
}

async fn write_tx(
    conn: &mut SqliteConnection,
    sql: String,
    params: Vec<QueryParam>,
    limit: u64,
) -> DbResult<u64> {
    execute_write(conn, &sql, &params, limit).await
}
