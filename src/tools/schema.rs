//! Schema introspection tools.
//!
//! This module implements the `list_tables` and `get_table_info` MCP tools
//! and builds the snapshot served as the `schema://current` resource.

use crate::context::CallContext;
use crate::db::Database;
use crate::db::schema;
use crate::error::{DbError, DbResult};
use crate::models::{SchemaSnapshot, TableDescription, TableSummary};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::info;

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    /// User tables with current row counts, sorted by name
    pub tables: Vec<TableSummary>,
    pub count: usize,
}

/// Input for the get_table_info tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetTableInfoInput {
    /// Table name. Matched exactly first, then case-insensitively.
    pub table: String,
}

pub struct SchemaToolHandler {
    db: Database,
}

impl SchemaToolHandler {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_tables(&self, ctx: &CallContext) -> DbResult<ListTablesOutput> {
        ctx.observe(async {
            let tables = self
                .db
                .with_transaction(|conn| Box::pin(schema::list_tables_with_counts(conn)))
                .await?;
            let count = tables.len();
            info!(count, "Listed tables");
            Ok(ListTablesOutput { tables, count })
        })
        .await
    }

    pub async fn get_table_info(
        &self,
        ctx: &CallContext,
        input: GetTableInfoInput,
    ) -> DbResult<TableDescription> {
        ctx.observe(async {
            let requested = input.table.trim().to_string();
            if requested.is_empty() {
                return Err(DbError::invalid_input("table is required"));
            }
            let description = self
                .db
                .with_transaction(move |conn| Box::pin(describe_tx(conn, requested)))
                .await?;
            info!(
                table = %description.name,
                columns = description.columns.len(),
                "Described table"
            );
            Ok(description)
        })
        .await
    }

    /// Describe every table. Always recomputed; nothing is cached.
    pub async fn snapshot(&self, ctx: &CallContext) -> DbResult<SchemaSnapshot> {
        ctx.observe(async {
            self.db
                .with_transaction(|conn| Box::pin(schema::snapshot(conn)))
                .await
        })
        .await
    }
}

async fn describe_tx(conn: &mut SqliteConnection, requested: String) -> DbResult<TableDescription> {
    let Some(actual) = schema::find_table(conn, &requested).await? else {
        return Err(DbError::not_found("table", requested));
    };
    schema::describe_table(conn, &actual).await
}
