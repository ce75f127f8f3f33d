//! Customer tools.
//!
//! This module implements `insert_customer`, `update_customer_email` and
//! `top_customers` against whichever customers/invoices tables were resolved
//! at startup.

use crate::context::CallContext;
use crate::db::{Database, TableNames, execute_insert, execute_read, execute_write};
use crate::error::{DbError, DbResult};
use crate::models::{DEFAULT_MAX_AFFECTED_ROWS, QueryParam};
use crate::tools::write::AffectedRowsOutput;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::SqliteConnection;
use std::sync::{Arc, LazyLock};
use tracing::info;

pub const DEFAULT_TOP_CUSTOMERS: u32 = 5;
pub const MAX_TOP_CUSTOMERS: u32 = 100;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Require the `local@domain.tld` shape.
pub fn validate_email(email: &str) -> DbResult<()> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(DbError::invalid_input(format!(
            "'{}' is not a valid email address (expected local@domain.tld)",
            email
        )))
    }
}

/// Input for the insert_customer tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InsertCustomerInput {
    pub first_name: String,
    pub last_name: String,
    /// Must look like local@domain.tld
    pub email: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct InsertCustomerOutput {
    /// Id assigned to the new customer
    pub customer_id: i64,
}

/// Input for the update_customer_email tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateCustomerEmailInput {
    pub customer_id: i64,
    /// Must look like local@domain.tld
    pub new_email: String,
}

/// Input for the top_customers tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct TopCustomersInput {
    /// Number of customers to return, 1 to 100. Default: 5
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CustomerSpend {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    /// Sum of invoice totals; 0 for customers without invoices
    pub total_spent: f64,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TopCustomersOutput {
    /// Highest total first; ties broken by ascending customer id
    pub customers: Vec<CustomerSpend>,
    pub count: usize,
}

pub struct CustomerToolHandler {
    db: Database,
    tables: Arc<TableNames>,
}

impl CustomerToolHandler {
    pub fn new(db: Database, tables: Arc<TableNames>) -> Self {
        Self { db, tables }
    }

    pub async fn insert_customer(
        &self,
        ctx: &CallContext,
        input: InsertCustomerInput,
    ) -> DbResult<InsertCustomerOutput> {
        ctx.observe(async {
            let first_name = required("first_name", input.first_name)?;
            let last_name = required("last_name", input.last_name)?;
            let email = input.email.trim().to_string();
            validate_email(&email)?;

            let sql = format!(
                "INSERT INTO {} (FirstName, LastName, Email, City, Country) VALUES (?, ?, ?, ?, ?)",
                self.tables.customers_sql()
            );
            let params = vec![
                QueryParam::from(first_name),
                QueryParam::from(last_name),
                QueryParam::from(email),
                QueryParam::from(input.city),
                QueryParam::from(input.country),
            ];

            let customer_id = self
                .db
                .with_transaction(move |conn| Box::pin(insert_tx(conn, sql, params)))
                .await?;
            info!(customer_id, "Customer inserted");
            Ok(InsertCustomerOutput { customer_id })
        })
        .await
    }

    /// Zero affected rows means no such customer; that is not an error.
    pub async fn update_customer_email(
        &self,
        ctx: &CallContext,
        input: UpdateCustomerEmailInput,
    ) -> DbResult<AffectedRowsOutput> {
        ctx.observe(async {
            let email = input.new_email.trim().to_string();
            validate_email(&email)?;

            let sql = format!(
                "UPDATE {} SET Email = ? WHERE CustomerId = ?",
                self.tables.customers_sql()
            );
            let params = vec![QueryParam::from(email), QueryParam::Int(input.customer_id)];

            let affected_rows = self
                .db
                .with_transaction(move |conn| Box::pin(update_tx(conn, sql, params)))
                .await?;
            info!(
                customer_id = input.customer_id,
                affected_rows, "Customer email updated"
            );
            Ok(AffectedRowsOutput { affected_rows })
        })
        .await
    }

    pub async fn top_customers(
        &self,
        ctx: &CallContext,
        input: TopCustomersInput,
    ) -> DbResult<TopCustomersOutput> {
        ctx.observe(async {
            let limit = input.limit.unwrap_or(DEFAULT_TOP_CUSTOMERS);
            if !(1..=MAX_TOP_CUSTOMERS).contains(&limit) {
                return Err(DbError::invalid_input(format!(
                    "limit must be between 1 and {}, got {}",
                    MAX_TOP_CUSTOMERS, limit
                )));
            }

            let sql = format!(
                r#"SELECT c.CustomerId, c.FirstName, c.LastName, c.Email,
                       CAST(IFNULL(SUM(i.Total), 0) AS REAL) AS TotalSpent
                FROM {customers} c
                LEFT JOIN {invoices} i ON i.CustomerId = c.CustomerId
                GROUP BY c.CustomerId
                ORDER BY TotalSpent DESC, c.CustomerId ASC
                LIMIT ?"#,
                customers = self.tables.customers_sql(),
                invoices = self.tables.invoices_sql(),
            );

            let customers = self
                .db
                .with_transaction(move |conn| Box::pin(top_tx(conn, sql, limit)))
                .await?;
            let count = customers.len();
            info!(limit, count, "Ranked customers");
            Ok(TopCustomersOutput { customers, count })
        })
        .await
    }
}

fn required(field: &str, value: String) -> DbResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DbError::invalid_input(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

async fn insert_tx(conn: &mut SqliteConnection, sql: String, params: Vec<QueryParam>) -> DbResult<i64> {
    execute_insert(conn, &sql, &params).await
}

async fn update_tx(conn: &mut SqliteConnection, sql: String, params: Vec<QueryParam>) -> DbResult<u64> {
    execute_write(conn, &sql, &params, DEFAULT_MAX_AFFECTED_ROWS).await
}

async fn top_tx(conn: &mut SqliteConnection, sql: String, limit: u32) -> DbResult<Vec<CustomerSpend>> {
    let result = execute_read(conn, &sql, &[QueryParam::Int(limit as i64)]).await?;
    result.rows.into_iter().map(spend_from_row).collect()
}

fn spend_from_row(row: Vec<JsonValue>) -> DbResult<CustomerSpend> {
    let [id, first, last, email, total]: [JsonValue; 5] = row
        .try_into()
        .map_err(|_| DbError::internal("unexpected column count in top_customers"))?;
    let email = match email {
        JsonValue::Null => None,
        JsonValue::String(email) => Some(email),
        _ => return Err(unexpected_cell("Email")),
    };
    Ok(CustomerSpend {
        customer_id: id.as_i64().ok_or_else(|| unexpected_cell("CustomerId"))?,
        first_name: text_cell(first, "FirstName")?,
        last_name: text_cell(last, "LastName")?,
        email,
        total_spent: total.as_f64().ok_or_else(|| unexpected_cell("TotalSpent"))?,
    })
}

fn text_cell(value: JsonValue, column: &str) -> DbResult<String> {
    match value {
        JsonValue::String(s) => Ok(s),
        _ => Err(unexpected_cell(column)),
    }
}

fn unexpected_cell(column: &str) -> DbError {
    DbError::internal(format!("unexpected value type for {} in top_customers", column))
}
