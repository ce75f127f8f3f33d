//! Invoice creation tool.
//!
//! `create_invoice` writes the header and every line in one transaction. A
//! line that violates a constraint (unknown track, unknown customer) rolls the
//! whole invoice back.

use crate::context::CallContext;
use crate::db::{Database, TableNames, execute_insert};
use crate::error::{DbError, DbResult};
use crate::models::QueryParam;
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::{debug, info};

/// Format of the InvoiceDate column in the sample data.
const INVOICE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One requested invoice line. All fields are required; they are optional
/// here only so a missing field produces a precise validation message.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InvoiceItemInput {
    pub track_id: Option<i64>,
    pub unit_price: Option<f64>,
    /// Must be greater than zero
    pub quantity: Option<i64>,
}

/// Input for the create_invoice tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateInvoiceInput {
    pub customer_id: i64,
    /// At least one line
    pub items: Vec<InvoiceItemInput>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CreateInvoiceOutput {
    pub invoice_id: i64,
    /// Sum of unit_price × quantity over all lines
    pub total: f64,
    pub line_count: usize,
}

/// A validated invoice line.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub track_id: i64,
    pub unit_price: f64,
    pub quantity: i64,
}

impl InvoiceLine {
    pub fn amount(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Check every item and return the lines in input order.
pub fn validate_items(items: Vec<InvoiceItemInput>) -> DbResult<Vec<InvoiceLine>> {
    if items.is_empty() {
        return Err(DbError::invalid_input("items must contain at least one line"));
    }
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let (Some(track_id), Some(unit_price), Some(quantity)) =
                (item.track_id, item.unit_price, item.quantity)
            else {
                return Err(DbError::invalid_input(format!(
                    "items[{}] requires track_id, unit_price and quantity",
                    idx
                )));
            };
            if quantity <= 0 {
                return Err(DbError::invalid_input(format!(
                    "items[{}].quantity must be greater than 0, got {}",
                    idx, quantity
                )));
            }
            Ok(InvoiceLine {
                track_id,
                unit_price,
                quantity,
            })
        })
        .collect()
}

/// Sum of unit_price × quantity over all lines.
pub fn invoice_total(lines: &[InvoiceLine]) -> f64 {
    lines.iter().map(InvoiceLine::amount).sum()
}

pub struct InvoiceToolHandler {
    db: Database,
    tables: Arc<TableNames>,
}

impl InvoiceToolHandler {
    pub fn new(db: Database, tables: Arc<TableNames>) -> Self {
        Self { db, tables }
    }

    pub async fn create_invoice(
        &self,
        ctx: &CallContext,
        input: CreateInvoiceInput,
    ) -> DbResult<CreateInvoiceOutput> {
        ctx.observe(async {
            let lines = validate_items(input.items)?;
            let total = invoice_total(&lines);
            let line_count = lines.len();
            let plan = InvoicePlan {
                header_sql: format!(
                    "INSERT INTO {} (CustomerId, InvoiceDate, BillingAddress, BillingCity, \
                     BillingState, BillingCountry, BillingPostalCode, Total) \
                     VALUES (?, ?, '', '', NULL, '', '', ?)",
                    self.tables.invoices_sql()
                ),
                line_sql: format!(
                    "INSERT INTO {} (InvoiceId, TrackId, UnitPrice, Quantity) VALUES (?, ?, ?, ?)",
                    self.tables.invoice_items_sql()
                ),
                customer_id: input.customer_id,
                invoice_date: Utc::now().format(INVOICE_DATE_FORMAT).to_string(),
                total,
                lines,
            };

            let invoice_id = self
                .db
                .with_transaction(move |conn| Box::pin(create_tx(conn, plan)))
                .await?;

            info!(
                invoice_id,
                customer_id = input.customer_id,
                total,
                line_count,
                "Invoice created"
            );
            Ok(CreateInvoiceOutput {
                invoice_id,
                total,
                line_count,
            })
        })
        .await
    }
}

struct InvoicePlan {
    header_sql: String,
    line_sql: String,
    customer_id: i64,
    invoice_date: String,
    total: f64,
    lines: Vec<InvoiceLine>,
}

async fn create_tx(conn: &mut SqliteConnection, plan: InvoicePlan) -> DbResult<i64> {
    let invoice_id = execute_insert(
        conn,
        &plan.header_sql,
        &[
            QueryParam::Int(plan.customer_id),
            QueryParam::String(plan.invoice_date),
            QueryParam::Float(plan.total),
        ],
    )
    .await?;

    for line in &plan.lines {
        execute_insert(
            conn,
            &plan.line_sql,
            &[
                QueryParam::Int(invoice_id),
                QueryParam::Int(line.track_id),
                QueryParam::Float(line.unit_price),
                QueryParam::Int(line.quantity),
            ],
        )
        .await?;
        debug!(invoice_id, track_id = line.track_id, "Invoice line inserted");
    }
    Ok(invoice_id)
}
