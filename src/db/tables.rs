//! Table-name resolution for the two Chinook naming variants.
//!
//! The sample database ships both as `Customer`/`Invoice`/`InvoiceLine` and as
//! `customers`/`invoices`/`invoice_items`. Names are resolved once at startup
//! and shared read-only by every tool.

use crate::db::Database;
use crate::db::executor::quote_ident;
use crate::db::schema::find_table;
use crate::error::{DbError, DbResult};
use sqlx::SqliteConnection;
use tracing::info;

pub const CUSTOMER_CANDIDATES: &[&str] = &["customers", "Customer"];
pub const INVOICE_CANDIDATES: &[&str] = &["invoices", "Invoice"];
pub const INVOICE_ITEM_CANDIDATES: &[&str] = &["invoice_items", "InvoiceLine"];

/// Concrete table names for each logical role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub customers: String,
    pub invoices: String,
    pub invoice_items: String,
}

impl TableNames {
    /// Probe the catalog for every role.
    pub async fn resolve(db: &Database) -> DbResult<Self> {
        let names = db
            .with_transaction(|conn| Box::pin(resolve_tx(conn)))
            .await?;
        info!(
            customers = %names.customers,
            invoices = %names.invoices,
            invoice_items = %names.invoice_items,
            "Resolved table names"
        );
        Ok(names)
    }

    /// Quoted customers table, ready to splice into SQL.
    pub fn customers_sql(&self) -> String {
        quote_ident(&self.customers)
    }

    pub fn invoices_sql(&self) -> String {
        quote_ident(&self.invoices)
    }

    pub fn invoice_items_sql(&self) -> String {
        quote_ident(&self.invoice_items)
    }
}

async fn resolve_tx(conn: &mut SqliteConnection) -> DbResult<TableNames> {
    Ok(TableNames {
        customers: pick_table(conn, "customers", CUSTOMER_CANDIDATES).await?,
        invoices: pick_table(conn, "invoices", INVOICE_CANDIDATES).await?,
        invoice_items: pick_table(conn, "invoice_items", INVOICE_ITEM_CANDIDATES).await?,
    })
}

/// First candidate present in the catalog, exact match preferred over a
/// case-insensitive one. Returns the catalog's spelling.
pub async fn pick_table(
    conn: &mut SqliteConnection,
    role: &str,
    candidates: &[&str],
) -> DbResult<String> {
    for candidate in candidates {
        if let Some(actual) = find_table(conn, candidate).await? {
            return Ok(actual);
        }
    }
    Err(DbError::table_resolution(role, candidates))
}
