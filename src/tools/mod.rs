//! MCP tool implementations.
//!
//! - `query`: run_sql, a single SELECT
//! - `write`: run_sql_write, a single capped write
//! - `schema`: list_tables, get_table_info and the schema snapshot
//! - `customers`: insert_customer, update_customer_email, top_customers
//! - `invoices`: create_invoice
//! - `explain`: the explain_query_purpose prompt text
//! - `sql_validator`: statement classification for the raw-SQL tools

pub mod customers;
pub mod explain;
pub mod invoices;
pub mod query;
pub mod schema;
pub mod sql_validator;
pub mod write;

pub use customers::{
    CustomerSpend, CustomerToolHandler, InsertCustomerInput, InsertCustomerOutput,
    TopCustomersInput, TopCustomersOutput, UpdateCustomerEmailInput,
};
pub use explain::{ExplainPromptArgs, explain_query_purpose};
pub use invoices::{CreateInvoiceInput, CreateInvoiceOutput, InvoiceItemInput, InvoiceToolHandler};
pub use query::{QueryToolHandler, RunSqlInput, RunSqlOutput};
pub use schema::{GetTableInfoInput, ListTablesOutput, SchemaToolHandler};
pub use write::{AffectedRowsOutput, RunSqlWriteInput, WriteToolHandler};
