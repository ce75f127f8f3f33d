//! MCP service implementation using rmcp.
//!
//! `ChinookService` exposes the Chinook tools, the `schema://current`
//! resource and the `explain_query_purpose` prompt. Every tool call opens its
//! own connection and transaction through the handlers in `crate::tools`.

use crate::context::CallContext;
use crate::db::{Database, TableNames};
use crate::models::{DEFAULT_MAX_AFFECTED_ROWS, TableDescription};
use crate::tools::customers::{
    CustomerToolHandler, InsertCustomerInput, InsertCustomerOutput, TopCustomersInput,
    TopCustomersOutput, UpdateCustomerEmailInput,
};
use crate::tools::explain::{ExplainPromptArgs, explain_query_purpose};
use crate::tools::invoices::{CreateInvoiceInput, CreateInvoiceOutput, InvoiceToolHandler};
use crate::tools::query::{QueryToolHandler, RunSqlInput, RunSqlOutput};
use crate::tools::schema::{GetTableInfoInput, ListTablesOutput, SchemaToolHandler};
use crate::tools::write::{AffectedRowsOutput, RunSqlWriteInput, WriteToolHandler};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::router::prompt::PromptRouter,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        AnnotateAble, GetPromptRequestParam, GetPromptResult, Implementation,
        ListPromptsResult, ListResourcesResult, PaginatedRequestParam, PromptMessage,
        PromptMessageRole, ProtocolVersion, RawResource, ReadResourceRequestParam,
        ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
    },
    prompt, prompt_handler, prompt_router,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use serde_json::json;
use std::sync::Arc;

/// URI of the live schema resource.
pub const SCHEMA_RESOURCE_URI: &str = "schema://current";

#[derive(Clone)]
pub struct ChinookService {
    db: Database,
    /// Customer/invoice table names resolved at startup
    tables: Arc<TableNames>,
    max_write_rows: u64,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

impl ChinookService {
    pub fn new(db: Database, tables: Arc<TableNames>) -> Self {
        Self::with_write_limit(db, tables, DEFAULT_MAX_AFFECTED_ROWS)
    }

    pub fn with_write_limit(db: Database, tables: Arc<TableNames>, max_write_rows: u64) -> Self {
        Self {
            db,
            tables,
            max_write_rows,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    /// Pretty-printed JSON snapshot of every table, recomputed per read.
    pub async fn schema_json(&self) -> Result<String, McpError> {
        let ctx = CallContext::new("schema_resource");
        let snapshot = SchemaToolHandler::new(self.db.clone())
            .snapshot(&ctx)
            .await
            .map_err(McpError::from)?;
        serde_json::to_string_pretty(&snapshot)
            .map_err(|e| McpError::internal_error(format!("Failed to encode schema: {}", e), None))
    }

    /// Contents of the resource at `uri`; only `schema://current` exists.
    pub async fn read_schema_resource(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        if uri != SCHEMA_RESOURCE_URI {
            return Err(McpError::resource_not_found(
                "resource_not_found",
                Some(json!({ "uri": uri })),
            ));
        }
        let text = self.schema_json().await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }

    fn customer_handler(&self) -> CustomerToolHandler {
        CustomerToolHandler::new(self.db.clone(), self.tables.clone())
    }
}

#[tool_router]
impl ChinookService {
    #[tool(description = "List every user table with its current row count, sorted by name.")]
    async fn list_tables(&self) -> Result<Json<ListTablesOutput>, McpError> {
        let ctx = CallContext::new("list_tables");
        SchemaToolHandler::new(self.db.clone())
            .list_tables(&ctx)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Describe one table: columns (name, type, pk, not_null, default) and foreign keys.\nThe name is matched exactly first, then case-insensitively."
    )]
    async fn get_table_info(
        &self,
        Parameters(input): Parameters<GetTableInfoInput>,
    ) -> Result<Json<TableDescription>, McpError> {
        let ctx = CallContext::new("get_table_info");
        SchemaToolHandler::new(self.db.clone())
            .get_table_info(&ctx, input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run a single SELECT statement and return columns and rows.\n`params` is an array for `?` placeholders or an object for `:name` placeholders. Multiple statements are rejected."
    )]
    async fn run_sql(
        &self,
        Parameters(input): Parameters<RunSqlInput>,
    ) -> Result<Json<RunSqlOutput>, McpError> {
        let ctx = CallContext::new("run_sql");
        QueryToolHandler::new(self.db.clone())
            .run_sql(&ctx, input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run a single INSERT, UPDATE, DELETE or REPLACE statement.\n`params` is an array for `?` placeholders or an object for `:name` placeholders. The write is rolled back if it would change more rows than the server limit, trigger changes included."
    )]
    async fn run_sql_write(
        &self,
        Parameters(input): Parameters<RunSqlWriteInput>,
    ) -> Result<Json<AffectedRowsOutput>, McpError> {
        let ctx = CallContext::new("run_sql_write");
        WriteToolHandler::with_limit(self.db.clone(), self.max_write_rows)
            .run_sql_write(&ctx, input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(description = "Insert a customer and return the new customer_id.\nThe email must look like local@domain.tld.")]
    async fn insert_customer(
        &self,
        Parameters(input): Parameters<InsertCustomerInput>,
    ) -> Result<Json<InsertCustomerOutput>, McpError> {
        let ctx = CallContext::new("insert_customer");
        self.customer_handler()
            .insert_customer(&ctx, input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Change a customer's email.\nReturns affected_rows; 0 means no customer has that id."
    )]
    async fn update_customer_email(
        &self,
        Parameters(input): Parameters<UpdateCustomerEmailInput>,
    ) -> Result<Json<AffectedRowsOutput>, McpError> {
        let ctx = CallContext::new("update_customer_email");
        self.customer_handler()
            .update_customer_email(&ctx, input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Rank customers by total invoice spend, highest first.\n`limit` is 1 to 100, default 5. Customers without invoices count as 0."
    )]
    async fn top_customers(
        &self,
        Parameters(input): Parameters<TopCustomersInput>,
    ) -> Result<Json<TopCustomersOutput>, McpError> {
        let ctx = CallContext::new("top_customers");
        self.customer_handler()
            .top_customers(&ctx, input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Create an invoice with one or more lines in a single transaction.\nEach item needs track_id, unit_price and quantity > 0. Any failing line rolls back the whole invoice."
    )]
    async fn create_invoice(
        &self,
        Parameters(input): Parameters<CreateInvoiceInput>,
    ) -> Result<Json<CreateInvoiceOutput>, McpError> {
        let ctx = CallContext::new("create_invoice");
        InvoiceToolHandler::new(self.db.clone(), self.tables.clone())
            .create_invoice(&ctx, input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }
}

#[prompt_router]
impl ChinookService {
    #[prompt(
        name = "explain_query_purpose",
        description = "Describe in plain words what a SQL statement appears to do, without running it."
    )]
    async fn explain_query_purpose(
        &self,
        Parameters(args): Parameters<ExplainPromptArgs>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        Ok(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            explain_query_purpose(&args.sql),
        )])
    }
}

#[tool_handler]
#[prompt_handler]
impl ServerHandler for ChinookService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "chinook-mcp-server".to_owned(),
                title: Some("Chinook MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Tools for the Chinook music-store sample database (SQLite).\n\
                \n\
                ## Reading\n\
                - `list_tables` and `get_table_info` describe the schema; the \
                  `schema://current` resource returns all of it as JSON\n\
                - `run_sql` runs one SELECT with `?` params (array) or `:name` params (object)\n\
                - `top_customers` ranks customers by total spend\n\
                \n\
                ## Writing\n\
                - `insert_customer`, `update_customer_email` and `create_invoice` \
                  validate their input and run in one transaction each\n\
                - `run_sql_write` runs one INSERT/UPDATE/DELETE/REPLACE and is rolled \
                  back if it affects too many rows\n\
                \n\
                Writes go to a working copy of the database, never the original file."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let mut schema = RawResource::new(SCHEMA_RESOURCE_URI, "schema");
        schema.description = Some("Current database schema: every table with columns and foreign keys".into());
        schema.mime_type = Some("application/json".into());
        Ok(ListResourcesResult::with_all_items(vec![schema.no_annotation()]))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        self.read_schema_resource(&request.uri).await
    }
}
