//! Error types for the Chinook MCP server.
//!
//! Every failure a tool can produce is a [`DbError`]. Variants carry enough
//! context for an assistant to correct its next call; startup-only variants
//! (integrity, table resolution, config, I/O) abort the process before the
//! server starts listening.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Not found: {what} '{name}'")]
    NotFound { what: String, name: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// SQLite extended result code, e.g. "787" for a foreign key violation
        code: Option<String>,
        suggestion: String,
    },

    #[error("Write affected {affected} rows, exceeding the limit of {limit}; rolled back")]
    CapacityExceeded { affected: u64, limit: u64 },

    #[error("Integrity check failed: {detail}")]
    Integrity { detail: String },

    #[error("Could not resolve table for '{role}' (tried: {})", .candidates.join(", "))]
    TableResolution {
        role: String,
        candidates: Vec<String>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            name: name.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a database error with an optional SQLite result code.
    pub fn database(
        message: impl Into<String>,
        code: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            code,
            suggestion: suggestion.into(),
        }
    }

    pub fn capacity_exceeded(affected: u64, limit: u64) -> Self {
        Self::CapacityExceeded { affected, limit }
    }

    pub fn integrity(detail: impl Into<String>) -> Self {
        Self::Integrity {
            detail: detail.into(),
        }
    }

    pub fn table_resolution(role: impl Into<String>, candidates: &[&str]) -> Self {
        Self::TableResolution {
            role: role.into(),
            candidates: candidates.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Database { suggestion, .. } => Some(suggestion),
            Self::CapacityExceeded { .. } => {
                Some("Narrow the WHERE clause so fewer rows are touched per call")
            }
            Self::NotFound { .. } => Some("Call list_tables to see the available tables"),
            Self::Conflict { .. } => Some("A row with the same key already exists"),
            _ => None,
        }
    }

    /// True for errors that must stop the server from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Integrity { .. } | Self::TableResolution { .. } | Self::Config { .. } | Self::Io { .. }
        )
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::config(msg.to_string()),
            sqlx::Error::Database(db_err) => {
                if let sqlx::error::ErrorKind::UniqueViolation = db_err.kind() {
                    return DbError::conflict(db_err.message());
                }
                let code = db_err.code().map(|c| c.to_string());
                let suggestion = match db_err.kind() {
                    sqlx::error::ErrorKind::ForeignKeyViolation => {
                        "A referenced row does not exist; check the ids you passed"
                    }
                    sqlx::error::ErrorKind::NotNullViolation => {
                        "A required column was left empty"
                    }
                    _ => "Check the SQL syntax and referenced objects",
                };
                DbError::database(db_err.message(), code, suggestion)
            }
            sqlx::Error::RowNotFound => DbError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::Io(io_err) => DbError::Io {
                path: "database".to_string(),
                source: io_err,
            },
            sqlx::Error::ColumnNotFound(col) => {
                DbError::internal(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert DbError to MCP ErrorData.
/// Caller mistakes map to invalid_params; everything else is internal_error.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::InvalidInput { .. }
            | DbError::NotFound { .. }
            | DbError::CapacityExceeded { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), suggestion_data(err.suggestion()))
            }

            DbError::Conflict { .. } => {
                rmcp::ErrorData::invalid_request(err.to_string(), suggestion_data(err.suggestion()))
            }

            // Database errors -> invalid_params with the SQLite code in the message
            DbError::Database {
                message,
                code,
                suggestion,
            } => {
                let msg = match code {
                    Some(code) => format!("{} (SQLite code: {})", message, code),
                    None => message.clone(),
                };
                rmcp::ErrorData::invalid_params(msg, suggestion_data(Some(suggestion)))
            }

            DbError::Integrity { .. }
            | DbError::TableResolution { .. }
            | DbError::Config { .. }
            | DbError::Io { .. }
            | DbError::Internal { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), suggestion_data(err.suggestion()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::invalid_input("limit must be between 1 and 100");
        assert_eq!(
            err.to_string(),
            "Invalid input: limit must be between 1 and 100"
        );
    }

    #[test]
    fn test_table_resolution_lists_candidates() {
        let err = DbError::table_resolution("customers", &["customers", "Customer"]);
        let msg = err.to_string();
        assert!(msg.contains("'customers'"));
        assert!(msg.contains("customers, Customer"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_tool_errors_are_not_fatal() {
        assert!(!DbError::invalid_input("x").is_fatal());
        assert!(!DbError::capacity_exceeded(10_001, 10_000).is_fatal());
        assert!(!DbError::database("fk", Some("787".into()), "s").is_fatal());
    }

    #[test]
    fn test_invalid_input_maps_to_invalid_params() {
        let mcp_err: rmcp::ErrorData = DbError::invalid_input("bad input").into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_not_found_maps_to_invalid_params_with_suggestion() {
        let mcp_err: rmcp::ErrorData = DbError::not_found("table", "Nope").into();
        assert_eq!(mcp_err.code.0, -32602);
        let data = mcp_err.data.unwrap();
        assert!(data["suggestion"].as_str().unwrap().contains("list_tables"));
    }

    #[test]
    fn test_capacity_exceeded_maps_to_invalid_params() {
        let err = DbError::capacity_exceeded(10_001, 10_000);
        assert!(err.to_string().contains("10001"));
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_database_error_includes_code() {
        let err = DbError::database(
            "FOREIGN KEY constraint failed",
            Some("787".to_string()),
            "check ids",
        );
        let mcp_err: rmcp::ErrorData = err.into();
        assert!(mcp_err.message.contains("787"));
        assert_eq!(mcp_err.data.unwrap()["suggestion"], "check ids");
    }

    #[test]
    fn test_internal_maps_to_internal_error() {
        let mcp_err: rmcp::ErrorData = DbError::internal("unknown error").into();
        assert_eq!(mcp_err.code.0, -32603);
    }

    #[test]
    fn test_integrity_maps_to_internal_error() {
        let mcp_err: rmcp::ErrorData = DbError::integrity("page 3 corrupt").into();
        assert_eq!(mcp_err.code.0, -32603);
    }
}
