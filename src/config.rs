//! Configuration handling for the Chinook MCP server.
//!
//! Every option can be given as a command line flag or an environment
//! variable. Values are read once at startup; [`Config::validate`] checks the
//! filesystem preconditions before anything else touches the database.

use crate::error::{DbError, DbResult};
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};

pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 8787;
pub const DEFAULT_MCP_PATH: &str = "/mcp";
pub const DEFAULT_DB_BASE_PATH: &str = "server/db/chinook.db";
pub const DEFAULT_DB_WORKING_DIR: &str = "server/db/working";
pub const DEFAULT_MAX_WRITE_ROWS: u64 = 10_000;

/// Parse the loose boolean spellings operators put in `.env` files.
///
/// `1`, `true`, `yes` and `on` (any case) are true; everything else is false.
pub fn parse_flag(value: &str) -> Result<bool, String> {
    Ok(matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    ))
}

/// Configuration for the Chinook MCP server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "chinook-mcp-server",
    about = "MCP tool server for the Chinook SQLite sample database",
    version,
    author
)]
pub struct Config {
    /// HTTP host to bind to
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "HOST")]
    pub host: String,

    /// HTTP port to bind to
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "PORT")]
    pub port: u16,

    /// Mount path of the MCP endpoint; protected by the bearer token when one is set
    #[arg(long = "mcp-path", default_value = DEFAULT_MCP_PATH, env = "MCP_PATH")]
    pub mcp_path: String,

    /// Pristine Chinook database file. Never written to.
    #[arg(long, default_value = DEFAULT_DB_BASE_PATH, env = "DB_BASE_PATH")]
    pub db_base_path: PathBuf,

    /// Directory holding the working copy all tools operate on
    #[arg(long, default_value = DEFAULT_DB_WORKING_DIR, env = "DB_WORKING_DIR")]
    pub db_working_dir: PathBuf,

    /// Keep the working copy between restarts instead of refreshing it from the base file
    #[arg(
        long,
        env = "PERSIST_WORKING_COPY",
        default_value = "false",
        value_parser = parse_flag,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub persist_working_copy: bool,

    /// Bearer token required on the MCP path. Unset or blank disables auth.
    #[arg(long = "token", env = "LOCAL_MCP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,

    /// Maximum rows a single run_sql_write call may touch before it is rolled back
    #[arg(long, default_value_t = DEFAULT_MAX_WRITE_ROWS, env = "MAX_WRITE_ROWS")]
    pub max_write_rows: u64,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            mcp_path: DEFAULT_MCP_PATH.to_string(),
            db_base_path: PathBuf::from(DEFAULT_DB_BASE_PATH),
            db_working_dir: PathBuf::from(DEFAULT_DB_WORKING_DIR),
            persist_working_copy: false,
            token: None,
            log_level: "info".to_string(),
            json_logs: false,
            max_write_rows: DEFAULT_MAX_WRITE_ROWS,
        }
    }

    /// Check startup preconditions and create the working directory.
    pub fn validate(&self) -> DbResult<()> {
        if !self.mcp_path.starts_with('/') {
            return Err(DbError::config(format!(
                "MCP_PATH must start with '/', got '{}'",
                self.mcp_path
            )));
        }
        if self.max_write_rows == 0 {
            return Err(DbError::config("MAX_WRITE_ROWS must be greater than 0"));
        }
        if !self.db_base_path.is_file() {
            return Err(DbError::config(format!(
                "Base database not found at {}. Place chinook.db there or set DB_BASE_PATH.",
                self.db_base_path.display()
            )));
        }
        ensure_dir(&self.db_working_dir)
    }

    /// The configured token, with blank values treated as unset.
    ///
    /// A non-blank token is returned exactly as configured.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

fn ensure_dir(dir: &Path) -> DbResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| DbError::io(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8787);
        assert_eq!(config.mcp_path, "/mcp");
        assert!(!config.persist_working_copy);
        assert_eq!(config.max_write_rows, 10_000);
        assert!(config.token().is_none());
    }

    #[test]
    fn test_bind_addr() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Config::default()
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_parse_flag() {
        for v in ["1", "true", "TRUE", "yes", "On", " true "] {
            assert_eq!(parse_flag(v), Ok(true), "{v}");
        }
        for v in ["0", "false", "no", "off", "", "maybe"] {
            assert_eq!(parse_flag(v), Ok(false), "{v}");
        }
    }

    #[test]
    fn test_blank_token_is_unset() {
        let config = Config {
            token: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(config.token().is_none());

        let config = Config {
            token: Some(" s3cret ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.token(), Some(" s3cret "));
    }

    #[test]
    fn test_parse_from_args() {
        let config = Config::try_parse_from([
            "chinook-mcp-server",
            "--port",
            "9000",
            "--mcp-path",
            "/tools",
            "--persist-working-copy",
            "yes",
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.mcp_path, "/tools");
        assert!(config.persist_working_copy);
    }

    #[test]
    fn test_validate_rejects_relative_mount() {
        let config = Config {
            mcp_path: "mcp".to_string(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_validate_missing_base_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db_base_path: dir.path().join("missing.db"),
            db_working_dir: dir.path().join("working"),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("chinook.db"));
    }

    #[test]
    fn test_validate_creates_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("chinook.db");
        std::fs::write(&base, b"").unwrap();
        let working = dir.path().join("nested").join("working");
        let config = Config {
            db_base_path: base,
            db_working_dir: working.clone(),
            ..Config::default()
        };
        config.validate().unwrap();
        assert!(working.is_dir());
    }
}
