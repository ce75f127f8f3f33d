//! Shared fixture: a small Chinook-shaped database in either naming variant.

#![allow(dead_code)]

use chinook_mcp_server::db::{Database, TableNames, ensure_working_copy, integrity_check};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Rows in the Scratch table; one more than the default write cap.
pub const SCRATCH_ROWS: i64 = 10_001;

#[derive(Debug, Clone, Copy)]
pub enum Naming {
    /// Customer / Invoice / InvoiceLine / Track
    Classic,
    /// customers / invoices / invoice_items / tracks
    Snake,
}

impl Naming {
    pub fn customers(self) -> &'static str {
        match self {
            Naming::Classic => "Customer",
            Naming::Snake => "customers",
        }
    }

    pub fn invoices(self) -> &'static str {
        match self {
            Naming::Classic => "Invoice",
            Naming::Snake => "invoices",
        }
    }

    pub fn invoice_items(self) -> &'static str {
        match self {
            Naming::Classic => "InvoiceLine",
            Naming::Snake => "invoice_items",
        }
    }

    pub fn tracks(self) -> &'static str {
        match self {
            Naming::Classic => "Track",
            Naming::Snake => "tracks",
        }
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub base: PathBuf,
    pub working_dir: PathBuf,
}

pub struct Env {
    pub fixture: Fixture,
    pub db: Database,
    pub tables: Arc<TableNames>,
}

fn schema(naming: Naming) -> Vec<String> {
    let (c, i, l, t) = (
        naming.customers(),
        naming.invoices(),
        naming.invoice_items(),
        naming.tracks(),
    );
    vec![
        format!(
            "CREATE TABLE {c} (
                CustomerId INTEGER PRIMARY KEY AUTOINCREMENT,
                FirstName NVARCHAR(40) NOT NULL,
                LastName NVARCHAR(20) NOT NULL,
                Company NVARCHAR(80),
                City NVARCHAR(40),
                Country NVARCHAR(40),
                Email NVARCHAR(60) NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE {t} (
                TrackId INTEGER PRIMARY KEY AUTOINCREMENT,
                Name NVARCHAR(200) NOT NULL,
                UnitPrice NUMERIC(10,2) NOT NULL,
                Cover BLOB
            )"
        ),
        format!(
            "CREATE TABLE {i} (
                InvoiceId INTEGER PRIMARY KEY AUTOINCREMENT,
                CustomerId INTEGER NOT NULL REFERENCES {c} (CustomerId),
                InvoiceDate DATETIME NOT NULL,
                BillingAddress NVARCHAR(70),
                BillingCity NVARCHAR(40),
                BillingState NVARCHAR(40),
                BillingCountry NVARCHAR(40),
                BillingPostalCode NVARCHAR(10),
                Total NUMERIC(10,2) NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE {l} (
                InvoiceLineId INTEGER PRIMARY KEY AUTOINCREMENT,
                InvoiceId INTEGER NOT NULL REFERENCES {i} (InvoiceId),
                TrackId INTEGER NOT NULL REFERENCES {t} (TrackId),
                UnitPrice NUMERIC(10,2) NOT NULL,
                Quantity INTEGER NOT NULL DEFAULT 1
            )"
        ),
        "CREATE TABLE Scratch (id INTEGER PRIMARY KEY, n INTEGER NOT NULL)".to_string(),
        format!(
            "INSERT INTO {c} (CustomerId, FirstName, LastName, City, Country, Email) VALUES
                (1, 'Ana', 'Silva', 'Lisbon', 'Portugal', 'ana@example.com'),
                (2, 'Bruno', 'Costa', 'Porto', 'Portugal', 'bruno@example.com'),
                (3, 'Carla', 'Dias', 'Braga', 'Portugal', 'carla@example.com'),
                (4, 'Dan', 'Evans', 'Leeds', 'United Kingdom', 'dan@example.com')"
        ),
        format!(
            "INSERT INTO {t} (TrackId, Name, UnitPrice, Cover) VALUES
                (1, 'For Those About To Rock', 0.99, X'DEADBEEF'),
                (2, 'Balls to the Wall', 1.99, NULL),
                (3, 'Fast As a Shark', 0.99, NULL)"
        ),
        format!(
            "INSERT INTO {i} (InvoiceId, CustomerId, InvoiceDate, Total) VALUES
                (1, 1, '2024-01-01 00:00:00', 10.0),
                (2, 2, '2024-01-02 00:00:00', 5.0),
                (3, 3, '2024-01-03 00:00:00', 10.0)"
        ),
        format!(
            "INSERT INTO {l} (InvoiceId, TrackId, UnitPrice, Quantity) VALUES
                (1, 1, 0.99, 1),
                (2, 2, 1.99, 1),
                (3, 3, 0.99, 1)"
        ),
        format!(
            "INSERT INTO Scratch (n)
             WITH RECURSIVE seq(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM seq WHERE x < {SCRATCH_ROWS})
             SELECT x FROM seq"
        ),
    ]
}

/// Write a fresh base database at `path`.
pub async fn create_base(path: &Path, naming: Naming) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
    for statement in schema(naming) {
        sqlx::query(&statement).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();
}

pub async fn fixture(naming: Naming) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("chinook.db");
    create_base(&base, naming).await;
    let working_dir = dir.path().join("working");
    Fixture {
        dir,
        base,
        working_dir,
    }
}

/// Base file, refreshed working copy, integrity check and resolved tables.
pub async fn setup(naming: Naming) -> Env {
    let fixture = fixture(naming).await;
    let copy = ensure_working_copy(&fixture.base, &fixture.working_dir, false).unwrap();
    let db = Database::new(&copy.path);
    integrity_check(&db).await.unwrap();
    let tables = Arc::new(TableNames::resolve(&db).await.unwrap());
    Env {
        fixture,
        db,
        tables,
    }
}

/// Single scalar from the working copy, bypassing the tool layer.
pub async fn scalar_i64(db: &Database, sql: &str) -> i64 {
    let mut conn = db.connect().await.unwrap();
    let value: i64 = sqlx::query_scalar(sql).fetch_one(&mut conn).await.unwrap();
    conn.close().await.unwrap();
    value
}
