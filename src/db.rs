// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

use crate::config::Config;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Dinedash", "dinedash"));

/// Collections cleared by a full data reset. Users and settings survive.
pub const RESETTABLE_COLLECTIONS: [&str; 8] = [
    "transactions",
    "products",
    "expenses",
    "sales_data",
    "market_historical_data",
    "recommendations",
    "processed_stats",
    "prediction_history",
];

pub fn db_path(cfg: &Config) -> Result<PathBuf> {
    if let Some(p) = &cfg.db_path {
        if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        return Ok(p.clone());
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("dinedash.sqlite"))
}

pub fn open_or_init(cfg: &Config) -> Result<Connection> {
    let path = db_path(cfg)?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users(
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id TEXT PRIMARY KEY,
        date TEXT NOT NULL,
        gross TEXT NOT NULL,
        net TEXT NOT NULL,
        notes TEXT,
        created_by TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);

    CREATE TABLE IF NOT EXISTS products(
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        category TEXT,
        price TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS expenses(
        id TEXT PRIMARY KEY,
        date TEXT NOT NULL,
        amount TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_by TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);

    CREATE TABLE IF NOT EXISTS sales_data(
        id TEXT PRIMARY KEY,
        date TEXT,
        amount TEXT NOT NULL,
        item_name TEXT NOT NULL DEFAULT '',
        order_number TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sales_data_date ON sales_data(date);

    CREATE TABLE IF NOT EXISTS market_historical_data(
        id TEXT PRIMARY KEY,
        date TEXT,
        amount TEXT NOT NULL,
        ingredient_name TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_market_date ON market_historical_data(date);

    CREATE TABLE IF NOT EXISTS recommendations(
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        insight TEXT NOT NULL DEFAULT '',
        suggested_action TEXT NOT NULL DEFAULT '',
        expected_outcome TEXT,
        severity TEXT,
        ingredient TEXT,
        correlation_strength REAL,
        source_trends TEXT, -- JSON array
        ai_generated INTEGER NOT NULL DEFAULT 0,
        read INTEGER NOT NULL DEFAULT 0,
        icon TEXT,
        kind TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_recommendations_created ON recommendations(created_at);

    CREATE TABLE IF NOT EXISTS processed_stats(
        id TEXT PRIMARY KEY,
        analysis_date TEXT NOT NULL,
        correlations TEXT NOT NULL, -- JSON
        trends TEXT NOT NULL,       -- JSON
        status TEXT NOT NULL,
        kind TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS prediction_history(
        id TEXT PRIMARY KEY,
        date TEXT NOT NULL,
        predicted_sales REAL NOT NULL DEFAULT 0,
        actual_sales REAL,
        item_name TEXT,
        predicted_demand REAL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_prediction_date ON prediction_history(date);
    "#,
    )?;
    Ok(())
}

/// New opaque document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Server-style creation timestamp (RFC 3339, UTC).
pub fn now_stamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
