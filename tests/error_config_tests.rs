// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Context;
use dinedash::config::{self, Config};
use dinedash::error::{DashError, FailureKind, classify, toast_for};
use rusqlite::Connection;
use std::path::PathBuf;

#[test]
fn missing_table_asks_for_schema() {
    let conn = Connection::open_in_memory().unwrap();
    let err = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get::<_, i64>(0))
        .context("Error loading dashboard data")
        .unwrap_err();
    assert_eq!(classify(&err), FailureKind::IndexRequired);
    assert_eq!(
        toast_for(&err),
        "Error loading dashboard data: Database schema required. Run `dinedash init` to create it."
    );
}

#[test]
fn role_failures_keep_their_message() {
    let err = anyhow::Error::from(DashError::Forbidden {
        action: "reset data",
        required: "Admin",
    })
    .context("Error resetting data");
    assert_eq!(classify(&err), FailureKind::PermissionDenied);
    assert_eq!(
        toast_for(&err),
        "Error resetting data: permission denied: only Admin can reset data."
    );

    let err = anyhow::Error::from(DashError::NotSignedIn);
    assert_eq!(classify(&err), FailureKind::PermissionDenied);
    assert!(toast_for(&err).starts_with("Operation failed: Please sign in first"));
}

#[test]
fn other_failures_show_the_root_cause() {
    let err = anyhow::anyhow!("disk full").context("Could not save prediction");
    assert_eq!(classify(&err), FailureKind::Other);
    assert_eq!(toast_for(&err), "Could not save prediction: disk full");

    let err = anyhow::anyhow!("client is offline");
    assert_eq!(classify(&err), FailureKind::Network);
}

#[test]
fn config_defaults_without_environment() {
    let cfg = Config::from_lookup(|_| None);
    assert_eq!(cfg.db_path, None);
    assert_eq!(cfg.currency_symbol, None);
    assert_eq!(cfg.gemini, None);
}

#[test]
fn config_trims_and_ignores_blank_values() {
    let cfg = Config::from_lookup(|k| match k {
        "DINEDASH_DB" => Some(" /tmp/dash.sqlite ".into()),
        "DINEDASH_CURRENCY" => Some("   ".into()),
        "GEMINI_API_KEY" => Some(" key ".into()),
        "GEMINI_MODEL" => Some("".into()),
        "GEMINI_TIMEOUT_SECS" => Some("soon".into()),
        _ => None,
    });
    assert_eq!(cfg.db_path, Some(PathBuf::from("/tmp/dash.sqlite")));
    assert_eq!(cfg.currency_symbol, None);
    let g = cfg.gemini.unwrap();
    assert_eq!(g.api_key, "key");
    assert_eq!(g.model, config::DEFAULT_GEMINI_MODEL);
    assert_eq!(g.base_url, config::DEFAULT_GEMINI_BASE_URL);
    assert_eq!(g.timeout_secs, config::DEFAULT_GEMINI_TIMEOUT_SECS);
}
