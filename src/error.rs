// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashError {
    #[error("Please sign in first (dinedash login).")]
    NotSignedIn,
    #[error("permission denied: only {required} can {action}.")]
    Forbidden {
        action: &'static str,
        required: &'static str,
    },
    #[error("Net amount cannot exceed gross amount ({net} > {gross}).")]
    NetExceedsGross { net: Decimal, gross: Decimal },
    #[error("Please map all required fields: {}", .0.join(", "))]
    MissingMappings(Vec<String>),
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("A user with email '{0}' already exists.")]
    DuplicateUser(String),
    #[error("Insufficient data for analysis: {0}")]
    InsufficientData(&'static str),
    #[error("Unknown data type '{0}' (use sales|market)")]
    UnknownSchema(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    IndexRequired,
    PermissionDenied,
    Network,
    Other,
}

/// Classify a failure into one of the user-facing toast buckets.
pub fn classify(err: &anyhow::Error) -> FailureKind {
    for cause in err.chain() {
        if let Some(d) = cause.downcast_ref::<DashError>() {
            if matches!(d, DashError::Forbidden { .. } | DashError::NotSignedIn) {
                return FailureKind::PermissionDenied;
            }
        }
        if cause.downcast_ref::<reqwest::Error>().is_some() {
            return FailureKind::Network;
        }
        if let Some(rusqlite::Error::SqliteFailure(e, _)) = cause.downcast_ref::<rusqlite::Error>()
        {
            use rusqlite::ErrorCode;
            match e.code {
                ErrorCode::ReadOnly | ErrorCode::AuthorizationForStatementDenied
                | ErrorCode::PermissionDenied => return FailureKind::PermissionDenied,
                ErrorCode::CannotOpen | ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    return FailureKind::Network;
                }
                _ => {}
            }
        }
    }

    let msg = err.root_cause().to_string().to_lowercase();
    if msg.contains("no such table")
        || msg.contains("no such index")
        || (msg.contains("index") && msg.contains("composite"))
    {
        FailureKind::IndexRequired
    } else if msg.contains("permission") {
        FailureKind::PermissionDenied
    } else if msg.contains("offline") || msg.contains("network") {
        FailureKind::Network
    } else {
        FailureKind::Other
    }
}

/// Render a failure as a single toast line: `<context>: <reason>`.
pub fn toast_for(err: &anyhow::Error) -> String {
    let root = err.root_cause().to_string();
    let outer = err.to_string();
    let context = if outer == root {
        "Operation failed".to_string()
    } else {
        outer
    };
    match classify(err) {
        FailureKind::IndexRequired => format!(
            "{}: Database schema required. Run `dinedash init` to create it.",
            context
        ),
        FailureKind::PermissionDenied => {
            if let Some(d) = err.chain().find_map(|c| c.downcast_ref::<DashError>()) {
                format!("{}: {}", context, d)
            } else {
                format!("{}: Permission denied. Check the database file permissions.", context)
            }
        }
        FailureKind::Network => format!(
            "{}: Network error. Please check your connection.",
            context
        ),
        FailureKind::Other => format!("{}: {}", context, root),
    }
}
