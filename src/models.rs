// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Owner,
    Manager,
    Admin,
    Other(String),
}

impl Role {
    /// Stored roles are free text; missing or blank means owner.
    pub fn from_stored(raw: Option<&str>) -> Role {
        let r = raw.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        match r.as_str() {
            "" | "owner" => Role::Owner,
            "manager" => Role::Manager,
            "admin" => Role::Admin,
            _ => Role::Other(r),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Owner => "owner",
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::Other(s) => s,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(c) => write!(f, "{}{}", c.to_uppercase(), chars.as_str()),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub created_at: Option<String>,
}

/// A row of the user management list. The role is kept as stored, so an
/// account without one shows as such instead of as an owner.
#[derive(Debug, Clone, Serialize)]
pub struct UserListing {
    pub id: String,
    pub email: String,
    pub role: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub gross: Decimal,
    pub net: Decimal,
    pub notes: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub insight: String,
    pub suggested_action: String,
    pub expected_outcome: Option<String>,
    pub severity: Option<String>,
    pub icon: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionPoint {
    pub date: String,
    pub predicted_sales: f64,
    pub actual_sales: Option<f64>,
    pub item_name: Option<String>,
    pub predicted_demand: Option<f64>,
}

/// Views reachable from the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Dashboard,
    Reports,
    DataEntry,
    Notifications,
    Users,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Dashboard,
        Route::Reports,
        Route::DataEntry,
        Route::Notifications,
        Route::Users,
    ];

    /// Unknown or empty routes fall back to the dashboard.
    pub fn parse(raw: &str) -> Route {
        match raw.trim().trim_start_matches('#') {
            "reports" => Route::Reports,
            "data-entry" => Route::DataEntry,
            "notifications" => Route::Notifications,
            "users" => Route::Users,
            _ => Route::Dashboard,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Route::Dashboard => "dashboard",
            Route::Reports => "reports",
            Route::DataEntry => "data-entry",
            Route::Notifications => "notifications",
            Route::Users => "users",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::Reports => "Reports",
            Route::DataEntry => "Data Entry",
            Route::Notifications => "Notifications",
            Route::Users => "User Management",
        }
    }
}
