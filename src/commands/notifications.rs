// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::error::toast_for;
use crate::models::Recommendation;
use crate::utils::maybe_print_json;

pub const FEED_LIMIT: usize = 10;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    crate::session::require_user(conn)?;
    render(conn, m.get_flag("json"), m.get_flag("jsonl"))
}

/// Newest recommendations first.
pub fn latest(conn: &Connection, limit: usize) -> Result<Vec<Recommendation>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, insight, suggested_action, expected_outcome, severity, icon, created_at
         FROM recommendations ORDER BY created_at DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |r| {
        Ok(Recommendation {
            id: r.get(0)?,
            title: r.get(1)?,
            insight: r.get(2)?,
            suggested_action: r.get(3)?,
            expected_outcome: r.get(4)?,
            severity: r.get(5)?,
            icon: r.get(6)?,
            created_at: r.get(7)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn render_card(rec: &Recommendation) -> String {
    let icon = rec.icon.as_deref().filter(|s| !s.is_empty()).unwrap_or("📊");
    let title = if rec.title.is_empty() { "AI Insight" } else { &rec.title };
    let when = rec
        .created_at
        .as_deref()
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "Recently".to_string());

    let mut card = format!("{} {}\n", icon, title);
    if !rec.insight.is_empty() {
        card.push_str(&format!("   Insight: {}\n", rec.insight));
    }
    if !rec.suggested_action.is_empty() {
        card.push_str(&format!("   Suggested Action: {}\n", rec.suggested_action));
    }
    if let Some(outcome) = rec.expected_outcome.as_deref().filter(|s| !s.is_empty()) {
        card.push_str(&format!("   Expected Outcome: {}\n", outcome));
    }
    card.push_str(&format!("   {}\n", when));
    card
}

pub fn render(conn: &Connection, json_flag: bool, jsonl_flag: bool) -> Result<()> {
    let recs = match latest(conn, FEED_LIMIT).context("Failed to load notifications") {
        Ok(r) => r,
        Err(err) => {
            eprintln!("{}", toast_for(&err));
            println!("⚠️ Error Loading Notifications");
            println!("   Unable to fetch recommendations. Please try again later.");
            return Ok(());
        }
    };
    if maybe_print_json(json_flag, jsonl_flag, &recs)? {
        return Ok(());
    }
    if recs.is_empty() {
        println!("🤖 No Recommendations Yet");
        println!(
            "   AI-powered recommendations will appear here once data analysis begins. \
             Upload your sales and market data to get started."
        );
        return Ok(());
    }
    for rec in &recs {
        println!("{}", render_card(rec));
    }
    Ok(())
}
