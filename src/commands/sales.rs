// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::{new_id, now_stamp};
use crate::error::DashError;
use crate::models::{Transaction, UserProfile};
use crate::session;
use crate::utils::{
    maybe_print_json, parse_amount_lenient, parse_date, pretty_table, stored_decimal, today,
};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewSale {
    pub date: NaiveDate,
    pub gross: Decimal,
    pub net: Decimal,
    pub notes: Option<String>,
}

/// Validate and store one sale. Net may never exceed gross.
pub fn record_sale(conn: &Connection, user: &UserProfile, sale: &NewSale) -> Result<String> {
    if sale.net > sale.gross {
        return Err(DashError::NetExceedsGross {
            net: sale.net,
            gross: sale.gross,
        }
        .into());
    }
    let id = new_id();
    conn.execute(
        "INSERT INTO transactions(id, date, gross, net, notes, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            sale.date.to_string(),
            sale.gross.to_string(),
            sale.net.to_string(),
            sale.notes.as_deref(),
            user.id,
            now_stamp()
        ],
    )
    .context("Could not save sale")?;
    Ok(id)
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = session::require_user(conn)?;
    session::require_data_entry(&user)?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => today(),
    };
    let sale = NewSale {
        date,
        gross: parse_amount_lenient(sub.get_one::<String>("gross").unwrap()),
        net: parse_amount_lenient(sub.get_one::<String>("net").unwrap()),
        notes: sub
            .get_one::<String>("notes")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()),
    };
    record_sale(conn, &user, &sale)?;
    println!("Sale saved successfully.");
    Ok(())
}

/// Transactions dated within `[start, end]` (either bound optional), newest first.
pub fn query_range(
    conn: &Connection,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, gross, net, notes, created_by FROM transactions
         WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
         ORDER BY date DESC, created_at DESC",
    )?;
    let rows = stmt.query_map(
        params![start.map(|d| d.to_string()), end.map(|d| d.to_string())],
        |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, Option<String>>(4)?,
                r.get::<_, String>(5)?,
            ))
        },
    )?;
    let mut out = Vec::new();
    for row in rows {
        let (id, d, gross, net, notes, created_by) = row?;
        out.push(Transaction {
            id,
            date: parse_date(&d)?,
            gross: stored_decimal(&gross),
            net: stored_decimal(&net),
            notes,
            created_by,
        });
    }
    Ok(out)
}

#[derive(Serialize)]
pub struct SaleRow {
    pub date: String,
    pub gross: String,
    pub net: String,
    pub notes: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<SaleRow>> {
    let start = sub
        .get_one::<i64>("days")
        .map(|d| today() - Duration::days(*d));
    let mut txs = query_range(conn, start, None)?;
    if let Some(limit) = sub.get_one::<usize>("limit") {
        txs.truncate(*limit);
    }
    Ok(txs
        .into_iter()
        .map(|t| SaleRow {
            date: t.date.to_string(),
            gross: format!("{:.2}", t.gross),
            net: format!("{:.2}", t.net),
            notes: t.notes.unwrap_or_default(),
        })
        .collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| vec![r.date.clone(), r.gross.clone(), r.net.clone(), r.notes.clone()])
            .collect();
        println!("{}", pretty_table(&["Date", "Gross", "Net", "Notes"], rows));
    }
    Ok(())
}
