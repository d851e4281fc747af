// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::db::{new_id, now_stamp};
use crate::models::{Expense, UserProfile};
use crate::session;
use crate::utils::{
    maybe_print_json, parse_amount_lenient, parse_date, pretty_table, stored_decimal, today,
};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = session::require_user(conn)?;
            session::require_data_entry(&user)?;
            let date = match sub.get_one::<String>("date") {
                Some(d) => parse_date(d)?,
                None => today(),
            };
            let amount = parse_amount_lenient(sub.get_one::<String>("amount").unwrap());
            let desc = sub.get_one::<String>("description").unwrap().trim();
            record_expense(conn, &user, date, amount, desc)?;
            println!("Expense saved successfully.");
        }
        Some(("list", sub)) => {
            let start = sub
                .get_one::<i64>("days")
                .map(|d| today() - Duration::days(*d));
            let mut data = query_range(conn, start, None)?;
            if let Some(limit) = sub.get_one::<usize>("limit") {
                data.truncate(*limit);
            }
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|e| {
                        vec![
                            e.date.to_string(),
                            format!("{:.2}", e.amount),
                            e.description.clone(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Date", "Amount", "Description"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn record_expense(
    conn: &Connection,
    user: &UserProfile,
    date: NaiveDate,
    amount: Decimal,
    description: &str,
) -> Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO expenses(id, date, amount, description, created_by, created_at)
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            id,
            date.to_string(),
            amount.to_string(),
            description,
            user.id,
            now_stamp()
        ],
    )
    .context("Could not save expense")?;
    Ok(id)
}

/// Expenses dated within `[start, end]`, newest first.
pub fn query_range(
    conn: &Connection,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, amount, description FROM expenses
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
                r.get::<_, Option<String>>(3)?,
            ))
        },
    )?;
    let mut out = Vec::new();
    for row in rows {
        let (id, d, amount, description) = row?;
        out.push(Expense {
            id,
            date: parse_date(&d)?,
            amount: stored_decimal(&amount),
            description: description.unwrap_or_default(),
        });
    }
    Ok(out)
}
