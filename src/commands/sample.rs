// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::db::{new_id, now_stamp};
use crate::models::UserProfile;
use crate::session;
use crate::utils::today;

const PRODUCTS: [(&str, &str, i64); 6] = [
    ("Chicken Bucket", "Main", 299),
    ("Fried Chicken 2pc", "Main", 159),
    ("Rice", "Sides", 35),
    ("Gravy", "Sides", 25),
    ("Cola", "Drinks", 45),
    ("Iced Tea", "Drinks", 40),
];

/// (days ago, amount, description)
const EXPENSES: [(i64, i64, &str); 5] = [
    (2, 3500, "Chicken supply"),
    (5, 1200, "Cooking oil"),
    (7, 800, "Cleaning supplies"),
    (10, 4500, "Weekly groceries"),
    (14, 2200, "Beverages"),
];

const HISTORY_DAYS: i64 = 21;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("load", sub)) = m.subcommand() {
        let user = session::require_user(conn)?;
        session::require_data_entry(&user)?;
        let mut rng = match sub.get_one::<u64>("seed") {
            Some(seed) => StdRng::seed_from_u64(*seed),
            None => StdRng::from_os_rng(),
        };
        let batch = sample_batch(today(), &mut rng);
        load(conn, &user, &batch).context("Could not load sample data")?;
        println!("Sample data loaded successfully.");
        println!(
            "  {} products, {} transactions, {} expenses",
            batch.products.len(),
            batch.transactions.len(),
            batch.expenses.len()
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleTransaction {
    pub date: NaiveDate,
    pub gross: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleBatch {
    pub products: Vec<(String, String, Decimal)>,
    pub transactions: Vec<SampleTransaction>,
    pub expenses: Vec<(NaiveDate, Decimal, String)>,
}

/// Three weeks of plausible trading ending on `day`.
pub fn sample_batch<R: Rng>(day: NaiveDate, rng: &mut R) -> SampleBatch {
    let products = PRODUCTS
        .iter()
        .map(|(n, c, p)| (n.to_string(), c.to_string(), Decimal::from(*p)))
        .collect();

    let mut transactions = Vec::new();
    for d in (0..=HISTORY_DAYS).rev() {
        let date = day - Duration::days(d);
        for _ in 0..(2 + d % 3) {
            let gross = 400 + rng.random_range(0..=3500i64);
            let ratio = 0.82 + rng.random::<f64>() * 0.1;
            let net = (gross as f64 * ratio).round() as i64;
            transactions.push(SampleTransaction {
                date,
                gross: Decimal::from(gross),
                net: Decimal::from(net),
            });
        }
    }

    let expenses = EXPENSES
        .iter()
        .map(|(ago, amount, desc)| {
            (day - Duration::days(*ago), Decimal::from(*amount), desc.to_string())
        })
        .collect();

    SampleBatch {
        products,
        transactions,
        expenses,
    }
}

/// Write the whole batch atomically.
pub fn load(conn: &mut Connection, user: &UserProfile, batch: &SampleBatch) -> Result<()> {
    let tx = conn.transaction()?;
    let stamp = now_stamp();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO products(id, name, category, price, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (name, category, price) in &batch.products {
            stmt.execute(params![new_id(), name, category, price.to_string(), stamp])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO transactions(id, date, gross, net, notes, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6)",
        )?;
        for t in &batch.transactions {
            stmt.execute(params![
                new_id(),
                t.date.to_string(),
                t.gross.to_string(),
                t.net.to_string(),
                user.id,
                stamp
            ])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO expenses(id, date, amount, description, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (date, amount, desc) in &batch.expenses {
            stmt.execute(params![
                new_id(),
                date.to_string(),
                amount.to_string(),
                desc,
                user.id,
                stamp
            ])?;
        }
    }
    tx.commit()?;
    tracing::info!(
        transactions = batch.transactions.len(),
        user = %user.email,
        "sample data loaded"
    );
    Ok(())
}
