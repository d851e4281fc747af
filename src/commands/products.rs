// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::db::{new_id, now_stamp};
use crate::models::Product;
use crate::session;
use crate::utils::{maybe_print_json, parse_amount_lenient, pretty_table, stored_decimal};

pub const DEFAULT_CATEGORY: &str = "General";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = session::require_user(conn)?;
            session::require_data_entry(&user)?;
            let name = sub.get_one::<String>("name").unwrap().trim();
            let category = sub.get_one::<String>("category").map(|s| s.as_str());
            let price = parse_amount_lenient(sub.get_one::<String>("price").unwrap());
            add_product(conn, name, category, price)?;
            println!("Product added successfully.");
        }
        Some(("list", sub)) => {
            let products = query_all(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &products)? {
                let rows = products
                    .iter()
                    .map(|p| vec![p.name.clone(), p.category.clone(), format!("{:.2}", p.price)])
                    .collect();
                println!("{}", pretty_table(&["Name", "Category", "Price"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

/// A blank category is stored as "General".
pub fn add_product(
    conn: &Connection,
    name: &str,
    category: Option<&str>,
    price: Decimal,
) -> Result<String> {
    let category = category
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY);
    let id = new_id();
    conn.execute(
        "INSERT INTO products(id, name, category, price, created_at) VALUES (?1,?2,?3,?4,?5)",
        params![id, name.trim(), category, price.to_string(), now_stamp()],
    )
    .context("Could not add product")?;
    Ok(id)
}

/// Every product, sorted by name. A missing category reads as "Other".
pub fn query_all(conn: &Connection) -> Result<Vec<Product>> {
    let mut stmt = conn.prepare("SELECT id, name, category, price FROM products")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, Option<String>>(1)?,
            r.get::<_, Option<String>>(2)?,
            r.get::<_, Option<String>>(3)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, name, category, price) = row?;
        out.push(Product {
            id,
            name: name.unwrap_or_default(),
            category: category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Other".to_string()),
            price: price.as_deref().map(stored_decimal).unwrap_or(Decimal::ZERO),
        });
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}
