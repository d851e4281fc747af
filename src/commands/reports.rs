// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{expenses, products, sales};
use crate::config::Config;
use crate::error::toast_for;
use crate::utils::{currency_symbol, fmt_money, maybe_print_json, pretty_table, today};

pub const DEFAULT_PERIOD_DAYS: i64 = 30;
const EXPENSE_PREVIEW: usize = 5;
const PRODUCT_PREVIEW: usize = 10;

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    crate::session::require_user(conn)?;
    let days = parse_period(m.get_one::<String>("days").map(|s| s.as_str()).unwrap_or(""));
    render(conn, cfg, days, m.get_flag("json"), m.get_flag("jsonl"))
}

/// Period selector input; anything unusable means the 30-day default.
pub fn parse_period(raw: &str) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(d) if d >= 1 => d,
        _ => DEFAULT_PERIOD_DAYS,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section<T> {
    Ok(T),
    Error(String),
}

impl<T> Section<T> {
    fn from_result(res: Result<T>, context: &'static str, fallback: &str) -> Self {
        match res.context(context) {
            Ok(v) => Section::Ok(v),
            Err(err) => {
                eprintln!("{}", toast_for(&err));
                Section::Error(fallback.to_string())
            }
        }
    }

    pub fn ok(&self) -> Option<&T> {
        match self {
            Section::Ok(v) => Some(v),
            Section::Error(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SalesSummary {
    pub gross: Decimal,
    pub net: Decimal,
    pub transactions: usize,
}

#[derive(Debug, Serialize)]
pub struct ExpenseLine {
    pub description: String,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ExpenseSummary {
    pub total: Decimal,
    pub entries: usize,
    pub preview: Vec<ExpenseLine>,
}

#[derive(Debug, Serialize)]
pub struct ProductLine {
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ReportView {
    pub days: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub sales: Section<SalesSummary>,
    pub expenses: Section<ExpenseSummary>,
    pub products: Section<Vec<ProductLine>>,
}

pub fn build(conn: &Connection, end: NaiveDate, days: i64) -> ReportView {
    let start = end - Duration::days(days);

    let sales = Section::from_result(
        sales::query_range(conn, Some(start), Some(end)).map(|txs| SalesSummary {
            gross: txs.iter().map(|t| t.gross).sum(),
            net: txs.iter().map(|t| t.net).sum(),
            transactions: txs.len(),
        }),
        "Failed to load sales data",
        "Unable to load sales data.",
    );

    let expenses = Section::from_result(
        expenses::query_range(conn, Some(start), Some(end)).map(|exps| ExpenseSummary {
            total: exps.iter().map(|e| e.amount).sum(),
            entries: exps.len(),
            preview: exps
                .iter()
                .take(EXPENSE_PREVIEW)
                .map(|e| ExpenseLine {
                    description: if e.description.is_empty() {
                        "Unknown".to_string()
                    } else {
                        e.description.clone()
                    },
                    amount: e.amount,
                })
                .collect(),
        }),
        "Failed to load expense data",
        "Unable to load expense data.",
    );

    let products = Section::from_result(
        products::query_all(conn).map(|ps| {
            ps.into_iter()
                .take(PRODUCT_PREVIEW)
                .map(|p| ProductLine {
                    name: if p.name.is_empty() { p.id } else { p.name },
                    price: p.price,
                })
                .collect()
        }),
        "Failed to load products",
        "Unable to load products.",
    );

    ReportView {
        days,
        start,
        end,
        sales,
        expenses,
        products,
    }
}

pub fn render(
    conn: &Connection,
    cfg: &Config,
    days: i64,
    json_flag: bool,
    jsonl_flag: bool,
) -> Result<()> {
    let view = build(conn, today(), days);
    if maybe_print_json(json_flag, jsonl_flag, &view)? {
        return Ok(());
    }
    let sym = currency_symbol(conn, cfg)?;
    println!("Period: {} to {} ({} days)", view.start, view.end, view.days);

    println!("\nSales");
    match &view.sales {
        Section::Ok(s) => {
            println!("Gross: {}", fmt_money(&sym, &s.gross));
            println!("Net: {}", fmt_money(&sym, &s.net));
            println!("Transactions: {}", s.transactions);
        }
        Section::Error(msg) => println!("{}", msg),
    }

    println!("\nExpenses");
    match &view.expenses {
        Section::Ok(e) => {
            println!("Total Expenses: {}", fmt_money(&sym, &e.total));
            println!("Expense entries: {}", e.entries);
            if !e.preview.is_empty() {
                let rows = e
                    .preview
                    .iter()
                    .map(|l| vec![l.description.clone(), fmt_money(&sym, &l.amount)])
                    .collect();
                println!("{}", pretty_table(&["Description", "Amount"], rows));
            }
        }
        Section::Error(msg) => println!("{}", msg),
    }

    println!("\nProducts");
    match &view.products {
        Section::Ok(ps) if ps.is_empty() => println!("No products yet."),
        Section::Ok(ps) => {
            let rows = ps
                .iter()
                .map(|p| vec![p.name.clone(), fmt_money(&sym, &p.price)])
                .collect();
            println!("{}", pretty_table(&["Product", "Price"], rows));
        }
        Section::Error(msg) => println!("{}", msg),
    }
    Ok(())
}
