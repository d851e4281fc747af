// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{expenses, forecast, products, sales};
use crate::charts::{Chart, ChartKind};
use crate::config::Config;
use crate::error::toast_for;
use crate::models::{Expense, Product, Transaction};
use crate::utils::{currency_symbol, fmt_money, maybe_print_json, pretty_table, today};

/// Charts look at this many of the most recent transactions.
pub const CHART_WINDOW: usize = 14;

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    crate::session::require_user(conn)?;
    render(conn, cfg, m.get_flag("json"), m.get_flag("jsonl"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub gross: Decimal,
    pub net: Decimal,
    pub transactions: usize,
    pub average_order_value: Decimal,
    pub expenses: Decimal,
}

impl Kpis {
    pub fn zero() -> Self {
        Kpis {
            gross: Decimal::ZERO,
            net: Decimal::ZERO,
            transactions: 0,
            average_order_value: Decimal::ZERO,
            expenses: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub kpis: Kpis,
    pub charts: Vec<Chart>,
}

pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

pub fn compute_kpis(txs: &[Transaction], exps: &[Expense]) -> Kpis {
    let gross: Decimal = txs.iter().map(|t| t.gross).sum();
    let net: Decimal = txs.iter().map(|t| t.net).sum();
    let count = txs.len();
    let aov = if count == 0 {
        Decimal::ZERO
    } else {
        net / Decimal::from(count)
    };
    Kpis {
        gross,
        net,
        transactions: count,
        average_order_value: aov,
        expenses: exps.iter().map(|e| e.amount).sum(),
    }
}

/// The chart window, oldest first. `txs` must be newest first.
fn recent_window(txs: &[Transaction]) -> Vec<&Transaction> {
    let mut w: Vec<&Transaction> = txs.iter().take(CHART_WINDOW).collect();
    w.reverse();
    w
}

pub fn daily_revenue_chart(txs: &[Transaction]) -> Chart {
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for t in recent_window(txs) {
        *by_day.entry(t.date).or_insert(Decimal::ZERO) += t.net;
    }
    let (labels, values): (Vec<String>, Vec<f64>) = by_day
        .into_iter()
        .map(|(d, v)| (d.to_string(), v.to_f64().unwrap_or(0.0)))
        .unzip();
    Chart::single("chart-daily", "Daily revenue", ChartKind::Bar, "Revenue", labels, values)
}

pub fn sales_trend_chart(txs: &[Transaction]) -> Chart {
    let window = recent_window(txs);
    let labels = window.iter().map(|t| t.date.format("%b %d").to_string()).collect();
    let values = window.iter().map(|t| t.net.to_f64().unwrap_or(0.0)).collect();
    Chart::single("chart-sales-trend", "Sales trend", ChartKind::Line, "Net sales", labels, values)
}

/// Catalog value by category, in order of first appearance.
pub fn category_chart(products: &[Product]) -> Chart {
    let mut labels: Vec<String> = Vec::new();
    let mut values: Vec<f64> = Vec::new();
    for p in products {
        let price = p.price.to_f64().unwrap_or(0.0);
        match labels.iter().position(|l| l == &p.category) {
            Some(i) => values[i] += price,
            None => {
                labels.push(p.category.clone());
                values.push(price);
            }
        }
    }
    if labels.is_empty() {
        labels.push("No data".to_string());
        values.push(1.0);
    }
    Chart::single("chart-category", "Sales by category", ChartKind::Doughnut, "Category", labels, values)
}

fn load_month(conn: &Connection, day: NaiveDate) -> Result<(Vec<Transaction>, Vec<Expense>)> {
    let start = month_start(day);
    let txs = sales::query_range(conn, Some(start), None)?;
    let exps = expenses::query_range(conn, Some(start), None)?;
    Ok((txs, exps))
}

pub fn build(conn: &Connection, day: NaiveDate) -> DashboardView {
    let (kpis, txs) = match load_month(conn, day).context("Failed to load dashboard data") {
        Ok((txs, exps)) => (compute_kpis(&txs, &exps), txs),
        Err(err) => {
            tracing::error!(error = %err, "dashboard query failed");
            eprintln!("{}", toast_for(&err));
            (Kpis::zero(), Vec::new())
        }
    };

    let mut charts = vec![daily_revenue_chart(&txs), sales_trend_chart(&txs)];
    match products::query_all(conn).context("Failed to load category chart") {
        Ok(p) => charts.push(category_chart(&p)),
        Err(err) => {
            eprintln!("{}", toast_for(&err));
            charts.push(
                Chart::new("chart-category", "Sales by category", ChartKind::Doughnut)
                    .with_status("Category data unavailable."),
            );
        }
    }
    charts.extend(forecast::predictive_charts(conn));
    DashboardView { kpis, charts }
}

pub fn render(conn: &Connection, cfg: &Config, json_flag: bool, jsonl_flag: bool) -> Result<()> {
    let view = build(conn, today());
    if maybe_print_json(json_flag, jsonl_flag, &view)? {
        return Ok(());
    }
    let sym = currency_symbol(conn, cfg)?;
    let k = &view.kpis;
    let rows = vec![vec![
        fmt_money(&sym, &k.gross),
        fmt_money(&sym, &k.net),
        k.transactions.to_string(),
        fmt_money(&sym, &k.average_order_value),
        fmt_money(&sym, &k.expenses),
    ]];
    println!(
        "{}",
        pretty_table(
            &["Gross sales", "Net sales", "Transactions", "Avg order", "Expenses"],
            rows
        )
    );
    for chart in &view.charts {
        println!("{}", chart.render_text());
    }
    Ok(())
}
