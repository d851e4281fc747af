// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ingredient cost versus sales correlation over uploaded data.
//!
//! Sales rows are summed per day, market rows are averaged per day and
//! ingredient, and the two are inner-joined on date. Every ingredient with at
//! least three joined days gets a Pearson correlation against daily sales and
//! daily transaction count. Strong negative correlations with rising costs,
//! and strong positive ones with falling costs, become trend alerts.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::db::{new_id, now_stamp};
use crate::error::DashError;
use crate::session;
use crate::stats::{mean, pearson, round_to};
use crate::utils::{parse_amount_lenient, pretty_table, today};

pub const DEFAULT_WINDOW_DAYS: i64 = 90;
const MIN_POINTS: usize = 3;
const STRONG_CORRELATION: f64 = 0.5;
const SIGNIFICANCE: f64 = 0.05;
pub const STATS_KIND: &str = "ingredient_sales_correlation";

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("run", sub)) = m.subcommand() {
        let user = session::require_user(conn)?;
        session::require_data_entry(&user)?;
        let days = sub
            .get_one::<i64>("days")
            .copied()
            .unwrap_or(DEFAULT_WINDOW_DAYS);
        let outcome = run_analysis(conn, today(), days)?;
        print_outcome(&outcome);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub item_name: String,
    pub order_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub ingredient: String,
}

fn amount_f64(raw: &str) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    parse_amount_lenient(raw).to_f64().unwrap_or(0.0)
}

fn stored_day(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
}

pub fn fetch_sales(conn: &Connection, since: NaiveDate) -> Result<Vec<SalesRecord>> {
    let mut stmt = conn.prepare(
        "SELECT date, amount, item_name, order_number FROM sales_data
         WHERE date IS NOT NULL AND date >= ?1",
    )?;
    let rows = stmt.query_map(params![since.to_string()], |r| {
        Ok((
            r.get::<_, Option<String>>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
            r.get::<_, Option<String>>(3)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (date, amount, item, order) = row?;
        if let Some(date) = stored_day(date) {
            out.push(SalesRecord {
                date,
                amount: amount_f64(&amount),
                item_name: item.unwrap_or_default(),
                order_number: order,
            });
        }
    }
    tracing::debug!(records = out.len(), "fetched sales data");
    Ok(out)
}

pub fn fetch_market(conn: &Connection, since: NaiveDate) -> Result<Vec<MarketRecord>> {
    let mut stmt = conn.prepare(
        "SELECT date, amount, ingredient_name FROM market_historical_data
         WHERE date IS NOT NULL AND date >= ?1",
    )?;
    let rows = stmt.query_map(params![since.to_string()], |r| {
        Ok((
            r.get::<_, Option<String>>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (date, amount, ingredient) = row?;
        if let Some(date) = stored_day(date) {
            out.push(MarketRecord {
                date,
                amount: amount_f64(&amount),
                ingredient: ingredient.unwrap_or_default(),
            });
        }
    }
    tracing::debug!(records = out.len(), "fetched market data");
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedDay {
    pub date: NaiveDate,
    pub total_sales: f64,
    pub transaction_count: usize,
    pub items_sold: Vec<String>,
    /// Mean cost per ingredient on this day.
    pub costs: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinedData {
    pub days: Vec<JoinedDay>,
    /// Every ingredient seen in the market data, sorted.
    pub ingredients: Vec<String>,
}

/// Daily totals joined with the daily ingredient cost pivot, by date.
pub fn join_on_date(sales: &[SalesRecord], market: &[MarketRecord]) -> JoinedData {
    let mut daily: BTreeMap<NaiveDate, (f64, usize, Vec<String>)> = BTreeMap::new();
    for s in sales {
        let e = daily.entry(s.date).or_default();
        e.0 += s.amount;
        if s.order_number.is_some() {
            e.1 += 1;
        }
        e.2.push(s.item_name.clone());
    }

    let mut cost_sums: BTreeMap<(NaiveDate, String), (f64, usize)> = BTreeMap::new();
    let mut ingredients = BTreeSet::new();
    for m in market {
        let e = cost_sums.entry((m.date, m.ingredient.clone())).or_default();
        e.0 += m.amount;
        e.1 += 1;
        ingredients.insert(m.ingredient.clone());
    }
    let mut pivot: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();
    for ((date, ingredient), (sum, n)) in cost_sums {
        pivot.entry(date).or_default().insert(ingredient, sum / n as f64);
    }

    let days = daily
        .into_iter()
        .filter_map(|(date, (total_sales, transaction_count, items_sold))| {
            pivot.remove(&date).map(|costs| JoinedDay {
                date,
                total_sales,
                transaction_count,
                items_sold,
                costs,
            })
        })
        .collect();
    JoinedData {
        days,
        ingredients: ingredients.into_iter().collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Positive,
    Negative,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientCorrelation {
    pub ingredient: String,
    pub correlation_with_sales: f64,
    pub correlation_with_transactions: f64,
    pub p_value_sales: f64,
    pub p_value_transactions: f64,
    pub trend: TrendDirection,
    pub insight: String,
    pub cost_change_percent: f64,
    pub sales_change_percent: f64,
    pub data_points: usize,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub total_ingredients_analyzed: usize,
    pub significant_correlations: usize,
    pub strongest_correlation: Option<String>,
    pub avg_correlation_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub analysis_date: String,
    pub total_days_analyzed: usize,
    pub date_range: DateRange,
    pub ingredient_correlations: Vec<IngredientCorrelation>,
    pub summary: Option<CorrelationSummary>,
}

fn percent_change(first: f64, last: f64) -> f64 {
    if first == 0.0 {
        0.0
    } else {
        (last - first) / first * 100.0
    }
}

/// r and p for a pair of series; degenerate series count as uncorrelated.
fn correlate_series(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    pearson(xs, ys).unwrap_or((0.0, 1.0))
}

pub fn correlate_ingredient(joined: &JoinedData, ingredient: &str) -> Option<IngredientCorrelation> {
    let valid: Vec<(&JoinedDay, f64)> = joined
        .days
        .iter()
        .filter_map(|d| d.costs.get(ingredient).map(|c| (d, *c)))
        .collect();
    if valid.len() < MIN_POINTS {
        return None;
    }
    let costs: Vec<f64> = valid.iter().map(|(_, c)| *c).collect();
    let sales: Vec<f64> = valid.iter().map(|(d, _)| d.total_sales).collect();
    let txns: Vec<f64> = valid.iter().map(|(d, _)| d.transaction_count as f64).collect();

    let (r_sales, p_sales) = correlate_series(&sales, &costs);
    let (r_txn, p_txn) = correlate_series(&txns, &costs);

    let (trend, insight) = if r_sales.abs() > STRONG_CORRELATION {
        if r_sales > 0.0 {
            (
                TrendDirection::Positive,
                format!("As {} cost increases, sales tend to increase", ingredient),
            )
        } else {
            (
                TrendDirection::Negative,
                format!("As {} cost increases, sales tend to decrease", ingredient),
            )
        }
    } else {
        (
            TrendDirection::Weak,
            format!("No strong correlation between {} cost and sales", ingredient),
        )
    };

    let cost_change = percent_change(costs[0], costs[costs.len() - 1]);
    let sales_change = percent_change(sales[0], sales[sales.len() - 1]);

    Some(IngredientCorrelation {
        ingredient: ingredient.to_string(),
        correlation_with_sales: round_to(r_sales, 4),
        correlation_with_transactions: round_to(r_txn, 4),
        p_value_sales: round_to(p_sales, 4),
        p_value_transactions: round_to(p_txn, 4),
        trend,
        insight,
        cost_change_percent: round_to(cost_change, 2),
        sales_change_percent: round_to(sales_change, 2),
        data_points: valid.len(),
        significant: p_sales < SIGNIFICANCE,
    })
}

pub fn summarize(correlations: &[IngredientCorrelation]) -> Option<CorrelationSummary> {
    if correlations.is_empty() {
        return None;
    }
    let mut strongest = &correlations[0];
    for c in &correlations[1..] {
        if c.correlation_with_sales.abs() > strongest.correlation_with_sales.abs() {
            strongest = c;
        }
    }
    let strengths: Vec<f64> = correlations
        .iter()
        .map(|c| c.correlation_with_sales.abs())
        .collect();
    Some(CorrelationSummary {
        total_ingredients_analyzed: correlations.len(),
        significant_correlations: correlations.iter().filter(|c| c.significant).count(),
        strongest_correlation: Some(strongest.ingredient.clone()),
        avg_correlation_strength: mean(&strengths),
    })
}

pub fn calculate_correlations(joined: &JoinedData) -> CorrelationReport {
    let ingredient_correlations: Vec<IngredientCorrelation> = joined
        .ingredients
        .iter()
        .filter_map(|i| correlate_ingredient(joined, i))
        .collect();
    tracing::info!(
        ingredients = ingredient_correlations.len(),
        days = joined.days.len(),
        "calculated correlations"
    );
    CorrelationReport {
        analysis_date: now_stamp(),
        total_days_analyzed: joined.days.len(),
        date_range: DateRange {
            start: joined.days.first().map(|d| d.date),
            end: joined.days.last().map(|d| d.date),
        },
        summary: summarize(&ingredient_correlations),
        ingredient_correlations,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Opportunity,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Opportunity => "opportunity",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::High => "⚠️",
            Severity::Opportunity => "💡",
            Severity::Medium => "📊",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub ingredient: String,
    pub trend: String,
    pub severity: Severity,
    pub correlation_strength: f64,
    pub action_needed: bool,
}

impl Trend {
    pub fn suggested_action(&self) -> String {
        let i = &self.ingredient;
        match self.severity {
            Severity::High => format!(
                "Consider finding alternative suppliers for {} or adjust menu pricing to maintain margins.",
                i
            ),
            Severity::Medium => format!(
                "Monitor {} prices closely and consider bulk purchasing when prices are favorable.",
                i
            ),
            Severity::Opportunity => format!(
                "Take advantage of lower {} prices by promoting menu items that use this ingredient.",
                i
            ),
        }
    }
}

pub fn identify_trends(report: &CorrelationReport) -> Vec<Trend> {
    report
        .ingredient_correlations
        .iter()
        .filter_map(|c| {
            let cost = c.cost_change_percent;
            let (text, severity) = match c.trend {
                TrendDirection::Negative if cost > 10.0 => (
                    format!(
                        "{} price up {:.1}%, sales down {:.1}%",
                        c.ingredient,
                        cost,
                        c.sales_change_percent.abs()
                    ),
                    if cost > 20.0 { Severity::High } else { Severity::Medium },
                ),
                TrendDirection::Positive if cost < -10.0 => (
                    format!(
                        "{} price down {:.1}%, opportunity to increase sales",
                        c.ingredient,
                        cost.abs()
                    ),
                    Severity::Opportunity,
                ),
                _ => return None,
            };
            Some(Trend {
                ingredient: c.ingredient.clone(),
                trend: text,
                severity,
                correlation_strength: c.correlation_with_sales.abs(),
                action_needed: true,
            })
        })
        .collect()
}

/// Persist the analysis and one trend alert per actionable trend.
/// Returns the processed stats id.
pub fn save_processed_stats(
    conn: &mut Connection,
    report: &CorrelationReport,
    trends: &[Trend],
) -> Result<String> {
    let tx = conn.transaction()?;
    let id = new_id();
    tx.execute(
        "INSERT INTO processed_stats(id, analysis_date, correlations, trends, status, kind)
         VALUES (?1, ?2, ?3, ?4, 'completed', ?5)",
        params![
            id,
            now_stamp(),
            serde_json::to_string(report)?,
            serde_json::to_string(trends)?,
            STATS_KIND
        ],
    )?;
    for t in trends.iter().filter(|t| t.action_needed) {
        tx.execute(
            "INSERT INTO recommendations(id, title, insight, suggested_action, severity, ingredient,
                correlation_strength, icon, kind, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'trend_alert', ?9)",
            params![
                new_id(),
                format!("Trend Alert: {}", t.ingredient),
                t.trend,
                t.suggested_action(),
                t.severity.as_str(),
                t.ingredient,
                t.correlation_strength,
                t.severity.icon(),
                now_stamp()
            ],
        )?;
    }
    tx.commit()?;
    tracing::info!(stats_id = %id, alerts = trends.len(), "saved processed stats");
    Ok(id)
}

/// Trends from the most recent analysis, or none when nothing was analyzed yet.
pub fn latest_trends(conn: &Connection) -> Result<Vec<Trend>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT trends FROM processed_stats ORDER BY analysis_date DESC LIMIT 1",
            [],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(json) => serde_json::from_str(&json).context("Corrupt trends in processed_stats"),
        None => Ok(Vec::new()),
    }
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub stats_id: String,
    pub report: CorrelationReport,
    pub trends: Vec<Trend>,
}

pub fn run_analysis(conn: &mut Connection, day: NaiveDate, days: i64) -> Result<AnalysisOutcome> {
    let since = day - Duration::days(days);
    let sales = fetch_sales(conn, since).context("Error fetching sales data")?;
    let market = fetch_market(conn, since).context("Error fetching market data")?;
    if sales.is_empty() {
        return Err(DashError::InsufficientData("no sales data in window").into());
    }
    if market.is_empty() {
        return Err(DashError::InsufficientData("no market data in window").into());
    }
    let joined = join_on_date(&sales, &market);
    if joined.days.is_empty() {
        return Err(DashError::InsufficientData("sales and market data share no dates").into());
    }
    let report = calculate_correlations(&joined);
    let trends = identify_trends(&report);
    let stats_id = save_processed_stats(conn, &report, &trends)
        .context("Error saving processed stats")?;
    Ok(AnalysisOutcome {
        stats_id,
        report,
        trends,
    })
}

fn print_outcome(outcome: &AnalysisOutcome) {
    let r = &outcome.report;
    println!(
        "Analyzed {} days ({} to {})",
        r.total_days_analyzed,
        r.date_range.start.map(|d| d.to_string()).unwrap_or_default(),
        r.date_range.end.map(|d| d.to_string()).unwrap_or_default()
    );
    if r.ingredient_correlations.is_empty() {
        println!("No ingredient had enough overlapping days to correlate.");
    } else {
        let rows = r
            .ingredient_correlations
            .iter()
            .map(|c| {
                vec![
                    c.ingredient.clone(),
                    format!("{:.4}", c.correlation_with_sales),
                    format!("{:.4}", c.p_value_sales),
                    format!("{:.2}%", c.cost_change_percent),
                    format!("{:.2}%", c.sales_change_percent),
                    c.data_points.to_string(),
                    format!("{:?}", c.trend).to_lowercase(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Ingredient", "r (sales)", "p", "Cost Δ", "Sales Δ", "Days", "Trend"],
                rows
            )
        );
    }
    if let Some(s) = &r.summary {
        println!(
            "Significant: {}/{}  Strongest: {}  Mean |r|: {:.3}",
            s.significant_correlations,
            s.total_ingredients_analyzed,
            s.strongest_correlation.as_deref().unwrap_or("-"),
            s.avg_correlation_strength
        );
    }
    for t in &outcome.trends {
        println!("{} Trend Alert: {} ({})", t.severity.icon(), t.trend, t.severity);
    }
    println!("Saved analysis {}", outcome.stats_id);
}
