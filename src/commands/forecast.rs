// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::Duration;
use rusqlite::{params, Connection};

use crate::charts::{Chart, ChartKind, Dataset};
use crate::db::{new_id, now_stamp};
use crate::models::PredictionPoint;
use crate::session;
use crate::utils::{maybe_print_json, parse_date, pretty_table};

pub const HISTORY_POINTS: usize = 7;
pub const FORECAST_DAYS: usize = 7;
pub const DEMAND_ITEMS: usize = 10;
pub const COMPARISON_POINTS: usize = 14;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = session::require_user(conn)?;
            session::require_data_entry(&user)?;
            let point = PredictionPoint {
                date: parse_date(sub.get_one::<String>("date").unwrap())?.to_string(),
                predicted_sales: *sub.get_one::<f64>("predicted").unwrap(),
                actual_sales: sub.get_one::<f64>("actual").copied(),
                item_name: sub
                    .get_one::<String>("item")
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                predicted_demand: sub.get_one::<f64>("demand").copied(),
            };
            record_point(conn, &point)?;
            println!("Prediction recorded for {}", point.date);
        }
        Some(("show", sub)) => {
            session::require_user(conn)?;
            let charts = predictive_charts(conn);
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &charts)? {
                let recent = latest_by_date(conn, COMPARISON_POINTS)?;
                if !recent.is_empty() {
                    println!("{}", history_rows(&recent));
                }
                for c in &charts {
                    println!("{}", c.render_text());
                }
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn record_point(conn: &Connection, p: &PredictionPoint) -> Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO prediction_history(id, date, predicted_sales, actual_sales, item_name, predicted_demand, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            p.date,
            p.predicted_sales,
            p.actual_sales,
            p.item_name,
            p.predicted_demand,
            now_stamp()
        ],
    )
    .context("Could not save prediction")?;
    Ok(id)
}

fn read_points(conn: &Connection, sql: &str, limit: usize) -> Result<Vec<PredictionPoint>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![limit as i64], |r| {
        Ok(PredictionPoint {
            date: r.get(0)?,
            predicted_sales: r.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
            actual_sales: r.get(2)?,
            item_name: r.get(3)?,
            predicted_demand: r.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// The latest `limit` points by date, returned oldest first.
pub fn latest_by_date(conn: &Connection, limit: usize) -> Result<Vec<PredictionPoint>> {
    let mut pts = read_points(
        conn,
        "SELECT date, predicted_sales, actual_sales, item_name, predicted_demand
         FROM prediction_history ORDER BY date DESC, created_at DESC LIMIT ?1",
        limit,
    )?;
    pts.reverse();
    Ok(pts)
}

/// Points carrying a demand figure, highest demand first.
pub fn top_demand(conn: &Connection, limit: usize) -> Result<Vec<PredictionPoint>> {
    read_points(
        conn,
        "SELECT date, predicted_sales, actual_sales, item_name, predicted_demand
         FROM prediction_history WHERE predicted_demand IS NOT NULL
         ORDER BY predicted_demand DESC LIMIT ?1",
        limit,
    )
}

/// Next `days` values continuing the last step of `history`.
pub fn extrapolate(history: &[f64], days: usize) -> Vec<f64> {
    let last = history.last().copied().unwrap_or(0.0);
    let trend = match history {
        [.., prev, last] => last - prev,
        _ => 0.0,
    };
    vec![last + trend; days]
}

/// Mean accuracy in percent over the points with a usable actual figure.
pub fn forecast_accuracy(points: &[PredictionPoint]) -> Option<f64> {
    let errors: Vec<f64> = points
        .iter()
        .filter_map(|p| {
            p.actual_sales
                .filter(|a| *a != 0.0)
                .map(|a| (p.predicted_sales - a).abs() / a)
        })
        .collect();
    if errors.is_empty() {
        return None;
    }
    let mean = errors.iter().sum::<f64>() / errors.len() as f64;
    Some((1.0 - mean) * 100.0)
}

pub fn predicted_sales_chart(history: &[PredictionPoint]) -> Result<Chart> {
    let mut chart = Chart::new("chart-predicted-sales", "Predicted sales", ChartKind::Line);
    if history.is_empty() {
        return Ok(chart.with_status(
            "📊 No prediction data yet. Upload data and run analytics to generate forecasts.",
        ));
    }
    let values: Vec<f64> = history.iter().map(|p| p.predicted_sales).collect();
    let last = history
        .last()
        .map(|p| p.date.as_str())
        .unwrap_or_default();
    let last_date = parse_date(last).map_err(|_| anyhow!("Invalid prediction date '{}'", last))?;
    let future = extrapolate(&values, FORECAST_DAYS);

    chart.labels = history.iter().map(|p| p.date.clone()).collect();
    chart
        .labels
        .extend((1..=FORECAST_DAYS as i64).map(|i| (last_date + Duration::days(i)).to_string()));

    let mut historical: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    historical.extend(std::iter::repeat_n(None, FORECAST_DAYS));
    let mut projected: Vec<Option<f64>> = vec![None; values.len()];
    projected.extend(future.into_iter().map(Some));

    chart.datasets = vec![
        Dataset { label: "Historical".to_string(), data: historical },
        Dataset { label: "7-Day Forecast".to_string(), data: projected },
    ];
    Ok(chart)
}

pub fn menu_demand_chart(top: &[PredictionPoint]) -> Chart {
    if top.is_empty() {
        return Chart::new("chart-menu-demand", "Menu demand", ChartKind::Bar).with_status(
            "📊 No demand prediction data yet. Run analytics to generate menu demand forecasts.",
        );
    }
    let (mut labels, mut values): (Vec<String>, Vec<f64>) = top
        .iter()
        .filter_map(|p| {
            p.item_name
                .as_ref()
                .filter(|n| !n.is_empty())
                .map(|n| (n.clone(), p.predicted_demand.unwrap_or(0.0)))
        })
        .unzip();
    if labels.is_empty() {
        labels.push("Loading predictions...".to_string());
        values.push(0.0);
    }
    Chart::single("chart-menu-demand", "Menu demand", ChartKind::Bar, "Predicted Demand", labels, values)
}

pub fn forecast_vs_actual_chart(points: &[PredictionPoint]) -> Chart {
    let mut chart = Chart::new("chart-forecast-actual", "Forecast vs actual", ChartKind::Line);
    if points.is_empty() {
        return chart.with_status(
            "📊 No forecast comparison data yet. Predictions will be compared with actual sales once data is available.",
        );
    }
    chart.labels = points.iter().map(|p| p.date.clone()).collect();
    chart.datasets = vec![
        Dataset {
            label: "Predicted".to_string(),
            data: points.iter().map(|p| Some(p.predicted_sales)).collect(),
        },
        Dataset {
            label: "Actual".to_string(),
            data: points
                .iter()
                .map(|p| p.actual_sales.filter(|a| *a != 0.0))
                .collect(),
        },
    ];
    match forecast_accuracy(points) {
        Some(acc) => chart.with_status(format!("🎯 Forecast Accuracy: {:.1}%", acc)),
        None => chart.with_status("⏳ Waiting for actual sales data to compare with predictions..."),
    }
}

/// The three dashboard forecast panels. A failing panel carries an error
/// status instead of data; the others still render.
pub fn predictive_charts(conn: &Connection) -> Vec<Chart> {
    let sales = latest_by_date(conn, HISTORY_POINTS)
        .and_then(|h| predicted_sales_chart(&h))
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "predicted sales chart failed");
            Chart::new("chart-predicted-sales", "Predicted sales", ChartKind::Line)
                .with_status("⚠️ Error loading forecast data")
        });

    let demand = match top_demand(conn, DEMAND_ITEMS) {
        Ok(top) => menu_demand_chart(&top),
        Err(err) => {
            tracing::warn!(error = %err, "menu demand chart failed");
            Chart::new("chart-menu-demand", "Menu demand", ChartKind::Bar)
                .with_status("⚠️ Error loading demand data")
        }
    };

    let comparison = match latest_by_date(conn, COMPARISON_POINTS) {
        Ok(pts) => forecast_vs_actual_chart(&pts),
        Err(err) => {
            tracing::warn!(error = %err, "forecast comparison chart failed");
            Chart::new("chart-forecast-actual", "Forecast vs actual", ChartKind::Line)
                .with_status("⚠️ Error loading comparison data")
        }
    };

    vec![sales, demand, comparison]
}

pub fn history_rows(points: &[PredictionPoint]) -> String {
    let rows = points
        .iter()
        .map(|p| {
            vec![
                p.date.clone(),
                format!("{:.2}", p.predicted_sales),
                p.actual_sales.map(|a| format!("{:.2}", a)).unwrap_or_default(),
                p.item_name.clone().unwrap_or_default(),
                p.predicted_demand.map(|d| format!("{:.0}", d)).unwrap_or_default(),
            ]
        })
        .collect();
    pretty_table(&["Date", "Predicted", "Actual", "Item", "Demand"], rows).to_string()
}
