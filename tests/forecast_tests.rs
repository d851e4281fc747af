// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use dinedash::commands::forecast;
use dinedash::db;
use dinedash::models::PredictionPoint;
use rusqlite::Connection;

fn point(date: &str, predicted: f64, actual: Option<f64>) -> PredictionPoint {
    PredictionPoint {
        date: date.into(),
        predicted_sales: predicted,
        actual_sales: actual,
        item_name: None,
        predicted_demand: None,
    }
}

fn conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

#[test]
fn extrapolation_continues_last_step() {
    assert_eq!(forecast::extrapolate(&[100.0, 120.0, 150.0], 3), vec![180.0; 3]);
    assert_eq!(forecast::extrapolate(&[90.0], 2), vec![90.0; 2]);
    assert_eq!(forecast::extrapolate(&[], 1), vec![0.0]);
}

#[test]
fn accuracy_ignores_missing_and_zero_actuals() {
    let pts = vec![
        point("2025-03-01", 110.0, Some(100.0)),
        point("2025-03-02", 80.0, Some(100.0)),
        point("2025-03-03", 50.0, None),
        point("2025-03-04", 50.0, Some(0.0)),
    ];
    let acc = forecast::forecast_accuracy(&pts).unwrap();
    assert!((acc - 85.0).abs() < 1e-9);
    assert!(forecast::forecast_accuracy(&pts[2..]).is_none());

    let chart = forecast::forecast_vs_actual_chart(&pts);
    assert_eq!(chart.status.as_deref(), Some("🎯 Forecast Accuracy: 85.0%"));
    assert_eq!(chart.datasets[1].data[3], None);
}

#[test]
fn predicted_sales_chart_appends_seven_future_days() {
    let hist = vec![point("2025-03-01", 100.0, None), point("2025-03-02", 130.0, None)];
    let chart = forecast::predicted_sales_chart(&hist).unwrap();
    assert_eq!(chart.labels.len(), 9);
    assert_eq!(chart.labels[2], "2025-03-03");
    assert_eq!(chart.labels[8], "2025-03-09");
    assert_eq!(chart.datasets[0].label, "Historical");
    assert_eq!(chart.datasets[0].data[1], Some(130.0));
    assert_eq!(chart.datasets[0].data[2], None);
    assert_eq!(chart.datasets[1].data[1], None);
    assert_eq!(chart.datasets[1].data[2], Some(160.0));
}

#[test]
fn empty_history_shows_status_on_every_panel() {
    let conn = conn();
    let charts = forecast::predictive_charts(&conn);
    assert_eq!(charts.len(), 3);
    assert!(charts[0].status.as_deref().unwrap().starts_with("📊 No prediction data yet"));
    assert!(charts.iter().all(|c| c.labels.is_empty()));
}

#[test]
fn stored_points_drive_the_panels() {
    let conn = conn();
    for i in 1..=9 {
        let mut p = point(&format!("2025-03-{:02}", i), 100.0 + i as f64, None);
        if i == 9 {
            p.actual_sales = Some(100.0);
        }
        forecast::record_point(&conn, &p).unwrap();
    }
    forecast::record_point(
        &conn,
        &PredictionPoint {
            item_name: Some("Chicken Bucket".into()),
            predicted_demand: Some(40.0),
            ..point("2025-03-05", 0.0, None)
        },
    )
    .unwrap();
    forecast::record_point(
        &conn,
        &PredictionPoint {
            predicted_demand: Some(90.0),
            ..point("2025-03-05", 0.0, None)
        },
    )
    .unwrap();

    let latest = forecast::latest_by_date(&conn, forecast::HISTORY_POINTS).unwrap();
    assert_eq!(latest.len(), 7);
    assert_eq!(latest.last().unwrap().date, "2025-03-09");

    let top = forecast::top_demand(&conn, forecast::DEMAND_ITEMS).unwrap();
    assert_eq!(top.len(), 2);
    let demand = forecast::menu_demand_chart(&top);
    assert_eq!(demand.labels, vec!["Chicken Bucket"]);
    assert_eq!(demand.values(), vec![40.0]);

    let unnamed = forecast::menu_demand_chart(&top[..1]);
    assert_eq!(unnamed.labels, vec!["Loading predictions..."]);
}
