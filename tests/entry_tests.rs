// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use dinedash::error::{DashError, FailureKind, classify};
use dinedash::models::Role;
use dinedash::{cli, commands::expenses, commands::products, commands::sales, db, session};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn conn_as(role: Role) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let admin =
        session::create_user(&conn, None, "admin@diner.test", "secret1", &Role::Admin).unwrap();
    if role.is_admin() {
        session::sign_in(&conn, "admin@diner.test", "secret1").unwrap();
    } else {
        session::create_user(&conn, Some(&admin), "staff@diner.test", "secret2", &role).unwrap();
        session::sign_in(&conn, "staff@diner.test", "secret2").unwrap();
    }
    conn
}

fn run_sale(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["dinedash", "sale"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("sale", m)) => sales::handle(conn, m),
        _ => panic!("no sale subcommand"),
    }
}

#[test]
fn sale_with_net_above_gross_is_rejected() {
    let conn = conn_as(Role::Manager);
    let err = run_sale(
        &conn,
        &["add", "--date", "2025-03-01", "--gross", "100", "--net", "120"],
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DashError>(),
        Some(DashError::NetExceedsGross { .. })
    ));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn sale_amounts_parse_leniently_and_blank_notes_are_dropped() {
    let conn = conn_as(Role::Manager);
    run_sale(
        &conn,
        &["add", "--date", "2025-03-01", "--gross", "1500.50abc", "--net", "x", "--notes", "   "],
    )
    .unwrap();
    let txs = sales::query_range(&conn, None, None).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].gross, Decimal::new(150050, 2));
    assert_eq!(txs[0].net, Decimal::ZERO);
    assert!(txs[0].notes.is_none());
}

#[test]
fn owner_cannot_enter_data() {
    let conn = conn_as(Role::Owner);
    let err = run_sale(
        &conn,
        &["add", "--date", "2025-03-01", "--gross", "10", "--net", "5"],
    )
    .unwrap_err();
    assert_eq!(classify(&err), FailureKind::PermissionDenied);
    assert!(err.to_string().contains("Manager or Admin"));
}

#[test]
fn sales_are_listed_newest_first_within_range() {
    let conn = conn_as(Role::Admin);
    for (d, g) in [("2025-03-01", "100"), ("2025-03-05", "200"), ("2025-02-20", "50")] {
        run_sale(&conn, &["add", "--date", d, "--gross", g, "--net", g]).unwrap();
    }
    let start = NaiveDate::from_ymd_opt(2025, 3, 1);
    let txs = sales::query_range(&conn, start, None).unwrap();
    let dates: Vec<String> = txs.iter().map(|t| t.date.to_string()).collect();
    assert_eq!(dates, vec!["2025-03-05", "2025-03-01"]);
}

#[test]
fn product_category_defaults() {
    let conn = conn_as(Role::Manager);
    products::add_product(&conn, "Gravy", Some("  "), Decimal::new(25, 0)).unwrap();
    products::add_product(&conn, "Cola", Some("Drinks"), Decimal::new(45, 0)).unwrap();
    conn.execute(
        "INSERT INTO products(id, name, category, price, created_at) VALUES ('p3','Rice',NULL,'35','')",
        [],
    )
    .unwrap();
    let all = products::query_all(&conn).unwrap();
    let cats: Vec<(&str, &str)> = all
        .iter()
        .map(|p| (p.name.as_str(), p.category.as_str()))
        .collect();
    assert_eq!(
        cats,
        vec![("Cola", "Drinks"), ("Gravy", "General"), ("Rice", "Other")]
    );
}

#[test]
fn expenses_are_recorded_and_ranged() {
    let conn = conn_as(Role::Manager);
    let user = session::require_user(&conn).unwrap();
    let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
    expenses::record_expense(&conn, &user, d("2025-03-02"), Decimal::new(3500, 0), "Chicken")
        .unwrap();
    expenses::record_expense(&conn, &user, d("2025-01-02"), Decimal::new(100, 0), "").unwrap();
    let march = expenses::query_range(&conn, Some(d("2025-03-01")), Some(d("2025-03-31"))).unwrap();
    assert_eq!(march.len(), 1);
    assert_eq!(march[0].description, "Chicken");
    assert_eq!(march[0].amount, Decimal::new(3500, 0));
}
