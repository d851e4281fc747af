// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use dinedash::config::Config;
use dinedash::utils::{
    currency_symbol, fmt_money, normalize_amount, normalize_date, parse_amount_lenient,
    set_setting, write_json,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

#[test]
fn dates_normalize_from_common_layouts() {
    assert_eq!(normalize_date("2025-03-07"), day(2025, 3, 7));
    assert_eq!(normalize_date("03/07/2025"), day(2025, 3, 7));
    assert_eq!(normalize_date("03-07-2025"), day(2025, 3, 7));
    assert_eq!(normalize_date("2025-03-07T23:15:00+00:00"), day(2025, 3, 7));
    assert_eq!(normalize_date("Mar 07, 2025"), day(2025, 3, 7));
    assert_eq!(normalize_date("2025/03/07"), day(2025, 3, 7));
    assert_eq!(normalize_date("2025-03-07T23:15:00"), day(2025, 3, 7));
    assert_eq!(normalize_date("2025-03-07T23:15:00.250"), day(2025, 3, 7));
    assert_eq!(normalize_date("2025-03-07T23:15"), day(2025, 3, 7));
    assert_eq!(normalize_date(""), None);
    assert_eq!(normalize_date("yesterday"), None);
    assert_eq!(normalize_date("2025-13-40"), None);
}

#[test]
fn amounts_strip_noise() {
    assert_eq!(normalize_amount("₱1,234.50"), Decimal::new(123450, 2));
    assert_eq!(normalize_amount("-12"), Decimal::new(-12, 0));
    assert_eq!(normalize_amount("n/a"), Decimal::ZERO);
    assert_eq!(parse_amount_lenient("  42.5kg"), Decimal::new(425, 1));
    assert_eq!(parse_amount_lenient(".5"), Decimal::new(5, 1));
}

#[test]
fn money_is_whole_units_with_grouping() {
    assert_eq!(fmt_money("₱", &Decimal::new(1234567, 0)), "₱1,234,567");
    assert_eq!(fmt_money("₱", &Decimal::new(99950, 2)), "₱1,000");
    assert_eq!(fmt_money("₱", &Decimal::ZERO), "₱0");
    assert_eq!(fmt_money("$", &Decimal::new(-25049, 2)), "$-250");
}

#[test]
fn currency_symbol_precedence() {
    let conn = Connection::open_in_memory().unwrap();
    dinedash::db::init_schema(&conn).unwrap();
    let plain = Config::from_lookup(|_| None);
    assert_eq!(currency_symbol(&conn, &plain).unwrap(), "₱");

    set_setting(&conn, "currency_symbol", "€").unwrap();
    assert_eq!(currency_symbol(&conn, &plain).unwrap(), "€");

    let env = Config::from_lookup(|k| (k == "DINEDASH_CURRENCY").then(|| "$".to_string()));
    assert_eq!(currency_symbol(&conn, &env).unwrap(), "$");
}

#[test]
fn jsonl_writes_one_line_per_element() {
    let items = vec![serde_json::json!({"a": 1}), serde_json::json!({"a": 2})];
    let mut out = Vec::new();
    assert!(write_json(&mut out, false, true, &items).unwrap());
    assert_eq!(String::from_utf8(out).unwrap(), "{\"a\":1}\n{\"a\":2}\n");

    let mut out = Vec::new();
    assert!(write_json(&mut out, true, false, &items).unwrap());
    assert!(String::from_utf8(out).unwrap().lines().count() > 2);

    let mut out = Vec::new();
    assert!(!write_json(&mut out, false, false, &items).unwrap());
    assert!(out.is_empty());
}

#[test]
fn list_views_accept_jsonl() {
    use dinedash::commands::{dashboard, notifications};
    use dinedash::{cli, models::Role, session};

    let conn = Connection::open_in_memory().unwrap();
    dinedash::db::init_schema(&conn).unwrap();
    session::create_user(&conn, None, "admin@diner.test", "secret1", &Role::Admin).unwrap();
    session::sign_in(&conn, "admin@diner.test", "secret1").unwrap();
    let cfg = Config::from_lookup(|_| None);

    let matches = cli::build_cli().get_matches_from(["dinedash", "notifications", "--jsonl"]);
    let (_, m) = matches.subcommand().unwrap();
    assert!(m.get_flag("jsonl") && !m.get_flag("json"));
    notifications::handle(&conn, m).unwrap();

    let matches = cli::build_cli().get_matches_from(["dinedash", "dashboard", "--jsonl"]);
    let (_, m) = matches.subcommand().unwrap();
    dashboard::handle(&conn, &cfg, m).unwrap();
}
