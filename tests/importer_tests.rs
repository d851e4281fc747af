// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use dinedash::error::DashError;
use dinedash::models::Role;
use dinedash::{cli, commands::importer, db, session};
use rusqlite::Connection;
use std::io::Write;
use tempfile::NamedTempFile;

use importer::{DataSchema, parse_csv_text, resolve_mapping, suggest_mapping};

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    session::create_user(&conn, None, "admin@diner.test", "secret1", &Role::Admin).unwrap();
    session::sign_in(&conn, "admin@diner.test", "secret1").unwrap();
    conn
}

fn csv_file(body: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "{}", body).unwrap();
    file.flush().unwrap();
    file
}

fn run_import(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["dinedash", "import"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("import", m)) => importer::handle(conn, m),
        _ => panic!("no import subcommand"),
    }
}

#[test]
fn csv_parsing_skips_blank_lines_and_pads_short_rows() {
    let parsed = parse_csv_text("Date,Amount,Item\n\n2025-03-01,100\n\"2025-03-02\",\"50\",\"Rice\"\n").unwrap();
    assert_eq!(parsed.headers, vec!["Date", "Amount", "Item"]);
    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.rows[0], vec!["2025-03-01", "100", ""]);
    assert_eq!(parsed.rows[1][2], "Rice");
}

#[test]
fn stray_quote_stays_inside_its_own_row() {
    let parsed = parse_csv_text(
        "Date,Item,Amount\n2025-01-01,\"12 inch pizza,100\n2025-01-02,Cola,45\n2025-01-03,Tea,20\n",
    )
    .unwrap();
    assert_eq!(parsed.rows.len(), 3);
    assert_eq!(parsed.rows[0], vec!["2025-01-01", "12 inch pizza", "100"]);
    assert_eq!(parsed.rows[2], vec!["2025-01-03", "Tea", "20"]);
}

#[test]
fn quotes_do_not_protect_commas() {
    let parsed = parse_csv_text("Item,Amount,Extra\n\"Rice, large\",35\n").unwrap();
    assert_eq!(parsed.rows, vec![vec!["Rice", "large", "35"]]);

    // extra cells beyond the header row are dropped
    let parsed = parse_csv_text("Item,Amount\nTea,20,x,y\n").unwrap();
    assert_eq!(parsed.rows, vec![vec!["Tea", "20"]]);
}

#[test]
fn comma_only_rows_are_kept_as_empty_records() {
    let parsed = parse_csv_text("Date,Amount,Item Name,Order Number\n,,,\n   \n").unwrap();
    assert_eq!(parsed.rows, vec![vec!["", "", "", ""]]);
}

#[test]
fn comma_only_row_saves_with_null_date_and_zero_amount() {
    let mut conn = base_conn();
    let file = csv_file("Date,Amount,Item Name,Order Number\n,,,\n2025-03-01,10,Rice,A1\n");
    let path = file.path().to_str().unwrap().to_string();
    run_import(&mut conn, &["save", "--file", &path, "--schema", "sales"]).unwrap();

    let rows: Vec<(Option<String>, String, String)> = conn
        .prepare("SELECT date, amount, item_name FROM sales_data ORDER BY date")
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], (None, "0".to_string(), "".to_string()));
    assert_eq!(rows[1].0.as_deref(), Some("2025-03-01"));
}

#[test]
fn suggestions_match_headers_by_key_or_label() {
    let headers: Vec<String> = ["Order Date", "Total Amount", "Item Name", "orderNumber"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mapping = suggest_mapping(DataSchema::Sales, &headers);
    let picked: Vec<Option<&str>> = mapping.iter().map(|(_, c)| c.as_deref()).collect();
    assert_eq!(
        picked,
        vec![
            Some("Order Date"),
            Some("Total Amount"),
            Some("Item Name"),
            Some("orderNumber")
        ]
    );
}

#[test]
fn unmapped_fields_are_reported_by_label() {
    let headers: Vec<String> = ["Date", "Cost"].iter().map(|s| s.to_string()).collect();
    let err = resolve_mapping(DataSchema::Market, &headers, &[]).unwrap_err();
    match err.downcast_ref::<DashError>() {
        Some(DashError::MissingMappings(labels)) => {
            assert_eq!(labels, &vec!["Amount".to_string(), "Ingredient Name".to_string()]);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.to_string().starts_with("Please map all required fields"));

    let overrides = vec!["amount=Cost".to_string(), "ingredientName=Cost".to_string()];
    let mapping = resolve_mapping(DataSchema::Market, &headers, &overrides).unwrap();
    assert_eq!(mapping.len(), 3);

    let bad = vec!["amount=Nope".to_string()];
    assert!(resolve_mapping(DataSchema::Market, &headers, &bad).is_err());
}

#[test]
fn save_normalizes_cells_and_writes_every_row() {
    let mut conn = base_conn();
    let mut body = String::from("Date,Amount,Item Name,Order Number\n");
    for i in 1..=12 {
        body.push_str(&format!("03/{:02}/2025,\"₱12{:02}.00\",Chicken,ORD-{}\n", i, i, i));
    }
    body.push_str("not a date,abc,Rice,ORD-99\n");
    let file = csv_file(&body);
    let path = format!("  {}  ", file.path().to_str().unwrap());

    run_import(&mut conn, &["save", "--file", &path, "--schema", "sales"]).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM sales_data", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 13);
    let (date, amount): (Option<String>, String) = conn
        .query_row(
            "SELECT date, amount FROM sales_data WHERE order_number='ORD-3'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(date.as_deref(), Some("2025-03-03"));
    assert_eq!(amount, "1203.00");
    let (date, amount): (Option<String>, String) = conn
        .query_row(
            "SELECT date, amount FROM sales_data WHERE order_number='ORD-99'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(date, None);
    assert_eq!(amount, "0");
}

#[test]
fn market_import_honours_manual_mapping() {
    let mut conn = base_conn();
    let file = csv_file("Day,Price,Ingredient\n2025-03-01,120.5,Chicken\n2025-03-02,80,Oil\n");
    let path = file.path().to_str().unwrap().to_string();
    run_import(
        &mut conn,
        &[
            "save", "--file", &path, "--schema", "market", "--map", "date=Day", "--map",
            "amount=Price", "--map", "ingredientName=Ingredient",
        ],
    )
    .unwrap();
    let names: Vec<String> = conn
        .prepare("SELECT ingredient_name FROM market_historical_data ORDER BY date")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(names, vec!["Chicken", "Oil"]);
}

#[test]
fn incomplete_mapping_saves_nothing() {
    let mut conn = base_conn();
    let file = csv_file("Date,Amount\n2025-03-01,10\n");
    let path = file.path().to_str().unwrap().to_string();
    let err = run_import(&mut conn, &["save", "--file", &path, "--schema", "sales"]).unwrap_err();
    assert!(err.to_string().contains("Item Name"));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM sales_data", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn owners_cannot_upload() {
    let mut conn = base_conn();
    let admin = session::current_user(&conn).unwrap().unwrap();
    session::create_user(&conn, Some(&admin), "own@diner.test", "secret2", &Role::Owner).unwrap();
    session::sign_in(&conn, "own@diner.test", "secret2").unwrap();
    let file = csv_file("Date,Amount,Item Name,Order Number\n2025-03-01,10,Rice,1\n");
    let path = file.path().to_str().unwrap().to_string();
    assert!(run_import(&mut conn, &["save", "--file", &path, "--schema", "sales"]).is_err());
}
