// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::config::{Config, DEFAULT_CURRENCY_SYMBOL};

const UA: &str = concat!(
    "dinedash/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/dinedash)"
);

pub fn http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)").expect("static regex"));
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d.\-]").expect("static regex"));

/// Form-style number entry: the leading numeric prefix, or zero when there is none.
pub fn parse_amount_lenient(s: &str) -> Decimal {
    LEADING_NUMBER
        .find(s.trim())
        .and_then(|m| Decimal::from_str(m.as_str().trim_start_matches('+')).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Sanitize an uploaded amount cell: drop currency symbols, separators and
/// any other noise, then read the leading number. Unparseable cells are zero.
pub fn normalize_amount(raw: &str) -> Decimal {
    let cleaned = NON_NUMERIC.replace_all(raw, "");
    parse_amount_lenient(&cleaned)
}

static ISO_DAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"));
static US_SLASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("static regex"));
static US_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").expect("static regex"));

const FALLBACK_DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%Y-%m-%d %H:%M:%S",
];

/// Normalize an uploaded date cell to a calendar day.
///
/// `YYYY-MM-DD`, `MM/DD/YYYY` and `MM-DD-YYYY` are tried first, then RFC 3339
/// and a handful of common spreadsheet layouts.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if ISO_DAY.is_match(s) {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    }
    if US_SLASH.is_match(s) {
        return NaiveDate::parse_from_str(s, "%m/%d/%Y").ok();
    }
    if US_DASH.is_match(s) {
        return NaiveDate::parse_from_str(s, "%m-%d-%Y").ok();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    FALLBACK_DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(s, fmt)
            .ok()
            .or_else(|| chrono::NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date()))
    })
}

/// en-PH style: whole units, comma thousands separators, symbol prefix.
pub fn fmt_money(symbol: &str, d: &Decimal) -> String {
    let rounded = d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("{}-{}", symbol, grouped)
    } else {
        format!("{}{}", symbol, grouped)
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    write_json(&mut std::io::stdout().lock(), json_flag, jsonl_flag, v)
}

/// `--json` writes one pretty document; `--jsonl` writes one line per array
/// element, or a single line for anything else.
pub fn write_json<W: std::io::Write, T: serde::Serialize>(
    out: &mut W,
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        writeln!(out, "{}", serde_json::to_string_pretty(v)?)?;
        return Ok(true);
    }
    if jsonl_flag {
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                writeln!(out, "{}", serde_json::to_string(item)?)?;
            }
        } else {
            writeln!(out, "{}", serde_json::to_string(&val)?)?;
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn delete_setting(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM settings WHERE key=?1", params![key])?;
    Ok(())
}

/// Environment wins over the stored setting, which wins over the default.
pub fn currency_symbol(conn: &Connection, cfg: &Config) -> Result<String> {
    if let Some(sym) = &cfg.currency_symbol {
        return Ok(sym.clone());
    }
    Ok(get_setting(conn, "currency_symbol")?.unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string()))
}

/// Stored decimal text, read leniently: a corrupt cell counts as zero.
pub fn stored_decimal(s: &str) -> Decimal {
    s.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}
