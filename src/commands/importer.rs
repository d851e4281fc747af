// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::fmt;
use std::path::Path;

use crate::db::{new_id, now_stamp};
use crate::error::DashError;
use crate::session;
use crate::utils::{normalize_amount, normalize_date, pretty_table};

const PREVIEW_ROWS: usize = 5;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let user = session::require_user(conn)?;
    session::require_data_entry(&user)?;
    match m.subcommand() {
        Some(("preview", sub)) => preview(sub),
        Some(("save", sub)) => save(conn, sub),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Date,
    Number,
    Text,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Date => "date",
            FieldKind::Number => "number",
            FieldKind::Text => "string",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Column in the destination table.
    pub column: &'static str,
}

const SALES_FIELDS: [FieldSpec; 4] = [
    FieldSpec { key: "date", label: "Date", kind: FieldKind::Date, column: "date" },
    FieldSpec { key: "amount", label: "Amount", kind: FieldKind::Number, column: "amount" },
    FieldSpec { key: "itemName", label: "Item Name", kind: FieldKind::Text, column: "item_name" },
    FieldSpec {
        key: "orderNumber",
        label: "Order Number",
        kind: FieldKind::Text,
        column: "order_number",
    },
];

const MARKET_FIELDS: [FieldSpec; 3] = [
    FieldSpec { key: "date", label: "Date", kind: FieldKind::Date, column: "date" },
    FieldSpec { key: "amount", label: "Amount", kind: FieldKind::Number, column: "amount" },
    FieldSpec {
        key: "ingredientName",
        label: "Ingredient Name",
        kind: FieldKind::Text,
        column: "ingredient_name",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSchema {
    Sales,
    Market,
}

impl DataSchema {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "sales" => Ok(DataSchema::Sales),
            "market" => Ok(DataSchema::Market),
            other => Err(DashError::UnknownSchema(other.to_string()).into()),
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            DataSchema::Sales => &SALES_FIELDS,
            DataSchema::Market => &MARKET_FIELDS,
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            DataSchema::Sales => "sales_data",
            DataSchema::Market => "market_historical_data",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFile {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedFile {
    /// Cell for a header name; when headers repeat, the last one wins.
    pub fn cell<'a>(&'a self, row: &'a [String], column: &str) -> &'a str {
        self.headers
            .iter()
            .rposition(|h| h == column)
            .and_then(|i| row.get(i))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

fn strip_quotes(s: &str) -> String {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s).to_string()
}

/// Line-oriented parse: every non-blank line is one record, cells split on
/// `,`, trimmed, with one surrounding quote stripped from each side. Quotes
/// never join lines or protect commas, so a stray quote only affects its own
/// cell. The first line is the header row; rows are cut or padded with ""
/// to the header width.
pub fn parse_csv_text(text: &str) -> Result<ParsedFile> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut parsed = ParsedFile::default();
    for result in rdr.records() {
        let rec = result.context("Malformed CSV row")?;
        // whitespace-only line
        if rec.len() == 1 && rec[0].is_empty() {
            continue;
        }
        let cells: Vec<String> = rec.iter().map(strip_quotes).collect();
        if parsed.headers.is_empty() {
            parsed.headers = cells;
            continue;
        }
        let mut row = cells;
        row.resize(parsed.headers.len(), String::new());
        parsed.rows.push(row);
    }
    Ok(parsed)
}

/// Read an uploaded file. Anything that is not `.csv` is treated as an
/// Excel export and decoded as text.
pub fn read_upload(path: &Path) -> Result<ParsedFile> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Open CSV {}", path.display()))?;
        return parse_csv_text(&text);
    }
    let bytes = std::fs::read(path).with_context(|| format!("Open {}", path.display()))?;
    tracing::warn!(path = %path.display(), "non-CSV upload parsed as delimited text");
    match parse_csv_text(&String::from_utf8_lossy(&bytes)) {
        Ok(p) => Ok(p),
        Err(err) => {
            eprintln!("Error parsing Excel file. Please convert to CSV format.");
            tracing::warn!(error = %err, "excel parse failed");
            Ok(ParsedFile::default())
        }
    }
}

/// Suggested column for each field: a header matches when its lowercase form
/// contains the field key or label. With several matches the last one wins.
pub fn suggest_mapping(schema: DataSchema, headers: &[String]) -> Vec<(FieldSpec, Option<String>)> {
    schema
        .fields()
        .iter()
        .map(|f| {
            let key = f.key.to_lowercase();
            let label = f.label.to_lowercase();
            let hit = headers
                .iter()
                .rfind(|h| {
                    let h = h.to_lowercase();
                    h.contains(&key) || h.contains(&label)
                })
                .cloned();
            (*f, hit)
        })
        .collect()
}

/// Merge `field=Column` overrides over the suggestions and insist every
/// field ends up mapped to an existing header.
pub fn resolve_mapping(
    schema: DataSchema,
    headers: &[String],
    overrides: &[String],
) -> Result<Vec<(FieldSpec, String)>> {
    let mut mapping = suggest_mapping(schema, headers);
    for raw in overrides {
        let (field, column) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid mapping '{}', expected field=Column", raw))?;
        let (field, column) = (field.trim(), column.trim());
        let slot = mapping
            .iter_mut()
            .find(|(f, _)| f.key.eq_ignore_ascii_case(field) || f.label.eq_ignore_ascii_case(field))
            .ok_or_else(|| anyhow!("Unknown field '{}' for this data type", field))?;
        if column.is_empty() {
            slot.1 = None;
            continue;
        }
        if !headers.iter().any(|h| h == column) {
            return Err(anyhow!("Column '{}' not found in file", column));
        }
        slot.1 = Some(column.to_string());
    }

    let missing: Vec<String> = mapping
        .iter()
        .filter(|(_, c)| c.is_none())
        .map(|(f, _)| f.label.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DashError::MissingMappings(missing).into());
    }
    Ok(mapping
        .into_iter()
        .filter_map(|(f, c)| c.map(|c| (f, c)))
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Date(Option<NaiveDate>),
    Number(Decimal),
    Text(String),
}

impl CellValue {
    pub fn normalize(kind: FieldKind, raw: &str) -> CellValue {
        match kind {
            FieldKind::Date => CellValue::Date(normalize_date(raw)),
            FieldKind::Number => CellValue::Number(normalize_amount(raw)),
            FieldKind::Text => CellValue::Text(raw.to_string()),
        }
    }

    fn to_sql(&self) -> Option<String> {
        match self {
            CellValue::Date(d) => d.map(|d| d.to_string()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

pub fn map_row(
    parsed: &ParsedFile,
    row: &[String],
    mapping: &[(FieldSpec, String)],
) -> Vec<(FieldSpec, CellValue)> {
    mapping
        .iter()
        .map(|(f, col)| (*f, CellValue::normalize(f.kind, parsed.cell(row, col))))
        .collect()
}

/// Write every row as one batch. Nothing is stored if any insert fails.
pub fn save_batch(
    conn: &mut Connection,
    schema: DataSchema,
    parsed: &ParsedFile,
    mapping: &[(FieldSpec, String)],
) -> Result<usize> {
    let columns: Vec<&str> = mapping.iter().map(|(f, _)| f.column).collect();
    let placeholders: Vec<String> = (0..columns.len()).map(|i| format!("?{}", i + 3)).collect();
    let sql = format!(
        "INSERT INTO {}(id, created_at, {}) VALUES (?1, ?2, {})",
        schema.collection(),
        columns.join(", "),
        placeholders.join(", ")
    );

    let tx = conn.transaction()?;
    let mut saved = 0usize;
    {
        let mut stmt = tx.prepare(&sql)?;
        let created_at = now_stamp();
        for row in &parsed.rows {
            let values = map_row(parsed, row, mapping);
            let mut bind: Vec<Option<String>> = vec![Some(new_id()), Some(created_at.clone())];
            bind.extend(values.iter().map(|(_, v)| v.to_sql()));
            stmt.execute(rusqlite::params_from_iter(bind.iter()))?;
            saved += 1;
        }
    }
    tx.commit()?;
    tracing::info!(collection = schema.collection(), saved, "import batch committed");
    Ok(saved)
}

fn preview(sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("file").unwrap().trim();
    let schema = DataSchema::parse(sub.get_one::<String>("schema").unwrap())?;
    let parsed = read_upload(Path::new(path))?;
    if parsed.headers.is_empty() {
        println!("No rows found in {}", path);
        return Ok(());
    }

    let headers: Vec<&str> = parsed.headers.iter().map(|h| h.as_str()).collect();
    let rows: Vec<Vec<String>> = parsed.rows.iter().take(PREVIEW_ROWS).cloned().collect();
    println!("{}", pretty_table(&headers, rows));
    println!("{} data rows", parsed.rows.len());

    let suggestions = suggest_mapping(schema, &parsed.headers)
        .into_iter()
        .map(|(f, c)| {
            vec![
                format!("{} ({})", f.label, f.kind),
                f.key.to_string(),
                c.unwrap_or_else(|| "-- Select column --".to_string()),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Field", "Key", "Column"], suggestions));
    Ok(())
}

fn save(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("file").unwrap().trim();
    let schema = DataSchema::parse(sub.get_one::<String>("schema").unwrap())?;
    let overrides: Vec<String> = sub
        .get_many::<String>("map")
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();

    let parsed = read_upload(Path::new(path))?;
    if parsed.rows.is_empty() {
        println!("Nothing to import from {}", path);
        return Ok(());
    }
    let mapping = resolve_mapping(schema, &parsed.headers, &overrides)?;
    let saved =
        save_batch(conn, schema, &parsed, &mapping).context("Failed to save data")?;
    println!(
        "Successfully saved {} records to {}",
        saved,
        schema.collection()
    );
    Ok(())
}
