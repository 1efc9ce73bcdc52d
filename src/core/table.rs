//! Record-table boundary between the ingestion layer and the engines.
//!
//! Tables arrive as JSON arrays of row objects keyed by column name.
//! A missing required column is a structural error and fails the load;
//! a bad cell is coerced to a safe default and the row is kept.

use crate::core::cargo::{Cargo, Direction};
use crate::core::trade::PaperTrade;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

pub const PAPER_TABLE: &str = "paper";
pub const PHYSICAL_TABLE: &str = "physical";

pub mod paper_columns {
    pub const TRADE_DATE: &str = "Trade Date";
    pub const COMMODITY: &str = "Commodity";
    pub const MONTH: &str = "Month";
    pub const VOLUME: &str = "Volume";
    pub const PRICE: &str = "Price";
    pub const MTM_PRICE: &str = "Mtm Price";
    pub const TOTAL_PL: &str = "Total P/L";
    pub const TICKET: &str = "Recap No";
}

pub mod physical_columns {
    pub const CARGO_ID: &str = "Cargo_ID";
    pub const VOLUME: &str = "Volume";
    pub const HEDGE_PROXY: &str = "Hedge_Proxy";
    pub const TARGET_MONTH: &str = "Target_Contract_Month";
    pub const TARGET_MONTH_ALIASES: [&str; 2] = ["Target_Pricing_Month", "Month"];
    pub const DIRECTION: &str = "Direction";
    pub const DESIGNATION_DATE: &str = "Designation_Date";
    pub const PRICING_START: &str = "Pricing_Start";
    pub const BENCHMARK: &str = "Pricing_Benchmark";
}

/// Structural problems that make a table unusable.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("{table} table is not a list of row objects: {reason}")]
    NotATable { table: &'static str, reason: String },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

type Row = Map<String, Value>;

/// Parse a paper table from a JSON array of records.
pub fn paper_from_json(input: &str) -> Result<Vec<PaperTrade>, TableError> {
    let rows = rows_from_json(input, PAPER_TABLE)?;
    paper_from_rows(&rows)
}

/// Parse a physical table from a JSON array of records.
pub fn physical_from_json(input: &str) -> Result<Vec<Cargo>, TableError> {
    let rows = rows_from_json(input, PHYSICAL_TABLE)?;
    physical_from_rows(&rows)
}

fn rows_from_json(input: &str, table: &'static str) -> Result<Vec<Row>, TableError> {
    let value: Value = serde_json::from_str(input)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(TableError::NotATable {
                table,
                reason: format!("expected an array, found {}", json_kind(&other)),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(TableError::NotATable {
                table,
                reason: format!("row {} is {}", i, json_kind(&other)),
            }),
        })
        .collect()
}

/// Build paper trades from row records.
pub fn paper_from_rows(rows: &[Row]) -> Result<Vec<PaperTrade>, TableError> {
    use paper_columns::*;

    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let columns = column_names(rows);
    for column in [TRADE_DATE, COMMODITY, MONTH, VOLUME, PRICE] {
        require(&columns, PAPER_TABLE, column)?;
    }

    let trades = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let ticket = row
                .get(TICKET)
                .map(cell_text)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| i.to_string());
            PaperTrade::new(
                ticket,
                cell_date(row, TRADE_DATE),
                &cell_string(row, COMMODITY),
                &cell_string(row, MONTH),
                cell_decimal(row, VOLUME),
                cell_decimal(row, PRICE),
            )
            .with_mtm_price(cell_decimal(row, MTM_PRICE))
            .with_total_pl(cell_decimal(row, TOTAL_PL))
        })
        .collect();
    Ok(trades)
}

/// Build cargoes from row records.
pub fn physical_from_rows(rows: &[Row]) -> Result<Vec<Cargo>, TableError> {
    use physical_columns::*;

    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let columns = column_names(rows);
    for column in [CARGO_ID, VOLUME, HEDGE_PROXY] {
        require(&columns, PHYSICAL_TABLE, column)?;
    }
    let month_column = std::iter::once(TARGET_MONTH)
        .chain(TARGET_MONTH_ALIASES)
        .find(|c| columns.contains(c))
        .ok_or(TableError::MissingColumn {
            table: PHYSICAL_TABLE,
            column: TARGET_MONTH,
        })?;
    let designation_column = [DESIGNATION_DATE, PRICING_START]
        .into_iter()
        .find(|c| columns.contains(c));

    let cargoes = rows
        .iter()
        .map(|row| {
            let mut cargo = Cargo::new(
                cell_string(row, CARGO_ID),
                cell_decimal(row, VOLUME),
                &cell_string(row, HEDGE_PROXY),
                &cell_string(row, month_column),
            )
            .with_direction(Direction::parse(&cell_string(row, DIRECTION)))
            .with_designation_date(designation_column.and_then(|c| cell_date(row, c)));
            if let Some(benchmark) = row.get(BENCHMARK) {
                cargo = cargo.with_benchmark(cell_text(benchmark));
            }
            cargo
        })
        .collect();
    Ok(cargoes)
}

/// Write a trade back out in the paper table layout.
pub fn paper_record(trade: &PaperTrade) -> Value {
    use paper_columns::*;

    json!({
        TRADE_DATE: trade.trade_date().map(|d| d.to_string()),
        COMMODITY: trade.raw_commodity(),
        MONTH: trade.month().as_str(),
        VOLUME: trade.volume().to_string(),
        PRICE: trade.price().to_string(),
        MTM_PRICE: trade.mtm_price().to_string(),
        TOTAL_PL: trade.total_pl().to_string(),
        TICKET: trade.ticket(),
    })
}

/// Write a cargo back out in the physical table layout.
pub fn cargo_record(cargo: &Cargo) -> Value {
    use physical_columns::*;

    json!({
        CARGO_ID: cargo.id().as_str(),
        VOLUME: cargo.volume().to_string(),
        HEDGE_PROXY: cargo.hedge_proxy(),
        TARGET_MONTH: cargo.target_month().as_str(),
        DIRECTION: cargo.direction().to_string(),
        DESIGNATION_DATE: cargo.designation_date().map(|d| d.to_string()),
        BENCHMARK: cargo.benchmark(),
    })
}

fn column_names(rows: &[Row]) -> HashSet<&str> {
    rows.iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect()
}

fn require(columns: &HashSet<&str>, table: &'static str, column: &'static str) -> Result<(), TableError> {
    if columns.contains(column) {
        Ok(())
    } else {
        Err(TableError::MissingColumn { table, column })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn cell_string(row: &Row, column: &str) -> String {
    row.get(column).map(cell_text).unwrap_or_default()
}

fn cell_decimal(row: &Row, column: &str) -> Decimal {
    match row.get(column) {
        None | Some(Value::Null) => Decimal::ZERO,
        Some(value) => parse_decimal(&cell_text(value)).unwrap_or_else(|| {
            log::debug!("coercing non-numeric {} value {} to 0", column, value);
            Decimal::ZERO
        }),
    }
}

fn cell_date(row: &Row, column: &str) -> Option<NaiveDate> {
    let text = row.get(column).map(cell_text)?;
    if text.is_empty() {
        return None;
    }
    let date = parse_date(&text);
    if date.is_none() {
        log::debug!("unparseable {} value '{}' treated as missing", column, text);
    }
    date
}

/// Read a number written as plain, scientific, or thousands-separated text.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d-%b-%Y", "%d %b %Y", "%Y%m%d",
];

const DATETIME_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// Read a calendar date; times and offsets are dropped.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        })
}
