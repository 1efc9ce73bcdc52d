use crate::core::table::parse_date;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder token for commodity or month values that are blank.
pub const UNKNOWN_TOKEN: &str = "UNKNOWN";

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

const MONTH_NAMES: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

/// Normalize a raw commodity name into its matching token.
///
/// Trims and uppercases. Blank values (and the usual spreadsheet
/// placeholders for a missing cell) become [`UNKNOWN_TOKEN`].
///
/// # Examples
///
/// ```
/// use hedge_engine::core::contract::normalize_commodity;
///
/// assert_eq!(normalize_commodity("  Brent Swap "), "BRENT SWAP");
/// assert_eq!(normalize_commodity("nan"), "UNKNOWN");
/// ```
pub fn normalize_commodity(raw: &str) -> String {
    let token = raw.trim().to_uppercase();
    if is_blank_token(&token) {
        UNKNOWN_TOKEN.to_string()
    } else {
        token
    }
}

fn is_blank_token(token: &str) -> bool {
    matches!(token, "" | "NAN" | "NONE" | "NULL" | "NAT")
}

/// A contract month in canonical `MMM YY` form (e.g. `JAN 24`).
///
/// Parsing never fails: text that cannot be read as a month is kept
/// (cleaned) as-is so it still compares equal to identical text on the
/// other ledger.
///
/// # Examples
///
/// ```
/// use hedge_engine::core::contract::ContractMonth;
///
/// assert_eq!(ContractMonth::parse("Jan-24").as_str(), "JAN 24");
/// assert_eq!(ContractMonth::parse("26 APR").as_str(), "APR 26");
/// assert_eq!(ContractMonth::parse("2024-03-15").as_str(), "MAR 24");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractMonth(String);

impl ContractMonth {
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase().replace(['-', '/', '.', ','], " ");
        let cleaned = upper.split_whitespace().collect::<Vec<_>>().join(" ");

        if is_blank_token(&cleaned) {
            return Self(UNKNOWN_TOKEN.to_string());
        }
        // Spreadsheet month cells often arrive as full timestamps.
        if let Some(date) = parse_date(raw) {
            return Self::from_year_month(date.year(), date.month());
        }

        match year_month(&cleaned) {
            Some((year, month)) => Self::from_year_month(year, month),
            None => Self(cleaned),
        }
    }

    /// Build the canonical token for a calendar month (1-based).
    pub fn from_year_month(year: i32, month: u32) -> Self {
        let idx = (month.clamp(1, 12) - 1) as usize;
        Self(format!(
            "{} {:02}",
            MONTH_ABBREVIATIONS[idx],
            year.rem_euclid(100)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token is in canonical `MMM YY` form.
    pub fn is_canonical(&self) -> bool {
        let mut parts = self.0.split(' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(mon), Some(yy), None) => {
                MONTH_ABBREVIATIONS.contains(&mon)
                    && yy.len() == 2
                    && yy.chars().all(|c| c.is_ascii_digit())
            }
            _ => false,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_TOKEN
    }
}

impl fmt::Display for ContractMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContractMonth {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Netting partition key: normalized commodity joined with contract month.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(commodity: &str, month: &ContractMonth) -> Self {
        Self(format!("{}_{}", commodity, month))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn year_month(cleaned: &str) -> Option<(i32, u32)> {
    let tokens: Vec<&str> = cleaned.split(' ').collect();
    match tokens.as_slice() {
        [single] => compact_year_month(single),
        [a, b] => {
            if let (Some(month), Some(year)) = (month_from_name(a), year_from_token(b)) {
                return Some((year, month));
            }
            // Year written first, e.g. "26 APR"
            if let (Some(year), Some(month)) = (year_from_token(a), month_from_name(b)) {
                return Some((year, month));
            }
            if let (Some(month), true) = (month_from_number(a), b.len() == 4) {
                return Some((year_from_token(b)?, month));
            }
            if let (true, Some(month)) = (a.len() == 4, month_from_number(b)) {
                return Some((year_from_token(a)?, month));
            }
            None
        }
        [a, b, c] => {
            let date = if a.len() == 4 {
                let month = month_from_name(b).or_else(|| month_from_number(b))?;
                NaiveDate::from_ymd_opt(a.parse().ok()?, month, c.parse().ok()?)
            } else {
                let month = month_from_name(b).or_else(|| month_from_number(b))?;
                NaiveDate::from_ymd_opt(year_from_token(c)?, month, a.parse().ok()?)
            }?;
            Some((date.year(), date.month()))
        }
        _ => None,
    }
}

/// Forms without separators: `JAN24`, `JAN2024`, `202401`, `20240115`.
fn compact_year_month(token: &str) -> Option<(i32, u32)> {
    if token.chars().all(|c| c.is_ascii_digit()) {
        return match token.len() {
            6 => Some((token[..4].parse().ok()?, month_from_number(&token[4..])?)),
            8 => {
                let date = NaiveDate::parse_from_str(token, "%Y%m%d").ok()?;
                Some((date.year(), date.month()))
            }
            _ => None,
        };
    }

    let split = token.find(|c: char| c.is_ascii_digit())?;
    let (name, digits) = token.split_at(split);
    Some((year_from_token(digits)?, month_from_name(name)?))
}

fn month_from_name(token: &str) -> Option<u32> {
    if token.len() < 3 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|name| name.starts_with(token))
        .map(|idx| idx as u32 + 1)
}

fn month_from_number(token: &str) -> Option<u32> {
    if token.is_empty() || token.len() > 2 {
        return None;
    }
    token.parse().ok().filter(|m| (1..=12).contains(m))
}

fn year_from_token(token: &str) -> Option<i32> {
    if !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match token.len() {
        2 => token.parse::<i32>().ok().map(|yy| 2000 + yy),
        4 => token.parse().ok(),
        _ => None,
    }
}
