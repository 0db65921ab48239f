// src/transactions.rs
use crate::models::{RawTransaction, TransactionType};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

pub const DISPLAY_DATE_FORMAT: &str = "%b %d, %Y %H:%M";

const FRACTION_DIGITS: usize = 6;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayTransaction {
    pub symbol: String,
    pub kind: TransactionType,
    pub quantity: f64,
    pub price: f64,
    pub total: f64,
    pub timestamp: NaiveDateTime,
    pub display_date: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NormalizedTransactions {
    /// Rows in backend order (oldest first).
    pub rows: Vec<DisplayTransaction>,
    pub dropped: usize,
    pub warnings: Vec<String>,
}

impl NormalizedTransactions {
    pub fn rows_newest_first(&self) -> impl Iterator<Item = &DisplayTransaction> {
        self.rows.iter().rev()
    }
}

/// Turns backend transaction records into display rows. Records that fail to
/// parse are dropped and reported; `recent` keeps only the last `n` rows.
pub fn normalize(raw: &[RawTransaction], recent: Option<usize>) -> NormalizedTransactions {
    let mut result = NormalizedTransactions::default();

    for (index, record) in raw.iter().enumerate() {
        match normalize_one(record) {
            Ok(row) => result.rows.push(row),
            Err(reason) => {
                result.dropped += 1;
                result
                    .warnings
                    .push(format!("transaction {} ({}) dropped: {}", index, record.symbol, reason));
            }
        }
    }

    if let Some(n) = recent {
        let skip = result.rows.len().saturating_sub(n);
        result.rows.drain(..skip);
    }
    result
}

fn normalize_one(record: &RawTransaction) -> Result<DisplayTransaction, String> {
    let kind = record.kind.parse::<TransactionType>()?;
    let timestamp = parse_timestamp(&record.date)
        .ok_or_else(|| format!("unparsable date '{}'", record.date))?;

    Ok(DisplayTransaction {
        symbol: record.symbol.clone(),
        kind,
        quantity: record.quantity,
        price: record.price,
        total: record.quantity * record.price,
        timestamp,
        display_date: timestamp.format(DISPLAY_DATE_FORMAT).to_string(),
    })
}

/// Parses the backend's ISO-8601 variants into a naive timestamp.
///
/// Zone suffixes (`Z`, `+HH:MM`, `-HH:MM`, `+HHMM`) are dropped without
/// shifting the clock time, because the backend mixes zoned and naive values
/// for the same wall-clock times. Fractions of 1 to 9 digits are padded or
/// truncated to microseconds. A bare date parses as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let text = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    let sep = text.find(|c: char| c == 'T' || c == 't' || c == ' ')?;
    let date = &text[..sep];
    let time = strip_zone(&text[sep + 1..]);

    let normalized = match time.split_once('.') {
        Some((whole, fraction)) => {
            if fraction.is_empty()
                || fraction.len() > 9
                || !fraction.bytes().all(|b| b.is_ascii_digit())
            {
                return None;
            }
            let mut micros: String = fraction.chars().take(FRACTION_DIGITS).collect();
            while micros.len() < FRACTION_DIGITS {
                micros.push('0');
            }
            format!("{}T{}.{}", date, whole, micros)
        }
        None => format!("{}T{}", date, time),
    };

    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

fn strip_zone(time: &str) -> &str {
    if let Some(stripped) = time.strip_suffix(|c: char| c == 'Z' || c == 'z') {
        return stripped;
    }
    if let Some(at) = time.rfind(|c: char| c == '+' || c == '-') {
        let offset = &time[at + 1..];
        let digits = offset.bytes().filter(u8::is_ascii_digit).count();
        let well_formed = match offset.len() {
            2 | 4 => digits == offset.len(),
            5 => digits == 4 && offset.as_bytes()[2] == b':',
            _ => false,
        };
        if well_formed {
            return &time[..at];
        }
    }
    time
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(symbol: &str, kind: &str, date: &str) -> RawTransaction {
        RawTransaction {
            symbol: symbol.to_string(),
            kind: kind.to_string(),
            quantity: 2.0,
            price: 50.0,
            date: date.to_string(),
        }
    }

    #[test]
    fn fractional_precision_is_normalized() {
        let result = normalize(
            &[
                record("AAPL", "buy", "2025-03-01T10:00:00.123Z"),
                record("AAPL", "buy", "2025-03-01T10:00:00.1Z"),
            ],
            None,
        );
        assert_eq!(result.dropped, 0);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].display_date, "Mar 01, 2025 10:00");
        assert_eq!(result.rows[0].display_date, result.rows[1].display_date);
    }

    #[test]
    fn unparsable_rows_are_dropped_and_counted() {
        let result = normalize(
            &[
                record("AAPL", "buy", "2025-03-01T10:00:00"),
                record("MSFT", "sell", "yesterday"),
                record("TSLA", "sell", "2025-03-02T09:30:00+02:00"),
            ],
            None,
        );
        assert_eq!(result.dropped, 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("MSFT"));
        let symbols: Vec<&str> = result.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "TSLA"]);
    }

    #[test]
    fn unknown_type_is_dropped() {
        let result = normalize(&[record("AAPL", "dividend", "2025-03-01T10:00:00")], None);
        assert!(result.rows.is_empty());
        assert_eq!(result.dropped, 1);
    }

    #[test]
    fn recent_takes_the_tail() {
        let raw: Vec<RawTransaction> = (1..=5)
            .map(|day| record(&format!("S{}", day), "buy", &format!("2025-03-0{}T12:00:00", day)))
            .collect();
        let result = normalize(&raw, Some(2));
        let symbols: Vec<&str> = result.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["S4", "S5"]);
        let newest: Vec<&str> = result.rows_newest_first().map(|r| r.symbol.as_str()).collect();
        assert_eq!(newest, vec!["S5", "S4"]);
    }

    #[test]
    fn totals_and_kind_are_filled() {
        let result = normalize(&[record("AAPL", "SELL", "2025-03-01 10:00:00")], None);
        assert_eq!(result.rows[0].kind, TransactionType::Sell);
        assert_eq!(result.rows[0].total, 100.0);
    }

    #[test]
    fn timestamp_variants() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_micro_opt(10, 0, 0, 123_456)
            .unwrap();
        assert_eq!(parse_timestamp("2025-03-01T10:00:00.123456789Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T10:00:00.123456-05:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T10:00:00.123456+0530"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-03-01"),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("2025-03-01T10:00:00.Z"), None);
        assert_eq!(parse_timestamp("2025-03-01T10:00:00.1234567890"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
