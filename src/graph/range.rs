//! Inclusive capture-date window applied before graph building.

use crate::error::{LensError, Result};
use crate::metadata::DecodedRecord;
use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Inclusive range of capture dates. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// First day included.
    pub start: Option<NaiveDate>,
    /// Last day included.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Range with no bounds; keeps every record.
    pub fn unbounded() -> Self {
        DateRange::default()
    }

    /// Whether neither end is set.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Parse a lower bound. `YYYY-MM` means the first day of that month.
    pub fn parse_start(value: &str) -> Result<NaiveDate> {
        if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Ok(day);
        }
        parse_month(value).ok_or_else(|| invalid(value))
    }

    /// Parse an upper bound. `YYYY-MM` means the last day of that month.
    pub fn parse_end(value: &str) -> Result<NaiveDate> {
        if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Ok(day);
        }
        let first = parse_month(value).ok_or_else(|| invalid(value))?;
        let (year, month) = if first.month() == 12 {
            (first.year() + 1, 1)
        } else {
            (first.year(), first.month() + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| invalid(value))
    }

    /// Build a range from optional textual bounds.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Ok(DateRange {
            start: start.map(DateRange::parse_start).transpose()?,
            end: end.map(DateRange::parse_end).transpose()?,
        })
    }

    /// Whether `ts` falls inside the range (by UTC calendar day).
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        let day = ts.date_naive();
        self.start.map_or(true, |s| day >= s) && self.end.map_or(true, |e| day <= e)
    }

    /// Records captured inside the range. Unbounded ranges keep every record;
    /// otherwise records without a parseable timestamp are dropped.
    pub fn filter<'a>(&self, records: &'a [DecodedRecord]) -> Vec<&'a DecodedRecord> {
        if self.is_unbounded() {
            return records.iter().collect();
        }
        records
            .iter()
            .filter(|r| r.captured_at().is_some_and(|ts| self.contains(&ts)))
            .collect()
    }
}

fn parse_month(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d").ok()
}

fn invalid(value: &str) -> LensError {
    LensError::InvalidDate {
        value: value.to_string(),
    }
}
