//! Capture time of a screenshot.
//!
//! VRChat names screenshots `VRChat_2024-03-09_21-04-55.120_1920x1080.png`
//! (older builds: `VRChat_1920x1080_2024-03-09_21-04-55.120.png`). The name is
//! the most reliable capture time since copies reset the modification time.
//! Names carry no zone and are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use std::path::Path;

const NAME_PREFIX: &str = "VRChat_";

/// Parse the capture time from a screenshot file name.
pub fn capture_time_from_name(name: &str) -> Option<DateTime<Utc>> {
    let start = name.find(NAME_PREFIX)? + NAME_PREFIX.len();
    let tokens: Vec<&str> = name[start..].splitn(4, '_').collect();

    tokens.windows(2).take(2).find_map(|pair| {
        let date = NaiveDate::parse_from_str(pair[0], "%Y-%m-%d").ok()?;
        let time = parse_clock(pair[1])?;
        Some(NaiveDateTime::new(date, time).and_utc())
    })
}

fn parse_clock(token: &str) -> Option<NaiveTime> {
    token
        .get(..12)
        .and_then(|t| NaiveTime::parse_from_str(t, "%H-%M-%S%.3f").ok())
        .or_else(|| {
            token
                .get(..8)
                .and_then(|t| NaiveTime::parse_from_str(t, "%H-%M-%S").ok())
        })
}

/// Capture time for a file: the name first, then mtime, then now.
pub fn capture_time(path: &Path) -> DateTime<Utc> {
    if let Some(ts) = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(capture_time_from_name)
    {
        return ts;
    }

    match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => DateTime::<Utc>::from(modified),
        Err(e) => {
            log::debug!("No modification time for {}: {}", path.display(), e);
            Utc::now()
        }
    }
}

/// ISO-8601 form used in persisted documents.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a persisted timestamp.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
