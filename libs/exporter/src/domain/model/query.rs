use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::Error;

lazy_static! {
    // Elasticsearch time units, see
    // https://www.elastic.co/guide/en/elasticsearch/reference/current/api-conventions.html#time-units
    static ref KEEP_ALIVE: Regex = Regex::new(r"^[1-9][0-9]*(d|h|m|s|ms|micros|nanos)$").unwrap();
}

pub const DEFAULT_TIMESTAMP_FIELD: &str = "@timestamp";
pub const DEFAULT_DATE_FORMAT: &str = "strict_date_optional_time";

/// Inclusive range on a timestamp field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub field: String,
    pub format: String,
    pub gte: Option<String>,
    pub lte: Option<String>,
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange {
            field: String::from(DEFAULT_TIMESTAMP_FIELD),
            format: String::from(DEFAULT_DATE_FORMAT),
            gte: None,
            lte: None,
        }
    }
}

/// What to retrieve: the indices, in order, the page size, how long the scroll
/// context is kept alive between two requests, and the time range.
///
/// Built once through `QuerySpec::new`, which validates it, and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    indices: Vec<String>,
    page_size: u64,
    keep_alive: String,
    range: TimeRange,
}

impl QuerySpec {
    pub fn new(
        indices: Vec<String>,
        page_size: u64,
        keep_alive: impl Into<String>,
        range: TimeRange,
    ) -> Result<Self, Error> {
        let keep_alive = keep_alive.into();

        if indices.is_empty() {
            return Err(Error::InvalidQuery {
                details: String::from("no index to export"),
            });
        }
        if let Some(index) = indices.iter().find(|index| index.trim().is_empty()) {
            return Err(Error::InvalidQuery {
                details: format!("invalid index name '{}'", index),
            });
        }
        if page_size == 0 {
            return Err(Error::InvalidQuery {
                details: String::from("page size must be at least 1"),
            });
        }
        if !KEEP_ALIVE.is_match(&keep_alive) {
            return Err(Error::InvalidQuery {
                details: format!("invalid scroll keep alive '{}'", keep_alive),
            });
        }
        if range.field.is_empty() {
            return Err(Error::InvalidQuery {
                details: String::from("empty timestamp field"),
            });
        }

        let gte = parse_bound(&range.format, range.gte.as_deref())?;
        let lte = parse_bound(&range.format, range.lte.as_deref())?;
        if let (Some(gte), Some(lte)) = (gte, lte) {
            if gte > lte {
                return Err(Error::InvalidQuery {
                    details: format!(
                        "lower bound {} is after upper bound {}",
                        range.gte.as_deref().unwrap_or_default(),
                        range.lte.as_deref().unwrap_or_default()
                    ),
                });
            }
        }

        Ok(QuerySpec {
            indices,
            page_size,
            keep_alive,
            range,
        })
    }

    pub fn indices(&self) -> &[String] {
        &self.indices
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn keep_alive(&self) -> &str {
        &self.keep_alive
    }

    pub fn range(&self) -> &TimeRange {
        &self.range
    }
}

// Formats read as ISO 8601 by elasticsearch.
const ISO_FORMATS: &[&str] = &[
    "strict_date_optional_time",
    "strict_date_optional_time_nanos",
    "date_optional_time",
    "strict_date_time",
    "date_time",
    "strict_date",
    "date",
];

// Checks a bound against the range format, and returns it in epoch milliseconds
// so bounds can be compared. Bounds in any other format are passed through to
// elasticsearch unchecked.
fn parse_bound(format: &str, bound: Option<&str>) -> Result<Option<i64>, Error> {
    let bound = match bound {
        Some(bound) if bound.trim().is_empty() => {
            return Err(Error::InvalidQuery {
                details: String::from("empty range bound"),
            })
        }
        Some(bound) => bound,
        None => return Ok(None),
    };

    match format {
        "epoch_millis" => parse_epoch(bound, 1).map(Some),
        "epoch_second" => parse_epoch(bound, 1000).map(Some),
        format if ISO_FORMATS.contains(&format) => {
            parse_iso(bound).map(|dt| Some(dt.timestamp_millis()))
        }
        _ => Ok(None),
    }
}

fn parse_epoch(bound: &str, millis_per_unit: i64) -> Result<i64, Error> {
    bound
        .parse::<i64>()
        .ok()
        .and_then(|value| value.checked_mul(millis_per_unit))
        .ok_or_else(|| Error::InvalidQuery {
            details: format!("'{}' is not an epoch timestamp", bound),
        })
}

// Accepts the strict ISO 8601 shapes: a date, a date time without offset (UTC),
// or a full RFC 3339 date time.
fn parse_iso(bound: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(bound) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(bound, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Some(midnight) = NaiveDate::parse_from_str(bound, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&midnight));
    }
    Err(Error::InvalidQuery {
        details: format!("'{}' is not a strict ISO 8601 date time", bound),
    })
}
