use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::payroll::error::PayrollError;

static PERIOD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("period pattern is valid"));

/// Calendar month a run covers, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn parse(raw: &str) -> Result<Self, PayrollError> {
        if !PERIOD_PATTERN.is_match(raw) {
            return Err(PayrollError::InvalidPeriod(raw.to_string()));
        }
        let invalid = || PayrollError::InvalidPeriod(raw.to_string());
        let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
        let period = Period {
            year: year.parse().map_err(|_| invalid())?,
            month: month.parse().map_err(|_| invalid())?,
        };
        // Reject years chrono cannot represent.
        NaiveDate::from_ymd_opt(period.year, period.month, 1).ok_or_else(invalid)?;
        Ok(period)
    }

    /// First day of the month.
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// First day of the following month (exclusive bound).
    pub fn end_date(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
    }

    /// `[start, end)` as timestamps.
    pub fn window(&self) -> (NaiveDateTime, NaiveDateTime) {
        (
            self.start_date().and_time(chrono::NaiveTime::MIN),
            self.end_date().and_time(chrono::NaiveTime::MIN),
        )
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date < self.end_date()
    }

    /// `YYYYMM`, used in payment numbers.
    pub fn compact(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    /// Idempotency key for the accrual journal.
    pub fn posting_reference(&self) -> String {
        format!("PAYROLL-{}", self)
    }

    /// Idempotency key for the cash journal.
    pub fn disbursement_reference(&self) -> String {
        format!("PAYROLL-DISB-{}", self)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PayrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::parse(s)
    }
}

impl TryFrom<String> for Period {
    type Error = PayrollError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Period::parse(&value)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}
