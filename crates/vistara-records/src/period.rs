use std::{fmt, str::FromStr};

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A calendar month.
///
/// Periods order chronologically and are serialized as `"YYYY-MM"`. Parsing also
/// accepts a full `"YYYY-MM-DD"` date, which is truncated to its month.
///
/// # Example
///
/// ```
/// use vistara_records::Period;
///
/// let jan: Period = "2025-01".parse().unwrap();
/// let apr = jan.offset(3);
/// assert_eq!(apr.to_string(), "2025-04");
/// assert_eq!(apr.months_since(jan), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParsePeriodError {
    #[display("invalid period '{input}': expected YYYY-MM or YYYY-MM-DD")]
    InvalidFormat { input: String },
    #[display("month {month} is out of range 1-12")]
    MonthOutOfRange { month: u32 },
}

impl Period {
    /// Creates a period from a year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Result<Self, ParsePeriodError> {
        if !(1..=12).contains(&month) {
            return Err(ParsePeriodError::MonthOutOfRange { month });
        }
        Ok(Self { year, month })
    }

    /// Returns the month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn month(self) -> u32 {
        self.month
    }

    /// Number of months elapsed from `earlier` to `self` (negative if `earlier` is later).
    #[must_use]
    pub fn months_since(self, earlier: Self) -> i64 {
        self.ordinal() - earlier.ordinal()
    }

    /// Returns the period `months` months after (or before, if negative) this one.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn offset(self, months: i64) -> Self {
        let ordinal = self.ordinal() + months;
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }

    fn ordinal(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ParsePeriodError::InvalidFormat {
            input: s.to_owned(),
        };
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d"))
            .map_err(|_| invalid())?;
        Ok(Self::from_date(date))
    }
}

impl Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An inclusive range of periods; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    #[serde(default)]
    pub from: Option<Period>,
    #[serde(default)]
    pub to: Option<Period>,
}

impl PeriodRange {
    #[must_use]
    pub fn contains(&self, period: Period) -> bool {
        self.from.is_none_or(|from| from <= period) && self.to.is_none_or(|to| period <= to)
    }

    /// Returns `false` when both bounds are set and `from` is after `to`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match (self.from, self.to) {
            (Some(from), Some(to)) => from <= to,
            _ => true,
        }
    }
}
