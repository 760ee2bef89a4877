//! Fixed-point money.
//!
//! RULE: no monetary value is ever an f64. Every base rate, bonus and
//! total is a whole number of cents, so summing thousands of bonuses
//! cannot drift.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub const fn from_dollars(dollars: i64) -> Self {
        Cents(dollars * 100)
    }

    pub const fn as_i64(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Cost per thousand views, rounded down. Zero when there are no views.
    pub fn per_mille(self, views: u64) -> Cents {
        if views == 0 {
            return Cents::ZERO;
        }
        let scaled = i128::from(self.0) * 1000 / i128::from(views);
        Cents(scaled as i64)
    }
}

impl Add for Cents {
    type Output = Cents;
    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0 + rhs.0)
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        self.0 += rhs.0;
    }
}

impl Sub for Cents {
    type Output = Cents;
    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0 - rhs.0)
    }
}

impl Mul<u64> for Cents {
    type Output = Cents;
    fn mul(self, count: u64) -> Cents {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Cents(self.0.saturating_mul(count))
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Cents> for Cents {
    fn sum<I: Iterator<Item = &'a Cents>>(iter: I) -> Cents {
        iter.copied().sum()
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let dollars = (abs / 100).to_string();

        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, ch) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "{sign}${grouped}.{:02}", abs % 100)
    }
}

/// Parses `30`, `30.5`, `30.05`, `$1,270.00` and `-3.25`.
/// More than two fractional digits is an error, not a rounding.
impl FromStr for Cents {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let body: String = body
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();

        let (whole, frac) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body.as_str(), ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(format!("Not a money amount: {s:?}"));
        }
        if frac.len() > 2 {
            return Err(format!("More than two decimal places: {s:?}"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| format!("Not a money amount: {s:?}"))?
        };
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| format!("Not a money amount: {s:?}"))? * 10,
            _ => frac.parse().map_err(|_| format!("Not a money amount: {s:?}"))?,
        };

        let cents = whole * 100 + frac_cents;
        Ok(Cents(if negative { -cents } else { cents }))
    }
}

/// Serde adapter for amounts written in dollars, as on the command line.
/// Reads `30`, `30.5` or `"$1,270.00"`; writes the display form.
///
/// Use with `#[serde(with = "crate::money::dollars")]`.
pub mod dollars {
    use super::*;

    fn from_value(raw: &Value) -> Result<Cents, String> {
        match raw {
            Value::String(text) => text.parse(),
            Value::Number(n) => n.to_string().parse(),
            other => Err(format!("expected a dollar amount, got {other}")),
        }
    }

    pub fn serialize<S: Serializer>(amount: &Cents, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cents, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        from_value(&raw).map_err(serde::de::Error::custom)
    }

    /// The same, for a map of dollar amounts.
    pub mod by_key {
        use super::from_value;
        use crate::money::Cents;
        use serde::{Deserialize, Deserializer, Serializer};
        use serde_json::Value;
        use std::collections::BTreeMap;

        pub fn serialize<S: Serializer>(
            amounts: &BTreeMap<String, Cents>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.collect_map(amounts.iter().map(|(k, v)| (k, v.to_string())))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<BTreeMap<String, Cents>, D::Error> {
            let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
            raw.into_iter()
                .map(|(k, v)| {
                    let amount = from_value(&v)
                        .map_err(|e| serde::de::Error::custom(format!("'{k}': {e}")))?;
                    Ok((k, amount))
                })
                .collect()
        }
    }
}
