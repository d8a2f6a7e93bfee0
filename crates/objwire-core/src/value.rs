// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Atomic values and the string codecs that carry them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::WireError;

/// Value held by a [`MemberKind::Value`](crate::MemberKind::Value) member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scalar {
    /// Free text.
    Text(String),
    /// Signed integer.
    Integer(i64),
    /// Boolean flag.
    Boolean(bool),
    /// Amount in minor units (cents) with an ISO 4217 currency code.
    Money {
        /// Amount in minor units.
        minor_units: i64,
        /// Currency code, e.g. `EUR`.
        currency: String,
    },
    /// Calendar date.
    Date {
        /// Year.
        year: i32,
        /// Month, 1-12.
        month: u8,
        /// Day of month, 1-31.
        day: u8,
    },
}

/// String codec owned by a value type.
///
/// `encode` and `decode` must be inverse: `decode(encode(v)) == v`.
pub trait ValueCodec: Send + Sync + fmt::Debug {
    /// Encoded form of `value`.
    fn encode(&self, value: &Scalar) -> Result<String, WireError>;
    /// Value of `encoded`.
    fn decode(&self, encoded: &str) -> Result<Scalar, WireError>;
}

fn invalid(type_name: &str, reason: impl Into<String>) -> WireError {
    WireError::InvalidValue {
        type_name: type_name.to_owned(),
        reason: reason.into(),
    }
}

fn mismatch(type_name: &str, value: &Scalar) -> WireError {
    invalid(type_name, format!("cannot encode {value:?}"))
}

/// Plain text, carried verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl ValueCodec for TextCodec {
    fn encode(&self, value: &Scalar) -> Result<String, WireError> {
        match value {
            Scalar::Text(s) => Ok(s.clone()),
            other => Err(mismatch("text", other)),
        }
    }

    fn decode(&self, encoded: &str) -> Result<Scalar, WireError> {
        Ok(Scalar::Text(encoded.to_owned()))
    }
}

/// Decimal integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCodec;

impl ValueCodec for IntegerCodec {
    fn encode(&self, value: &Scalar) -> Result<String, WireError> {
        match value {
            Scalar::Integer(n) => Ok(n.to_string()),
            other => Err(mismatch("integer", other)),
        }
    }

    fn decode(&self, encoded: &str) -> Result<Scalar, WireError> {
        encoded
            .parse()
            .map(Scalar::Integer)
            .map_err(|e| invalid("integer", e.to_string()))
    }
}

/// `true` / `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl ValueCodec for BooleanCodec {
    fn encode(&self, value: &Scalar) -> Result<String, WireError> {
        match value {
            Scalar::Boolean(b) => Ok(b.to_string()),
            other => Err(mismatch("boolean", other)),
        }
    }

    fn decode(&self, encoded: &str) -> Result<Scalar, WireError> {
        match encoded {
            "true" => Ok(Scalar::Boolean(true)),
            "false" => Ok(Scalar::Boolean(false)),
            other => Err(invalid("boolean", format!("expected true or false, got {other:?}"))),
        }
    }
}

/// Money as `"<units>.<cents> <CCY>"`, e.g. `"12.50 EUR"` or `"-0.05 GBP"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoneyCodec;

impl ValueCodec for MoneyCodec {
    fn encode(&self, value: &Scalar) -> Result<String, WireError> {
        match value {
            Scalar::Money {
                minor_units,
                currency,
            } => {
                let sign = if *minor_units < 0 { "-" } else { "" };
                let abs = minor_units.unsigned_abs();
                Ok(format!("{sign}{}.{:02} {currency}", abs / 100, abs % 100))
            }
            other => Err(mismatch("money", other)),
        }
    }

    fn decode(&self, encoded: &str) -> Result<Scalar, WireError> {
        let (amount, currency) = encoded
            .split_once(' ')
            .ok_or_else(|| invalid("money", "missing currency"))?;
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(invalid("money", format!("bad currency code {currency:?}")));
        }
        let (negative, digits) = match amount.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount),
        };
        let (units, cents) = digits
            .split_once('.')
            .ok_or_else(|| invalid("money", "amount needs two decimal places"))?;
        if cents.len() != 2 || !cents.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("money", "amount needs two decimal places"));
        }
        if units.is_empty() || !units.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("money", format!("bad amount {amount:?}")));
        }
        let units: i64 = units
            .parse()
            .map_err(|_| invalid("money", format!("bad amount {amount:?}")))?;
        let cents: i64 = cents
            .parse()
            .map_err(|_| invalid("money", format!("bad amount {amount:?}")))?;
        let magnitude = units
            .checked_mul(100)
            .and_then(|u| u.checked_add(cents))
            .ok_or_else(|| invalid("money", "amount out of range"))?;
        Ok(Scalar::Money {
            minor_units: if negative { -magnitude } else { magnitude },
            currency: currency.to_owned(),
        })
    }
}

/// Calendar date as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCodec;

const fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        _ => 31,
    }
}

impl ValueCodec for DateCodec {
    fn encode(&self, value: &Scalar) -> Result<String, WireError> {
        match value {
            Scalar::Date { year, month, day } => Ok(format!("{year:04}-{month:02}-{day:02}")),
            other => Err(mismatch("date", other)),
        }
    }

    fn decode(&self, encoded: &str) -> Result<Scalar, WireError> {
        let mut parts = encoded.splitn(3, '-');
        let (Some(y), Some(m), Some(d)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid("date", format!("expected YYYY-MM-DD, got {encoded:?}")));
        };
        let bad = |_| invalid("date", format!("expected YYYY-MM-DD, got {encoded:?}"));
        let year: i32 = y.parse().map_err(bad)?;
        let month: u8 = m.parse().map_err(bad)?;
        let day: u8 = d.parse().map_err(bad)?;
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return Err(invalid("date", format!("no such day {encoded:?}")));
        }
        Ok(Scalar::Date { year, month, day })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn money_keeps_minor_units_and_sign() {
        let codec = MoneyCodec;
        let v = codec.decode("12.50 EUR").unwrap();
        assert_eq!(
            v,
            Scalar::Money {
                minor_units: 1250,
                currency: "EUR".into()
            }
        );
        assert_eq!(codec.encode(&v).unwrap(), "12.50 EUR");
        let neg = codec.decode("-0.05 GBP").unwrap();
        assert_eq!(codec.encode(&neg).unwrap(), "-0.05 GBP");
    }

    #[test]
    fn money_rejects_loose_formats() {
        for bad in ["12.5 EUR", "12.50", "12.50 eur", "x.00 EUR", "--1.00 EUR"] {
            assert!(MoneyCodec.decode(bad).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn dates_validate_the_calendar() {
        let codec = DateCodec;
        assert_eq!(
            codec.decode("2024-02-29").unwrap(),
            Scalar::Date {
                year: 2024,
                month: 2,
                day: 29
            }
        );
        assert!(codec.decode("2023-02-29").is_err());
        assert!(codec.decode("2023-13-01").is_err());
        assert!(codec.decode("2023/01/01").is_err());
        let d = Scalar::Date {
            year: 7,
            month: 3,
            day: 9,
        };
        assert_eq!(codec.encode(&d).unwrap(), "0007-03-09");
    }

    #[test]
    fn codecs_refuse_foreign_scalars() {
        assert!(TextCodec.encode(&Scalar::Integer(1)).is_err());
        assert!(IntegerCodec.decode("1.5").is_err());
        assert!(BooleanCodec.decode("yes").is_err());
    }
}
