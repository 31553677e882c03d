use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::data::model::Value;

/// Cell-level coercions used by [`CleaningRule::Coerce`](super::CleaningRule::Coerce).
///
/// Every parser is total: a cell that cannot be parsed becomes [`Value::Null`].
/// Every parser is idempotent: feeding its own output back in is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellParser {
    /// `.`-decimal float.
    Float,
    /// Whole number; floats with a fractional part are rejected.
    Integer,
    /// Locale number such as `1 234,50`: whitespace removed, `,` read as `.`.
    DecimalComma,
    /// Calendar date or timestamp. ISO-8601 is always accepted; slash, dot and
    /// dash forms follow the declared day/month order.
    Date { day_first: bool },
}

impl CellParser {
    pub fn parse(&self, value: &Value) -> Value {
        if value.is_missing() {
            return Value::Null;
        }
        match self {
            CellParser::Float => match value {
                Value::Str(s) => parse_float(s.trim()),
                other => other.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            CellParser::Integer => match value {
                Value::Int(i) => Value::Int(*i),
                Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Value::Int(*f as i64)
                }
                Value::Str(s) => match s.trim().parse::<i64>() {
                    Ok(i) => Value::Int(i),
                    Err(_) => match parse_float(s.trim()) {
                        Value::Float(f) => CellParser::Integer.parse(&Value::Float(f)),
                        _ => Value::Null,
                    },
                },
                _ => Value::Null,
            },
            CellParser::DecimalComma => match value {
                Value::Str(s) => {
                    let cleaned: String = s
                        .chars()
                        .filter(|c| !c.is_whitespace())
                        .map(|c| if c == ',' { '.' } else { c })
                        .collect();
                    parse_float(&cleaned)
                }
                other => other.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            CellParser::Date { day_first } => match value {
                Value::Date(d) => Value::Date(*d),
                Value::Str(s) => parse_date(s.trim(), *day_first)
                    .map(Value::Date)
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            },
        }
    }
}

fn parse_float(s: &str) -> Value {
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Float(f),
        _ => Value::Null,
    }
}

const ISO_DATETIME: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const DAY_FIRST_DATETIME: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d-%m-%Y %H:%M",
];
const MONTH_FIRST_DATETIME: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m-%d-%Y %H:%M",
];
const DAY_FIRST_DATE: &[&str] = &["%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%d/%m/%y", "%d.%m.%y"];
const MONTH_FIRST_DATE: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y"];

/// Parse a date or timestamp under the declared day/month convention.
pub fn parse_date(s: &str, day_first: bool) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }

    let (datetimes, dates) = if day_first {
        (DAY_FIRST_DATETIME, DAY_FIRST_DATE)
    } else {
        (MONTH_FIRST_DATETIME, MONTH_FIRST_DATE)
    };

    ISO_DATETIME
        .iter()
        .chain(datetimes)
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            dates
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn decimal_comma_handles_spaces_and_commas() {
        let p = CellParser::DecimalComma;
        assert_eq!(p.parse(&Value::Str("1 234,50".into())), Value::Float(1234.5));
        assert_eq!(p.parse(&Value::Str("abc".into())), Value::Null);
        assert_eq!(p.parse(&Value::Int(7)), Value::Float(7.0));
    }

    #[test]
    fn parsers_are_idempotent() {
        let inputs = [
            Value::Str("12,75".into()),
            Value::Str("3".into()),
            Value::Str("24.12.2018".into()),
            Value::Str("junk".into()),
            Value::Null,
        ];
        for parser in [
            CellParser::DecimalComma,
            CellParser::Float,
            CellParser::Integer,
            CellParser::Date { day_first: true },
        ] {
            for input in &inputs {
                let once = parser.parse(input);
                assert_eq!(parser.parse(&once), once, "{parser:?} on {input:?}");
            }
        }
    }

    #[test]
    fn date_order_follows_convention() {
        assert_eq!(parse_date("02/03/2019", true), Some(date(2019, 3, 2)));
        assert_eq!(parse_date("02/03/2019", false), Some(date(2019, 2, 3)));
        assert_eq!(parse_date("24.12.2018", true), Some(date(2018, 12, 24)));
        assert_eq!(parse_date("2018-12-24", false), Some(date(2018, 12, 24)));
        assert_eq!(parse_date("13/25/2019", false), None);
    }

    #[test]
    fn timestamps_keep_their_time() {
        let ts = parse_date("12/1/2010 8:26", false).unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M").to_string(), "2010-12-01 08:26");
        let iso = parse_date("2010-12-01T08:26:00Z", false).unwrap();
        assert_eq!(iso, ts);
    }

    #[test]
    fn integer_rejects_fractions() {
        let p = CellParser::Integer;
        assert_eq!(p.parse(&Value::Float(4.0)), Value::Int(4));
        assert_eq!(p.parse(&Value::Float(4.5)), Value::Null);
        assert_eq!(p.parse(&Value::Str("17850.0".into())), Value::Int(17850));
    }
}
