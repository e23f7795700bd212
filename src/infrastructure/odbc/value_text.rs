//! Turning driver text buffers into `FieldValue`s.
//!
//! The adapter binds every column as text and keeps the column's declared
//! kind next to it. Values that do not parse as their declared kind are kept
//! verbatim as text rather than dropped.

use crate::domain::entities::FieldValue;
use chrono::{NaiveDate, NaiveDateTime};

/// Coarse column kind derived from the driver's declared SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    DateTime,
    Text,
}

/// Converts one cell. `None` is a SQL NULL.
pub fn parse_text_value(kind: ColumnKind, raw: Option<&[u8]>) -> FieldValue {
    let Some(bytes) = raw else {
        return FieldValue::Null;
    };
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();

    let parsed = match kind {
        ColumnKind::Integer => trimmed.parse::<i64>().ok().map(FieldValue::Integer),
        ColumnKind::Float => trimmed.parse::<f64>().ok().map(FieldValue::Float),
        ColumnKind::Boolean => match trimmed {
            "1" | "-1" | "true" | "True" | "TRUE" => Some(FieldValue::Boolean(true)),
            "0" | "false" | "False" | "FALSE" => Some(FieldValue::Boolean(false)),
            _ => None,
        },
        ColumnKind::DateTime => parse_timestamp(trimmed).map(FieldValue::DateTime),
        ColumnKind::Text => None,
    };
    parsed.unwrap_or_else(|| FieldValue::Text(text.into_owned()))
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_and_text() {
        assert_eq!(parse_text_value(ColumnKind::Integer, None), FieldValue::Null);
        assert_eq!(
            parse_text_value(ColumnKind::Text, Some(b" padded ")),
            FieldValue::Text(" padded ".to_string())
        );
    }

    #[test]
    fn test_typed_columns() {
        assert_eq!(parse_text_value(ColumnKind::Integer, Some(b"42")), FieldValue::Integer(42));
        assert_eq!(parse_text_value(ColumnKind::Float, Some(b"2.5")), FieldValue::Float(2.5));
        assert_eq!(parse_text_value(ColumnKind::Boolean, Some(b"1")), FieldValue::Boolean(true));
        assert_eq!(parse_text_value(ColumnKind::Boolean, Some(b"0")), FieldValue::Boolean(false));

        let expected = NaiveDate::from_ymd_opt(2021, 3, 9)
            .unwrap()
            .and_hms_opt(10, 11, 12)
            .unwrap();
        assert_eq!(
            parse_text_value(ColumnKind::DateTime, Some(b"2021-03-09 10:11:12.000")),
            FieldValue::DateTime(expected)
        );
        assert_eq!(
            parse_text_value(ColumnKind::DateTime, Some(b"2021-03-09 10:11:12")),
            FieldValue::DateTime(expected)
        );
    }

    #[test]
    fn test_unparsable_value_is_kept_as_text() {
        assert_eq!(
            parse_text_value(ColumnKind::Integer, Some(b"12abc")),
            FieldValue::Text("12abc".to_string())
        );
        assert_eq!(
            parse_text_value(ColumnKind::DateTime, Some(b"someday")),
            FieldValue::Text("someday".to_string())
        );
    }
}
