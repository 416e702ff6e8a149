//! Per-kind `to_text` / `from_text` pairs.
//!
//! | kind | text form |
//! |---|---|
//! | text, email, phone, SSN | UTF-8, terminated by the padding NUL |
//! | integer, big integer | `-?[0-9]+` |
//! | float | shortest round-trip exponent form, e.g. `1.23456e2` |
//! | date | `YYYY-MM-DD` (10 bytes) |
//! | datetime | `YYYY-MM-DD HH:MM:SS.ffffff` (26 bytes) |

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use common::FieldKind;

use super::{validate, PlainValue, ValueError};
use crate::crypto::padding;

/// Canonical date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical datetime format (microsecond precision).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const DATE_LEN: usize = 10;
const DATETIME_LEN: usize = 26;
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Serialize `value` for a field of kind `kind`.
///
/// Validated kinds run their validation pass first.
///
/// # Errors
///
/// - [`ValueError::TypeMismatch`] if the variant does not fit `kind`.
/// - [`ValueError::Validation`] if an email/phone/SSN fails its pattern.
/// - [`ValueError::Encoding`] if text contains a NUL byte.
/// - [`ValueError::Format`] for non-finite floats, out-of-range years, or
///   datetimes finer than a microsecond.
pub fn to_text(kind: FieldKind, value: &PlainValue) -> Result<Vec<u8>, ValueError> {
    match (kind, value) {
        (k, PlainValue::Text(s)) if k.is_textual() => {
            if s.as_bytes().contains(&padding::TERMINATOR) {
                return Err(ValueError::Encoding("text contains a NUL byte".into()));
            }
            validate::check(k.subtype(), s)?;
            Ok(s.as_bytes().to_vec())
        }
        (FieldKind::Integer, PlainValue::Integer(v)) => Ok(v.to_string().into_bytes()),
        (FieldKind::BigInteger, PlainValue::BigInteger(v)) => Ok(v.to_string().into_bytes()),
        (FieldKind::Float, PlainValue::Float(v)) => {
            if !v.is_finite() {
                return Err(ValueError::Format("float must be finite".into()));
            }
            Ok(format!("{v:e}").into_bytes())
        }
        (FieldKind::Date, PlainValue::Date(d)) => {
            check_year(d.year())?;
            Ok(d.format(DATE_FORMAT).to_string().into_bytes())
        }
        (FieldKind::DateTime, PlainValue::DateTime(dt)) => {
            check_year(dt.year())?;
            let nanos = dt.nanosecond();
            if nanos >= 1_000_000_000 {
                return Err(ValueError::Format("leap seconds are not representable".into()));
            }
            if nanos % 1_000 != 0 {
                return Err(ValueError::Format(
                    "datetime precision is limited to microseconds".into(),
                ));
            }
            Ok(dt.format(DATETIME_FORMAT).to_string().into_bytes())
        }
        (kind, value) => Err(ValueError::TypeMismatch {
            expected: expected_variant(kind),
            found: value.variant_name(),
        }),
    }
}

/// Parse the grammar prefix of `bytes` for `kind`, ignoring anything after it.
pub fn from_text(kind: FieldKind, bytes: &[u8]) -> Result<PlainValue, ValueError> {
    parse_prefix(kind, bytes).map(|(value, _)| value)
}

/// Parse `input` for `kind`, requiring the whole input to be consumed.
///
/// Used for human-supplied values, where trailing garbage is an error.
pub fn parse_exact(kind: FieldKind, input: &str) -> Result<PlainValue, ValueError> {
    let (value, consumed) = parse_prefix(kind, input.as_bytes())?;
    if consumed != input.len() {
        return Err(ValueError::Format(format!(
            "unexpected trailing input after {} value",
            kind.name()
        )));
    }
    Ok(value)
}

/// Parse the grammar prefix of `bytes` for `kind`.
///
/// Returns the value and the number of bytes consumed.
pub fn parse_prefix(kind: FieldKind, bytes: &[u8]) -> Result<(PlainValue, usize), ValueError> {
    match kind {
        FieldKind::Text | FieldKind::Email | FieldKind::UsPhone | FieldKind::UsSsn => {
            let raw = padding::terminated(bytes);
            let text = std::str::from_utf8(raw)
                .map_err(|e| ValueError::Encoding(format!("invalid UTF-8 at byte {}", e.valid_up_to())))?;
            validate::check(kind.subtype(), text)?;
            Ok((PlainValue::Text(text.to_owned()), raw.len()))
        }
        FieldKind::Integer => {
            let (digits, n) = integer_prefix(bytes)?;
            let v = digits
                .parse::<i64>()
                .map_err(|_| ValueError::Format("integer out of range".into()))?;
            Ok((PlainValue::Integer(v), n))
        }
        FieldKind::BigInteger => {
            let (digits, n) = integer_prefix(bytes)?;
            let v = digits
                .parse::<i128>()
                .map_err(|_| ValueError::Format("big integer out of range".into()))?;
            Ok((PlainValue::BigInteger(v), n))
        }
        FieldKind::Float => {
            let n = bytes
                .iter()
                .take_while(|b| b.is_ascii_digit() || matches!(**b, b'.' | b'e' | b'E' | b'+' | b'-'))
                .count();
            let text = ascii(&bytes[..n])?;
            let v = text
                .parse::<f64>()
                .map_err(|_| ValueError::Format("expected a decimal float".into()))?;
            if !v.is_finite() {
                return Err(ValueError::Format("float must be finite".into()));
            }
            Ok((PlainValue::Float(v), n))
        }
        FieldKind::Date => {
            let text = fixed_width(bytes, DATE_LEN, "date")?;
            let d = NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map_err(|_| ValueError::Format("expected YYYY-MM-DD".into()))?;
            check_year(d.year())?;
            if d.format(DATE_FORMAT).to_string() != text {
                return Err(ValueError::Format("expected YYYY-MM-DD".into()));
            }
            Ok((PlainValue::Date(d), DATE_LEN))
        }
        FieldKind::DateTime => {
            let text = fixed_width(bytes, DATETIME_LEN, "datetime")?;
            let dt = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                .map_err(|_| ValueError::Format("expected YYYY-MM-DD HH:MM:SS.ffffff".into()))?;
            check_year(dt.year())?;
            if dt.format(DATETIME_FORMAT).to_string() != text {
                return Err(ValueError::Format("expected YYYY-MM-DD HH:MM:SS.ffffff".into()));
            }
            Ok((PlainValue::DateTime(dt), DATETIME_LEN))
        }
    }
}

/// Longest `-?[0-9]+` prefix of `bytes`.
fn integer_prefix(bytes: &[u8]) -> Result<(&str, usize), ValueError> {
    let sign = usize::from(bytes.first() == Some(&b'-'));
    let digits = bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return Err(ValueError::Format("expected decimal digits".into()));
    }
    let n = sign + digits;
    Ok((ascii(&bytes[..n])?, n))
}

fn fixed_width<'a>(bytes: &'a [u8], width: usize, what: &str) -> Result<&'a str, ValueError> {
    let head = bytes
        .get(..width)
        .ok_or_else(|| ValueError::Format(format!("{what} needs {width} bytes, got {}", bytes.len())))?;
    std::str::from_utf8(head).map_err(|_| ValueError::Format(format!("{what} is not ASCII")))
}

fn ascii(bytes: &[u8]) -> Result<&str, ValueError> {
    std::str::from_utf8(bytes).map_err(|_| ValueError::Format("expected ASCII".into()))
}

fn check_year(year: i32) -> Result<(), ValueError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValueError::Format(format!(
            "year {year} outside {MIN_YEAR}..={MAX_YEAR}"
        )));
    }
    Ok(())
}

fn expected_variant(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text | FieldKind::Email | FieldKind::UsPhone | FieldKind::UsSsn => "text",
        other => other.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILLER: &[u8] = b"\x0042e+7-x";

    fn with_filler(text: &[u8]) -> Vec<u8> {
        let mut v = text.to_vec();
        v.extend_from_slice(FILLER);
        v
    }

    fn round_trip(kind: FieldKind, value: PlainValue) {
        let text = to_text(kind, &value).unwrap();
        assert_eq!(from_text(kind, &with_filler(&text)).unwrap(), value, "{kind:?}");
    }

    #[test]
    fn integers_round_trip_at_extremes() {
        for v in [0, 1, -1, i64::MAX, i64::MIN] {
            round_trip(FieldKind::Integer, PlainValue::Integer(v));
        }
        for v in [i128::MAX, i128::MIN, i64::MAX as i128 * 100] {
            round_trip(FieldKind::BigInteger, PlainValue::BigInteger(v));
        }
    }

    #[test]
    fn integer_text_is_plain_decimal() {
        assert_eq!(
            to_text(FieldKind::Integer, &PlainValue::Integer(i64::MAX)).unwrap(),
            b"9223372036854775807"
        );
        assert_eq!(to_text(FieldKind::Integer, &PlainValue::Integer(-42)).unwrap(), b"-42");
    }

    #[test]
    fn integer_parse_stops_at_first_non_digit() {
        let (v, n) = parse_prefix(FieldKind::Integer, b"123\x00987").unwrap();
        assert_eq!(v, PlainValue::Integer(123));
        assert_eq!(n, 3);
    }

    #[test]
    fn integer_parse_rejects_non_numeric_and_overflow() {
        assert!(matches!(
            from_text(FieldKind::Integer, b"abc"),
            Err(ValueError::Format(_))
        ));
        assert!(matches!(
            from_text(FieldKind::Integer, b"-"),
            Err(ValueError::Format(_))
        ));
        assert!(matches!(
            from_text(FieldKind::Integer, b"9223372036854775808"),
            Err(ValueError::Format(_))
        ));
    }

    #[test]
    fn floats_round_trip_exactly() {
        let big = i64::MAX as f64;
        for v in [
            0.0,
            -1.5,
            123.456 + big,
            big + 1.0 / 3.0,
            1.0 / 3.0,
            f64::MAX,
            f64::MIN_POSITIVE,
            -2.2250738585072014e-308,
            5e-324,
        ] {
            round_trip(FieldKind::Float, PlainValue::Float(v));
        }
    }

    #[test]
    fn float_text_fits_default_max_length() {
        let max = FieldKind::Float.default_max_length().unwrap();
        for v in [-2.2250738585072014e-308, -1.7976931348623157e308, 5e-324] {
            let text = to_text(FieldKind::Float, &PlainValue::Float(v)).unwrap();
            assert!(text.len() <= max, "{}", String::from_utf8_lossy(&text));
        }
    }

    #[test]
    fn non_finite_float_rejected() {
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                to_text(FieldKind::Float, &PlainValue::Float(v)),
                Err(ValueError::Format(_))
            ));
        }
    }

    #[test]
    fn dates_round_trip_at_year_bounds() {
        for (y, m, d) in [(1, 1, 1), (9999, 12, 31), (2000, 2, 29)] {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            round_trip(FieldKind::Date, PlainValue::Date(date));
        }
        assert_eq!(
            to_text(
                FieldKind::Date,
                &PlainValue::Date(NaiveDate::from_ymd_opt(1, 1, 1).unwrap())
            )
            .unwrap(),
            b"0001-01-01"
        );
    }

    #[test]
    fn dates_before_year_one_rejected() {
        let bc = NaiveDate::from_ymd_opt(0, 1, 1).unwrap();
        assert!(matches!(
            to_text(FieldKind::Date, &PlainValue::Date(bc)),
            Err(ValueError::Format(_))
        ));
        assert!(matches!(
            from_text(FieldKind::Date, b"0000-01-01"),
            Err(ValueError::Format(_))
        ));
    }

    #[test]
    fn date_parse_rejects_short_or_invalid_input() {
        assert!(from_text(FieldKind::Date, b"2024-01").is_err());
        assert!(from_text(FieldKind::Date, b"2024-13-01").is_err());
        assert!(from_text(FieldKind::Date, b"2024-1-01\x00x").is_err());
    }

    #[test]
    fn datetimes_round_trip_with_microseconds() {
        let d = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        for micros in [0, 1, 999_999] {
            let dt = d.and_hms_micro_opt(23, 59, 59, micros).unwrap();
            round_trip(FieldKind::DateTime, PlainValue::DateTime(dt));
        }
        let dt = d.and_hms_micro_opt(1, 2, 3, 4).unwrap();
        assert_eq!(
            to_text(FieldKind::DateTime, &PlainValue::DateTime(dt)).unwrap(),
            b"2024-12-31 01:02:03.000004"
        );
    }

    #[test]
    fn sub_microsecond_datetime_rejected() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_nano_opt(0, 0, 0, 1)
            .unwrap();
        assert!(matches!(
            to_text(FieldKind::DateTime, &PlainValue::DateTime(dt)),
            Err(ValueError::Format(_))
        ));
    }

    #[test]
    fn text_round_trips_utf8() {
        for s in ["", "this is a password!!", "пароль 密码 🔐", "tab\tand\nnewline"] {
            round_trip(FieldKind::Text, PlainValue::Text(s.into()));
        }
    }

    #[test]
    fn text_with_nul_rejected() {
        assert!(matches!(
            to_text(FieldKind::Text, &PlainValue::Text("a\0b".into())),
            Err(ValueError::Encoding(_))
        ));
    }

    #[test]
    fn invalid_utf8_rejected() {
        assert!(matches!(
            from_text(FieldKind::Text, b"ab\xff\xfe\x00zz"),
            Err(ValueError::Encoding(_))
        ));
    }

    #[test]
    fn validated_kinds_check_on_both_sides() {
        assert!(to_text(FieldKind::Email, &"test@example.com".into()).is_ok());
        assert!(matches!(
            to_text(FieldKind::Email, &"not-an-email".into()),
            Err(ValueError::Validation(_))
        ));
        assert!(matches!(
            from_text(FieldKind::UsSsn, b"000-12-3456\x00zz"),
            Err(ValueError::Validation(_))
        ));
    }

    #[test]
    fn mismatched_variant_rejected() {
        assert_eq!(
            to_text(FieldKind::Integer, &"12".into()),
            Err(ValueError::TypeMismatch {
                expected: "integer",
                found: "text"
            })
        );
        assert_eq!(
            to_text(FieldKind::Email, &PlainValue::Integer(1)),
            Err(ValueError::TypeMismatch {
                expected: "text",
                found: "integer"
            })
        );
    }

    #[test]
    fn parse_exact_rejects_trailing_input() {
        assert_eq!(
            parse_exact(FieldKind::Integer, "-17").unwrap(),
            PlainValue::Integer(-17)
        );
        assert!(parse_exact(FieldKind::Integer, "17 apples").is_err());
        assert!(parse_exact(FieldKind::Date, "2024-01-01T").is_err());
        assert_eq!(
            parse_exact(FieldKind::Text, "anything at all").unwrap(),
            PlainValue::Text("anything at all".into())
        );
    }
}
