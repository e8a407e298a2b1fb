//! Conversion from PostgreSQL wire values into `Value`
//!
//! Every cell goes through [`PgCell`], which decodes the binary payload by
//! type. Types without a readable rendering fail with a scan error naming
//! the type instead of leaking their binary form.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use postgres_types::{FromSql, Kind, Type};
use sqlxp_core::{Result, SqlxpError, Value};
use tokio_postgres::Row as PgRow;
use uuid::Uuid;

type FromSqlError = Box<dyn std::error::Error + Sync + Send>;

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

const RANGE_EMPTY: u8 = 0x01;
const RANGE_LB_INC: u8 = 0x02;
const RANGE_UB_INC: u8 = 0x04;
const RANGE_LB_INF: u8 = 0x08;
const RANGE_UB_INF: u8 = 0x10;

const PGSQL_AF_INET: u8 = 2;
const PGSQL_AF_INET6: u8 = 3;

const USECS_PER_SEC: u64 = 1_000_000;

/// Types whose binary form is their UTF-8 text
const TEXT_TYPES: &[&str] = &[
    "text", "varchar", "bpchar", "name", "unknown", "xml", "citext",
];

/// Types whose binary form is a bare object identifier
const OID_TYPES: &[&str] = &[
    "oid",
    "xid",
    "cid",
    "regproc",
    "regprocedure",
    "regoper",
    "regoperator",
    "regclass",
    "regtype",
    "regconfig",
    "regdictionary",
    "regnamespace",
    "regrole",
    "regcollation",
];

/// One decoded cell. NULL decodes to `Value::Null` for every type.
#[derive(Debug)]
pub(crate) struct PgCell(pub(crate) Value);

impl<'a> FromSql<'a> for PgCell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, FromSqlError> {
        decode(ty, raw).map(PgCell)
    }

    fn from_sql_null(_: &Type) -> std::result::Result<Self, FromSqlError> {
        Ok(PgCell(Value::Null))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

/// Convert PostgreSQL row value to our Value type
pub(crate) fn postgres_to_value(row: &PgRow, idx: usize) -> Result<Value> {
    row.try_get::<_, PgCell>(idx)
        .map(|cell| cell.0)
        .map_err(|e| {
            SqlxpError::Scan(format!(
                "column {} ({}): {}",
                idx,
                row.columns()[idx].type_().name(),
                e
            ))
        })
}

fn decode(ty: &Type, raw: &[u8]) -> std::result::Result<Value, FromSqlError> {
    match ty.kind() {
        Kind::Array(_) => {
            let items = Vec::<PgCell>::from_sql(ty, raw)?;
            return Ok(Value::Array(items.into_iter().map(|cell| cell.0).collect()));
        }
        Kind::Domain(base) => return decode(base, raw),
        Kind::Enum(_) => return Ok(Value::String(utf8(raw)?)),
        Kind::Range(subtype) => return Ok(Value::String(range_text(subtype, raw)?)),
        _ => {}
    }

    let name = ty.name();
    let value = match name {
        "bool" => Value::Bool(bool::from_sql(ty, raw)?),
        "int2" => Value::Int16(i16::from_sql(ty, raw)?),
        "int4" => Value::Int32(i32::from_sql(ty, raw)?),
        "int8" => Value::Int64(i64::from_sql(ty, raw)?),
        "float4" => Value::Float32(f32::from_sql(ty, raw)?),
        "float8" => Value::Float64(f64::from_sql(ty, raw)?),
        "numeric" => Value::Decimal(numeric_text(raw)?),
        "money" => Value::Decimal(money_text(raw)?),
        "xid8" => {
            let v = u64::from_be_bytes(raw.try_into()?);
            i64::try_from(v).map_or(Value::UInt64(v), Value::Int64)
        }
        "char" => Value::String(char_text(raw)?),
        "bytea" => Value::Bytes(raw.to_vec()),
        "uuid" => Value::Uuid(Uuid::from_sql(ty, raw)?),
        "json" | "jsonb" => Value::Json(serde_json::Value::from_sql(ty, raw)?),
        "date" => Value::Date(NaiveDate::from_sql(ty, raw)?),
        "time" => Value::Time(NaiveTime::from_sql(ty, raw)?),
        "timestamp" => Value::DateTime(NaiveDateTime::from_sql(ty, raw)?),
        "timestamptz" => Value::DateTimeUtc(DateTime::<Utc>::from_sql(ty, raw)?),
        "timetz" => Value::String(timetz_text(raw)?),
        "interval" => Value::String(interval_text(raw)?),
        "inet" => Value::String(inet_text(raw, false)?),
        "cidr" => Value::String(inet_text(raw, true)?),
        "macaddr" | "macaddr8" => Value::String(macaddr_text(raw)?),
        "bit" | "varbit" => Value::String(bit_text(raw)?),
        "void" => Value::Null,
        _ if TEXT_TYPES.contains(&name) => Value::String(utf8(raw)?),
        _ if OID_TYPES.contains(&name) => Value::Int64(u32::from_be_bytes(raw.try_into()?).into()),
        _ => return Err(format!("unsupported PostgreSQL type '{}'", name).into()),
    };

    Ok(value)
}

fn utf8(raw: &[u8]) -> std::result::Result<String, FromSqlError> {
    Ok(std::str::from_utf8(raw)?.to_string())
}

/// NUMERIC decoded to its exact text form, as `psql` would print it
fn numeric_text(raw: &[u8]) -> std::result::Result<String, FromSqlError> {
    if raw.len() < 8 {
        return Err("invalid NUMERIC payload: too short".into());
    }

    let ndigits = i16::from_be_bytes([raw[0], raw[1]]).max(0) as usize;
    let weight = i16::from_be_bytes([raw[2], raw[3]]);
    let sign = u16::from_be_bytes([raw[4], raw[5]]);
    let dscale = i16::from_be_bytes([raw[6], raw[7]]).max(0) as usize;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }

    if raw.len() < 8 + ndigits * 2 {
        return Err("invalid NUMERIC payload: truncated digits".into());
    }

    let mut digits = Vec::with_capacity(ndigits);
    for index in 0..ndigits {
        let offset = 8 + index * 2;
        let group = u16::from_be_bytes([raw[offset], raw[offset + 1]]);
        if group > 9999 {
            return Err("invalid NUMERIC payload: group out of range".into());
        }
        digits.push(group);
    }

    // Each group holds four decimal digits; `weight` is the power of
    // 10000 of the first group.
    let integer_group_count = if weight >= 0 { weight as usize + 1 } else { 0 };

    let mut integer_text = String::new();
    for group_index in 0..integer_group_count {
        let group = digits.get(group_index).copied().unwrap_or(0);
        if group_index == 0 {
            integer_text.push_str(&group.to_string());
        } else {
            integer_text.push_str(&format!("{group:04}"));
        }
    }
    if integer_text.is_empty() {
        integer_text.push('0');
    }

    let mut fraction_text = String::new();
    if dscale > 0 {
        if weight < -1 {
            let skipped = (-(weight as i32) - 1) as usize;
            fraction_text.push_str(&"0000".repeat(skipped));
        }
        for group in digits.iter().skip(integer_group_count) {
            fraction_text.push_str(&format!("{group:04}"));
        }
        if fraction_text.len() < dscale {
            fraction_text.push_str(&"0".repeat(dscale - fraction_text.len()));
        } else {
            fraction_text.truncate(dscale);
        }
    }

    let is_zero = integer_text.bytes().all(|b| b == b'0')
        && fraction_text.bytes().all(|b| b == b'0');

    let mut output = String::new();
    if sign == NUMERIC_NEG && !is_zero {
        output.push('-');
    }
    output.push_str(&integer_text);
    if !fraction_text.is_empty() {
        output.push('.');
        output.push_str(&fraction_text);
    }

    Ok(output)
}

/// MONEY is a count of cents; the locale's currency symbol is left out.
fn money_text(raw: &[u8]) -> std::result::Result<String, FromSqlError> {
    let cents = i64::from_be_bytes(raw.try_into()?);
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    Ok(format!("{}{}.{:02}", sign, cents / 100, cents % 100))
}

/// The single-byte `"char"` type
fn char_text(raw: &[u8]) -> std::result::Result<String, FromSqlError> {
    match raw {
        [] => Ok(String::new()),
        [byte] => Ok(char::from(*byte).to_string()),
        _ => Err("invalid \"char\" payload".into()),
    }
}

/// `HH:MM:SS` with trailing zeros of the fraction trimmed. Hours may exceed 24.
fn clock_text(micros: u64) -> String {
    let seconds = micros / USECS_PER_SEC;
    let fraction = micros % USECS_PER_SEC;
    let mut out = format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds / 60 % 60,
        seconds % 60
    );
    if fraction != 0 {
        let digits = format!("{:06}", fraction);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// INTERVAL in the server's default `postgres` interval style
fn interval_text(raw: &[u8]) -> std::result::Result<String, FromSqlError> {
    if raw.len() != 16 {
        return Err("invalid INTERVAL payload".into());
    }
    let micros = i64::from_be_bytes(raw[0..8].try_into()?);
    let days = i32::from_be_bytes(raw[8..12].try_into()?);
    let months = i32::from_be_bytes(raw[12..16].try_into()?);

    let mut out = String::new();
    let mut is_before = false;
    for (value, unit) in [(months / 12, "year"), (months % 12, "mon"), (days, "day")] {
        if value == 0 {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        let plus = if is_before && value > 0 { "+" } else { "" };
        let plural = if value != 1 { "s" } else { "" };
        out.push_str(&format!("{}{} {}{}", plus, value, unit, plural));
        is_before = value < 0;
    }

    if out.is_empty() || micros != 0 {
        let sign = if micros < 0 {
            "-"
        } else if is_before {
            "+"
        } else {
            ""
        };
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(sign);
        out.push_str(&clock_text(micros.unsigned_abs()));
    }
    Ok(out)
}

/// TIMETZ carries the zone as seconds west of UTC.
fn timetz_text(raw: &[u8]) -> std::result::Result<String, FromSqlError> {
    if raw.len() != 12 {
        return Err("invalid TIMETZ payload".into());
    }
    let micros = i64::from_be_bytes(raw[0..8].try_into()?);
    let offset = -i32::from_be_bytes(raw[8..12].try_into()?);

    let mut out = clock_text(micros.unsigned_abs());
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.unsigned_abs();
    out.push_str(&format!("{}{:02}", sign, offset / 3600));
    if offset % 3600 != 0 {
        out.push_str(&format!(":{:02}", offset / 60 % 60));
    }
    if offset % 60 != 0 {
        out.push_str(&format!(":{:02}", offset % 60));
    }
    Ok(out)
}

/// INET omits a full-length netmask; CIDR always shows it.
fn inet_text(raw: &[u8], is_cidr: bool) -> std::result::Result<String, FromSqlError> {
    let [family, bits, _, len, address @ ..] = raw else {
        return Err("invalid INET payload".into());
    };
    if address.len() != usize::from(*len) {
        return Err("invalid INET payload: truncated address".into());
    }

    let (text, max_bits) = match *family {
        PGSQL_AF_INET => {
            let mut octets = [0u8; 4];
            octets
                .get_mut(..address.len())
                .ok_or("invalid INET payload: address too long")?
                .copy_from_slice(address);
            (Ipv4Addr::from(octets).to_string(), 32)
        }
        PGSQL_AF_INET6 => {
            let mut octets = [0u8; 16];
            octets
                .get_mut(..address.len())
                .ok_or("invalid INET payload: address too long")?
                .copy_from_slice(address);
            (Ipv6Addr::from(octets).to_string(), 128)
        }
        other => return Err(format!("invalid INET payload: address family {}", other).into()),
    };

    if is_cidr || *bits != max_bits {
        Ok(format!("{}/{}", text, bits))
    } else {
        Ok(text)
    }
}

fn macaddr_text(raw: &[u8]) -> std::result::Result<String, FromSqlError> {
    if raw.len() != 6 && raw.len() != 8 {
        return Err("invalid MACADDR payload".into());
    }
    Ok(raw
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<Vec<_>>()
        .join(":"))
}

/// BIT and VARBIT: a bit count followed by the bits, most significant first.
fn bit_text(raw: &[u8]) -> std::result::Result<String, FromSqlError> {
    if raw.len() < 4 {
        return Err("invalid BIT payload".into());
    }
    let count = usize::try_from(i32::from_be_bytes(raw[0..4].try_into()?))?;
    let bits = &raw[4..];
    if bits.len() * 8 < count {
        return Err("invalid BIT payload: truncated".into());
    }
    Ok((0..count)
        .map(|i| if bits[i / 8] & (0x80 >> (i % 8)) != 0 { '1' } else { '0' })
        .collect())
}

/// Ranges render like `[1,10)`, with bounds decoded by their element type.
fn range_text(subtype: &Type, raw: &[u8]) -> std::result::Result<String, FromSqlError> {
    let Some((&flags, mut rest)) = raw.split_first() else {
        return Err("invalid range payload".into());
    };
    if flags & RANGE_EMPTY != 0 {
        return Ok("empty".to_string());
    }

    let lower = if flags & RANGE_LB_INF == 0 {
        decode(subtype, take_bound(&mut rest)?)?.to_string()
    } else {
        String::new()
    };
    let upper = if flags & RANGE_UB_INF == 0 {
        decode(subtype, take_bound(&mut rest)?)?.to_string()
    } else {
        String::new()
    };

    let open = if flags & RANGE_LB_INC != 0 { '[' } else { '(' };
    let close = if flags & RANGE_UB_INC != 0 { ']' } else { ')' };
    Ok(format!("{}{},{}{}", open, lower, upper, close))
}

fn take_bound<'a>(rest: &mut &'a [u8]) -> std::result::Result<&'a [u8], FromSqlError> {
    let current: &'a [u8] = *rest;
    if current.len() < 4 {
        return Err("invalid range payload: truncated bound".into());
    }
    let len = usize::try_from(i32::from_be_bytes(current[0..4].try_into()?))?;
    let value = current
        .get(4..4 + len)
        .ok_or("invalid range payload: truncated bound")?;
    *rest = &current[4 + len..];
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numeric(weight: i16, sign: u16, dscale: i16, digits: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&(digits.len() as i16).to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for digit in digits {
            raw.extend_from_slice(&digit.to_be_bytes());
        }
        raw
    }

    fn parse(weight: i16, sign: u16, dscale: i16, digits: &[u16]) -> String {
        numeric_text(&numeric(weight, sign, dscale, digits)).unwrap()
    }

    #[test]
    fn test_numeric_integer_and_fraction() {
        assert_eq!(parse(0, 0, 2, &[123, 4500]), "123.45");
        assert_eq!(parse(1, 0, 0, &[1]), "10000");
        assert_eq!(parse(1, 0, 0, &[12, 3456]), "123456");
    }

    #[test]
    fn test_numeric_keeps_display_scale() {
        assert_eq!(parse(0, 0, 2, &[1, 5000]), "1.50");
        assert_eq!(parse(0, 0, 2, &[]), "0.00");
        assert_eq!(parse(0, 0, 0, &[]), "0");
    }

    #[test]
    fn test_numeric_small_magnitudes() {
        assert_eq!(parse(-1, NUMERIC_NEG, 1, &[5000]), "-0.5");
        assert_eq!(parse(-2, 0, 8, &[1]), "0.00000001");
        assert_eq!(parse(-1, 0, 4, &[1]), "0.0001");
    }

    #[test]
    fn test_numeric_special_values() {
        assert_eq!(parse(0, NUMERIC_NAN, 0, &[]), "NaN");
        assert_eq!(parse(0, NUMERIC_PINF, 0, &[]), "Infinity");
        assert_eq!(parse(0, NUMERIC_NINF, 0, &[]), "-Infinity");
        assert_eq!(parse(0, NUMERIC_NEG, 1, &[]), "0.0");
    }

    #[test]
    fn test_numeric_rejects_bad_payloads() {
        assert!(numeric_text(&[0, 1]).is_err());
        let mut truncated = numeric(0, 0, 0, &[1, 2]);
        truncated.truncate(10);
        assert!(numeric_text(&truncated).is_err());
        assert!(numeric_text(&numeric(0, 0, 0, &[10000])).is_err());
    }

    fn interval(micros: i64, days: i32, months: i32) -> Vec<u8> {
        let mut raw = micros.to_be_bytes().to_vec();
        raw.extend_from_slice(&days.to_be_bytes());
        raw.extend_from_slice(&months.to_be_bytes());
        raw
    }

    /// One-dimensional array payload; `None` elements are NULL.
    fn array_payload(element: &Type, items: &[Option<Vec<u8>>]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1i32.to_be_bytes());
        raw.extend_from_slice(&i32::from(items.iter().any(Option::is_none)).to_be_bytes());
        raw.extend_from_slice(&element.oid().to_be_bytes());
        raw.extend_from_slice(&(items.len() as i32).to_be_bytes());
        raw.extend_from_slice(&1i32.to_be_bytes());
        for item in items {
            match item {
                Some(bytes) => {
                    raw.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                    raw.extend_from_slice(bytes);
                }
                None => raw.extend_from_slice(&(-1i32).to_be_bytes()),
            }
        }
        raw
    }

    fn text(ty: &Type, raw: &[u8]) -> String {
        match decode(ty, raw).unwrap() {
            Value::String(text) | Value::Decimal(text) => text,
            other => panic!("expected text, got {other:?}"),
        }
    }

    const HOUR: i64 = 3_600_000_000;

    #[test]
    fn test_interval_text() {
        let cases = [
            (interval(0, 1, 0), "1 day"),
            (interval(0, 0, 0), "00:00:00"),
            (
                interval(4 * HOUR + 306_789_000, 3, 14),
                "1 year 2 mons 3 days 04:05:06.789",
            ),
            (interval(4 * HOUR, -1, 0), "-1 days +04:00:00"),
            (interval(-4 * HOUR, 0, 0), "-04:00:00"),
            (interval(25 * HOUR, 0, -24), "-2 years +25:00:00"),
        ];
        for (raw, expected) in cases {
            assert_eq!(text(&Type::INTERVAL, &raw), expected);
        }
        assert!(decode(&Type::INTERVAL, &[0; 8]).is_err());
    }

    #[test]
    fn test_timetz_text() {
        let at = |micros: i64, zone: i32| {
            let mut raw = micros.to_be_bytes().to_vec();
            raw.extend_from_slice(&zone.to_be_bytes());
            text(&Type::TIMETZ, &raw)
        };
        let afternoon = 14 * HOUR + 5 * 60_000_000;
        assert_eq!(at(afternoon, -7200), "14:05:00+02");
        assert_eq!(at(afternoon, -19800), "14:05:00+05:30");
        assert_eq!(at(afternoon + 500_000, 18000), "14:05:00.5-05");
    }

    #[test]
    fn test_network_addresses() {
        assert_eq!(text(&Type::INET, &[2, 32, 0, 4, 192, 168, 0, 1]), "192.168.0.1");
        assert_eq!(text(&Type::INET, &[2, 24, 0, 4, 192, 168, 0, 1]), "192.168.0.1/24");
        assert_eq!(text(&Type::CIDR, &[2, 24, 1, 4, 10, 1, 2, 0]), "10.1.2.0/24");

        let mut loopback = vec![3, 128, 0, 16];
        loopback.extend_from_slice(&[0; 15]);
        loopback.push(1);
        assert_eq!(text(&Type::INET, &loopback), "::1");

        assert!(decode(&Type::INET, &[2, 32, 0, 4, 192]).is_err());
        assert_eq!(
            text(&Type::MACADDR, &[0x08, 0x00, 0x2b, 0x01, 0x02, 0x03]),
            "08:00:2b:01:02:03"
        );
    }

    #[test]
    fn test_money_and_bit_strings() {
        assert_eq!(text(&Type::MONEY, &12345i64.to_be_bytes()), "123.45");
        assert_eq!(text(&Type::MONEY, &(-5i64).to_be_bytes()), "-0.05");

        let mut bits = 4i32.to_be_bytes().to_vec();
        bits.push(0b1010_0000);
        assert_eq!(text(&Type::BIT, &bits), "1010");
        assert_eq!(text(&Type::VARBIT, &0i32.to_be_bytes()), "");
    }

    #[test]
    fn test_range_text() {
        let mut bounded = vec![RANGE_LB_INC];
        for bound in [1i32, 10] {
            bounded.extend_from_slice(&4i32.to_be_bytes());
            bounded.extend_from_slice(&bound.to_be_bytes());
        }
        assert_eq!(text(&Type::INT4_RANGE, &bounded), "[1,10)");

        let mut unbounded = vec![RANGE_LB_INF | RANGE_UB_INC];
        unbounded.extend_from_slice(&4i32.to_be_bytes());
        unbounded.extend_from_slice(&10i32.to_be_bytes());
        assert_eq!(text(&Type::INT4_RANGE, &unbounded), "(,10]");

        assert_eq!(text(&Type::INT4_RANGE, &[RANGE_EMPTY]), "empty");
    }

    #[test]
    fn test_temporal_and_json_arrays() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let days = 8834i32.to_be_bytes().to_vec();
        let raw = array_payload(&Type::DATE, &[Some(days), None]);
        assert_eq!(
            decode(&Type::DATE_ARRAY, &raw).unwrap(),
            Value::Array(vec![Value::Date(day), Value::Null])
        );

        let micros = 8834 * 24 * HOUR + 14 * HOUR + 5 * 60_000_000;
        let raw = array_payload(&Type::TIMESTAMP, &[Some(micros.to_be_bytes().to_vec())]);
        let at = day.and_hms_opt(14, 5, 0).unwrap();
        assert_eq!(
            decode(&Type::TIMESTAMP_ARRAY, &raw).unwrap(),
            Value::Array(vec![Value::DateTime(at)])
        );

        let mut document = vec![1u8];
        document.extend_from_slice(br#"{"a":1}"#);
        let raw = array_payload(&Type::JSONB, &[Some(document)]);
        assert_eq!(
            decode(&Type::JSONB_ARRAY, &raw).unwrap(),
            Value::Array(vec![Value::Json(serde_json::json!({"a": 1}))])
        );
    }

    #[test]
    fn test_custom_types() {
        let mood = Type::new(
            "mood".to_string(),
            90_001,
            Kind::Enum(vec!["happy".to_string(), "sad".to_string()]),
            "public".to_string(),
        );
        assert_eq!(decode(&mood, b"happy").unwrap(), Value::String("happy".into()));

        let positive = Type::new(
            "positive".to_string(),
            90_002,
            Kind::Domain(Type::INT4),
            "public".to_string(),
        );
        assert_eq!(decode(&positive, &7i32.to_be_bytes()).unwrap(), Value::Int32(7));

        assert_eq!(
            decode(&Type::REGCLASS, &1259u32.to_be_bytes()).unwrap(),
            Value::Int64(1259)
        );
        assert_eq!(decode(&Type::XML, b"<a/>").unwrap(), Value::String("<a/>".into()));
        assert_eq!(decode(&Type::VOID, &[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_unreadable_types_are_rejected() {
        let err = decode(&Type::TS_VECTOR, &[0, 0, 0, 0]).unwrap_err();
        assert_eq!(err.to_string(), "unsupported PostgreSQL type 'tsvector'");
        assert!(decode(&Type::POINT, &[0; 16]).is_err());
    }

    #[test]
    fn test_cell_decodes_null_for_any_type() {
        assert!(<PgCell as FromSql>::accepts(&Type::TS_VECTOR));
        let cell = <PgCell as FromSql>::from_sql_nullable(&Type::INTERVAL, None).unwrap();
        assert_eq!(cell.0, Value::Null);
    }
}
