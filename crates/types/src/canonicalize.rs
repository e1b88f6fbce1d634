use lazy_static::lazy_static;
use regex::Regex;

use crate::canonical::{CanonicalType, PhysicalType, TypeParams};
use crate::dialect::Dialect;
use crate::error::TypeError;

lazy_static! {
    static ref PARAMS_RE: Regex = Regex::new(r"\(([^)]+)\)").unwrap();
}

/// Extracted `(length, precision, scale, unbounded)` from a raw type string
/// such as `"nvarchar(100)"`, `"decimal(12,2)"`, or `"varchar(max)"`.
fn extract_params(raw: &str) -> (Option<i32>, Option<i32>, Option<i32>, bool) {
    let has_max = raw.contains("max");
    let Some(caps) = PARAMS_RE.captures(raw) else {
        return (None, None, None, has_max);
    };
    let inner = &caps[1];
    let parts: Vec<&str> = inner.split(',').map(|p| p.trim()).collect();
    match parts.as_slice() {
        [single] => match single.parse::<i32>() {
            Ok(n) => (Some(n), None, None, has_max),
            Err(_) => (None, None, None, has_max),
        },
        [p, s, ..] => match (p.parse::<i32>(), s.parse::<i32>()) {
            (Ok(p), Ok(s)) => (None, Some(p), Some(s), has_max),
            _ => (None, None, None, has_max),
        },
        _ => (None, None, None, has_max),
    }
}

fn any_contains(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn generic_fallback(t: &str, length: Option<i32>, prec: Option<i32>, scale: Option<i32>) -> PhysicalType {
    use CanonicalType::*;
    if any_contains(t, &["char", "text", "string"]) {
        return PhysicalType::new(String, length.map(TypeParams::length).unwrap_or(TypeParams::NONE));
    }
    if any_contains(t, &["numeric", "decimal", "number", "money", "bignumeric"]) {
        return PhysicalType::new(
            Decimal,
            match (prec, scale) {
                (Some(p), Some(s)) => TypeParams::decimal(p, s),
                _ => TypeParams::NONE,
            },
        );
    }
    if any_contains(t, &["double", "float", "real"]) {
        return PhysicalType::simple(Float);
    }
    if t.contains("bigint") {
        return PhysicalType::simple(BigInt);
    }
    if any_contains(t, &["int", "integer", "smallint", "tinyint", "mediumint"]) {
        return PhysicalType::simple(Integer);
    }
    if t.contains("boolean") || t.contains("bool") || t.trim() == "bit" {
        return PhysicalType::simple(Boolean);
    }
    if t.contains("uuid") || t.contains("uniqueidentifier") {
        return PhysicalType::simple(Uuid);
    }
    if any_contains(t, &["json", "variant", "super", "object", "array", "geography"]) {
        return PhysicalType::simple(Json);
    }
    if t.contains("date") && t.contains("time") {
        return PhysicalType::simple(Timestamp);
    }
    if t.starts_with("timestamp") || t.contains("datetime") {
        return PhysicalType::simple(Timestamp);
    }
    if t.trim() == "date" {
        return PhysicalType::simple(Date);
    }
    if t.starts_with("time") {
        return PhysicalType::simple(Time);
    }
    if any_contains(t, &["bytea", "binary", "varbinary", "blob", "image", "raw", "bytes"]) {
        return PhysicalType::simple(Binary);
    }
    PhysicalType::simple(String)
}

/// Canonicalizes a dialect-specific raw type name (optionally parameterized,
/// e.g. `"NUMBER(38,0)"`) into a `PhysicalType`.
///
/// Falls back to a family-heuristic match (`generic_fallback`) for any raw
/// spelling the per-dialect table doesn't special-case, so an unrecognized
/// but recognizably-stringy/numeric type never hard-errors.
pub fn canonicalize(dialect: Dialect, raw: &str) -> Result<PhysicalType, TypeError> {
    let t = raw.trim().to_ascii_lowercase();
    let (length, prec, scale, has_max) = extract_params(&t);
    use CanonicalType::*;

    let physical = match dialect {
        Dialect::Mssql => {
            if any_contains(&t, &["nvarchar", "varchar", "nchar", "char", "ntext", "text"]) {
                if has_max {
                    PhysicalType::simple(String)
                } else {
                    let l = if any_contains(&t, &["char", "varchar", "nvarchar"]) { length } else { None };
                    PhysicalType::new(String, l.map(TypeParams::length).unwrap_or(TypeParams::NONE))
                }
            } else if t == "bit" {
                PhysicalType::simple(Boolean)
            } else if t.contains("bigint") {
                PhysicalType::simple(BigInt)
            } else if any_contains(&t, &["tinyint", "smallint", "int"]) {
                PhysicalType::simple(Integer)
            } else if t == "money" {
                PhysicalType::new(Decimal, TypeParams::decimal(19, 4))
            } else if t == "smallmoney" {
                PhysicalType::new(Decimal, TypeParams::decimal(10, 4))
            } else if any_contains(&t, &["decimal", "numeric"]) {
                PhysicalType::new(Decimal, match (prec, scale) {
                    (Some(p), Some(s)) => TypeParams::decimal(p, s),
                    _ => TypeParams::NONE,
                })
            } else if t.contains("float") || t.contains("real") {
                PhysicalType::simple(Float)
            } else if any_contains(&t, &["datetime", "datetime2", "smalldatetime", "datetimeoffset", "timestamp"]) {
                PhysicalType::simple(Timestamp)
            } else if t == "date" {
                PhysicalType::simple(Date)
            } else if t.starts_with("time") {
                PhysicalType::simple(Time)
            } else if t.contains("uniqueidentifier") {
                PhysicalType::simple(Uuid)
            } else if any_contains(&t, &["varbinary", "binary", "image", "rowversion"]) {
                PhysicalType::simple(Binary)
            } else {
                generic_fallback(&t, length, prec, scale)
            }
        }
        Dialect::Postgres => {
            if any_contains(&t, &["character varying", "varchar", "char", "text"]) {
                let l = if any_contains(&t, &["char", "varchar", "character varying"]) { length } else { None };
                PhysicalType::new(String, l.map(TypeParams::length).unwrap_or(TypeParams::NONE))
            } else if t.contains("boolean") {
                PhysicalType::simple(Boolean)
            } else if t.contains("bigint") || t == "int8" {
                PhysicalType::simple(BigInt)
            } else if any_contains(&t, &["integer", "int4", "smallint", "int2"]) {
                PhysicalType::simple(Integer)
            } else if any_contains(&t, &["numeric", "decimal"]) {
                PhysicalType::new(Decimal, match (prec, scale) {
                    (Some(p), Some(s)) => TypeParams::decimal(p, s),
                    _ => TypeParams::NONE,
                })
            } else if any_contains(&t, &["double precision", "real", "float"]) {
                PhysicalType::simple(Float)
            } else if t.starts_with("timestamp") {
                PhysicalType::simple(Timestamp)
            } else if t == "date" {
                PhysicalType::simple(Date)
            } else if t.starts_with("time") {
                PhysicalType::simple(Time)
            } else if t.contains("uuid") {
                PhysicalType::simple(Uuid)
            } else if t.contains("bytea") {
                PhysicalType::simple(Binary)
            } else if t.contains("jsonb") || t == "json" {
                PhysicalType::simple(Json)
            } else {
                generic_fallback(&t, length, prec, scale)
            }
        }
        Dialect::Snowflake => {
            if any_contains(&t, &["varchar", "string", "char", "text"]) {
                let l = if length.is_some() && any_contains(&t, &["char", "varchar", "string"]) { length } else { None };
                PhysicalType::new(String, l.map(TypeParams::length).unwrap_or(TypeParams::NONE))
            } else if t.starts_with("number") || t.contains("decimal") || t.contains("numeric") {
                // NUMBER(38,0) is Snowflake's native integer representation;
                // treating it as DECIMAL(38,0) would manufacture false drift
                // against every integer-typed target column.
                if prec == Some(38) && (scale == Some(0) || scale.is_none()) {
                    PhysicalType::simple(Integer)
                } else {
                    PhysicalType::new(Decimal, match (prec, scale) {
                        (Some(p), Some(s)) => TypeParams::decimal(p, s),
                        _ => TypeParams::NONE,
                    })
                }
            } else if t.contains("bigint") {
                PhysicalType::simple(BigInt)
            } else if any_contains(&t, &["int", "integer", "smallint", "tinyint", "byteint"]) {
                PhysicalType::simple(Integer)
            } else if any_contains(&t, &["float", "double", "real"]) {
                PhysicalType::simple(Float)
            } else if t.contains("boolean") {
                PhysicalType::simple(Boolean)
            } else if t == "date" {
                PhysicalType::simple(Date)
            } else if t.starts_with("time") {
                PhysicalType::simple(Time)
            } else if t.starts_with("timestamp") {
                PhysicalType::simple(Timestamp)
            } else if any_contains(&t, &["variant", "object", "array"]) {
                PhysicalType::simple(Json)
            } else if t.contains("binary") {
                PhysicalType::simple(Binary)
            } else {
                generic_fallback(&t, length, prec, scale)
            }
        }
        Dialect::BigQuery => match t.as_str() {
            "string" => PhysicalType::simple(String),
            "bytes" => PhysicalType::simple(Binary),
            "int64" => PhysicalType::simple(Integer),
            "bignumeric" | "numeric" | "decimal" => PhysicalType::new(Decimal, match (prec, scale) {
                (Some(p), Some(s)) => TypeParams::decimal(p, s),
                _ => TypeParams::NONE,
            }),
            "float64" => PhysicalType::simple(Float),
            "bool" | "boolean" => PhysicalType::simple(Boolean),
            "date" => PhysicalType::simple(Date),
            "time" => PhysicalType::simple(Time),
            "datetime" | "timestamp" => PhysicalType::simple(Timestamp),
            "json" | "geography" => PhysicalType::simple(Json),
            _ => generic_fallback(&t, length, prec, scale),
        },
        Dialect::DuckDb => {
            if any_contains(&t, &["varchar", "char", "text"]) {
                let l = if length.is_some() && any_contains(&t, &["char", "varchar"]) { length } else { None };
                PhysicalType::new(String, l.map(TypeParams::length).unwrap_or(TypeParams::NONE))
            } else if t.contains("boolean") || t == "bool" {
                PhysicalType::simple(Boolean)
            } else if t.contains("bigint") || t == "hugeint" {
                PhysicalType::simple(BigInt)
            } else if any_contains(&t, &["integer", "int4", "smallint", "tinyint"]) {
                PhysicalType::simple(Integer)
            } else if any_contains(&t, &["decimal", "numeric"]) {
                PhysicalType::new(Decimal, match (prec, scale) {
                    (Some(p), Some(s)) => TypeParams::decimal(p, s),
                    _ => TypeParams::NONE,
                })
            } else if any_contains(&t, &["double", "float", "real"]) {
                PhysicalType::simple(Float)
            } else if t == "date" {
                PhysicalType::simple(Date)
            } else if t.starts_with("time") && !t.starts_with("timestamp") {
                PhysicalType::simple(Time)
            } else if t.starts_with("timestamp") {
                PhysicalType::simple(Timestamp)
            } else if t.contains("uuid") {
                PhysicalType::simple(Uuid)
            } else if any_contains(&t, &["blob", "binary", "bytes"]) {
                PhysicalType::simple(Binary)
            } else if t == "json" {
                PhysicalType::simple(Json)
            } else {
                generic_fallback(&t, length, prec, scale)
            }
        }
        // Fabric Warehouse canonicalizes UUID-ish text to STRING: Fabric has no
        // native UUID physical type and forbids VARCHAR(MAX), so treating it
        // any other way would manufacture unrenderable DDL downstream.
        Dialect::FabricWarehouse => {
            if any_contains(&t, &["varchar", "char", "text"]) {
                let l = if length.is_some() && any_contains(&t, &["char", "varchar"]) { length } else { None };
                PhysicalType::new(String, l.map(TypeParams::length).unwrap_or(TypeParams::NONE))
            } else if t == "bit" || t.contains("boolean") || t.contains("bool") {
                PhysicalType::simple(Boolean)
            } else if t.contains("bigint") {
                PhysicalType::simple(BigInt)
            } else if any_contains(&t, &["tinyint", "smallint", "int", "integer"]) {
                PhysicalType::simple(Integer)
            } else if any_contains(&t, &["decimal", "numeric"]) {
                PhysicalType::new(Decimal, match (prec, scale) {
                    (Some(p), Some(s)) => TypeParams::decimal(p, s),
                    _ => TypeParams::NONE,
                })
            } else if any_contains(&t, &["float", "double", "real"]) {
                PhysicalType::simple(Float)
            } else if t == "date" {
                PhysicalType::simple(Date)
            } else if t.starts_with("time") {
                PhysicalType::simple(Time)
            } else if any_contains(&t, &["datetime", "datetime2", "timestamp"]) {
                PhysicalType::simple(Timestamp)
            } else if any_contains(&t, &["binary", "varbinary", "image"]) {
                PhysicalType::simple(Binary)
            } else if t.contains("json") {
                PhysicalType::simple(Json)
            } else if t.contains("uuid") || t.contains("uniqueidentifier") {
                PhysicalType::simple(String)
            } else {
                generic_fallback(&t, length, prec, scale)
            }
        }
        // Databricks has no dedicated section in the source mapper; its SQL
        // type names (STRING/INT/BIGINT/DOUBLE/TIMESTAMP) already match the
        // generic heuristic closely enough to canonicalize correctly.
        Dialect::Databricks => generic_fallback(&t, length, prec, scale),
    };

    Ok(physical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_number_38_0_is_integer() {
        let p = canonicalize(Dialect::Snowflake, "NUMBER(38,0)").unwrap();
        assert_eq!(p.canonical, CanonicalType::Integer);
    }

    #[test]
    fn snowflake_number_with_scale_is_decimal() {
        let p = canonicalize(Dialect::Snowflake, "NUMBER(10,2)").unwrap();
        assert_eq!(p.canonical, CanonicalType::Decimal);
        assert_eq!(p.params.precision, Some(10));
        assert_eq!(p.params.scale, Some(2));
    }

    #[test]
    fn mssql_varchar_max_is_unbounded_string() {
        let p = canonicalize(Dialect::Mssql, "varchar(max)").unwrap();
        assert_eq!(p.canonical, CanonicalType::String);
        assert_eq!(p.params.length, None);
    }

    #[test]
    fn postgres_character_varying_with_length() {
        let p = canonicalize(Dialect::Postgres, "character varying(50)").unwrap();
        assert_eq!(p.canonical, CanonicalType::String);
        assert_eq!(p.params.length, Some(50));
    }

    #[test]
    fn bigquery_int64_is_integer() {
        let p = canonicalize(Dialect::BigQuery, "INT64").unwrap();
        assert_eq!(p.canonical, CanonicalType::Integer);
    }

    #[test]
    fn fabric_uuid_canonicalizes_to_string() {
        let p = canonicalize(Dialect::FabricWarehouse, "uniqueidentifier").unwrap();
        assert_eq!(p.canonical, CanonicalType::String);
    }

    #[test]
    fn databricks_falls_back_to_generic_heuristic() {
        let p = canonicalize(Dialect::Databricks, "BIGINT").unwrap();
        assert_eq!(p.canonical, CanonicalType::BigInt);
    }
}
