use serde::{Deserialize, Serialize};
use std::fmt;

/// Dialect-neutral type tokens. Every physical column, in any supported
/// dialect, canonicalizes to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CanonicalType {
    String,
    Integer,
    BigInt,
    Decimal,
    Float,
    Boolean,
    Date,
    Time,
    Timestamp,
    Binary,
    Uuid,
    Json,
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CanonicalType::String => "STRING",
            CanonicalType::Integer => "INTEGER",
            CanonicalType::BigInt => "BIGINT",
            CanonicalType::Decimal => "DECIMAL",
            CanonicalType::Float => "FLOAT",
            CanonicalType::Boolean => "BOOLEAN",
            CanonicalType::Date => "DATE",
            CanonicalType::Time => "TIME",
            CanonicalType::Timestamp => "TIMESTAMP",
            CanonicalType::Binary => "BINARY",
            CanonicalType::Uuid => "UUID",
            CanonicalType::Json => "JSON",
        };
        f.write_str(s)
    }
}

/// Optional length/precision/scale parameters alongside a `CanonicalType`.
///
/// For `String`/`Binary`, only `length` is meaningful. For `Decimal`, only
/// `precision`/`scale`. Other types ignore these fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeParams {
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    /// True for dialect spellings like `VARCHAR(MAX)` that have no numeric bound.
    pub unbounded: bool,
}

impl TypeParams {
    pub const NONE: TypeParams = TypeParams {
        length: None,
        precision: None,
        scale: None,
        unbounded: false,
    };

    pub fn length(length: i32) -> Self {
        Self {
            length: Some(length),
            ..Self::NONE
        }
    }

    pub fn decimal(precision: i32, scale: i32) -> Self {
        Self {
            precision: Some(precision),
            scale: Some(scale),
            ..Self::NONE
        }
    }
}

/// A fully-resolved physical type: a canonical token plus its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalType {
    pub canonical: CanonicalType,
    pub params: TypeParams,
}

impl PhysicalType {
    pub fn new(canonical: CanonicalType, params: TypeParams) -> Self {
        Self { canonical, params }
    }

    pub fn simple(canonical: CanonicalType) -> Self {
        Self::new(canonical, TypeParams::NONE)
    }
}
