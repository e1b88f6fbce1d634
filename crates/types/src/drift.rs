use serde::{Deserialize, Serialize};

use crate::canonical::{CanonicalType, PhysicalType};

/// Classification of a desired-vs-actual physical type comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    /// No evolution needed.
    Equivalent,
    /// Actual must grow to accommodate desired; always safe to apply.
    Widening,
    /// Actual must shrink, or precision/scale must drop; may lose data.
    Narrowing,
    /// No safe evolution path exists between the two families.
    Incompatible,
    /// The pairing isn't meaningfully comparable (e.g. UUID vs STRING,
    /// deployment-dependent — see `elevata-types` Open Question (c)).
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftClassification {
    pub kind: DriftKind,
    pub reason: String,
}

impl DriftClassification {
    fn new(kind: DriftKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Compares a `desired` physical type (what the target column declares)
/// against an `actual` physical type (what's really in the warehouse) and
/// classifies the gap.
pub fn classify_drift(desired: &PhysicalType, actual: &PhysicalType) -> DriftClassification {
    use CanonicalType::*;
    use DriftKind::*;

    if desired == actual {
        return DriftClassification::new(Equivalent, "identical canonical type and parameters");
    }

    if desired.canonical == actual.canonical {
        return classify_same_family_drift(desired, actual);
    }

    match (desired.canonical, actual.canonical) {
        (Timestamp, Date) => DriftClassification::new(
            Widening,
            "DATE actual widens to TIMESTAMP desired without data loss",
        ),
        (Date, Timestamp) => DriftClassification::new(
            Narrowing,
            "TIMESTAMP actual narrows to DATE desired, dropping the time-of-day component",
        ),
        (Float, Decimal) => DriftClassification::new(
            Widening,
            "DECIMAL actual widens to FLOAT desired; binary floating point may lose precision",
        ),
        (Decimal, Float) => DriftClassification::new(
            Incompatible,
            "FLOAT actual cannot be safely represented as DECIMAL desired",
        ),
        (Uuid, String) | (String, Uuid) => DriftClassification::new(
            Unknown,
            "UUID/STRING comparability depends on whether the target dialect has a native UUID type",
        ),
        (BigInt, Integer) => DriftClassification::new(
            Widening,
            "INTEGER actual widens to BIGINT desired",
        ),
        (Integer, BigInt) => DriftClassification::new(
            Narrowing,
            "BIGINT actual narrows to INTEGER desired; large values may overflow",
        ),
        _ => DriftClassification::new(
            Incompatible,
            format!(
                "no evolution path from {} actual to {} desired",
                actual.canonical, desired.canonical
            ),
        ),
    }
}

fn classify_same_family_drift(desired: &PhysicalType, actual: &PhysicalType) -> DriftClassification {
    use CanonicalType::*;
    use DriftKind::*;

    match desired.canonical {
        String | Binary => {
            let d_len = desired.params.length;
            let a_len = actual.params.length;
            let a_unbounded = actual.params.unbounded || a_len.is_none();
            let d_unbounded = desired.params.unbounded || d_len.is_none();

            match (d_len, a_len, d_unbounded, a_unbounded) {
                (_, _, true, true) => DriftClassification::new(Equivalent, "both sides unbounded"),
                (_, _, _, true) => DriftClassification::new(
                    Equivalent,
                    "actual is already unbounded and accommodates any desired length",
                ),
                (_, _, true, false) => {
                    DriftClassification::new(Widening, "desired is unbounded, actual has a fixed length")
                }
                (Some(d), Some(a), false, false) if d == a => {
                    DriftClassification::new(Equivalent, "identical length")
                }
                (Some(d), Some(a), false, false) if d > a => {
                    DriftClassification::new(Widening, format!("actual length {a} grows to desired length {d}"))
                }
                (Some(d), Some(a), false, false) => {
                    DriftClassification::new(Narrowing, format!("actual length {a} shrinks to desired length {d}"))
                }
                _ => DriftClassification::new(Equivalent, "length unspecified on both sides"),
            }
        }
        Decimal => {
            match (desired.params.precision, desired.params.scale, actual.params.precision, actual.params.scale) {
                (None, None, None, None) => {
                    DriftClassification::new(Equivalent, "missing precision/scale on both sides")
                }
                (Some(dp), Some(ds), Some(ap), Some(as_)) => {
                    if dp == ap && ds == as_ {
                        DriftClassification::new(Equivalent, "identical precision and scale")
                    } else if dp >= ap && ds >= as_ {
                        DriftClassification::new(
                            Widening,
                            format!("DECIMAL({ap},{as_}) actual widens to DECIMAL({dp},{ds}) desired"),
                        )
                    } else if dp <= ap && ds <= as_ {
                        DriftClassification::new(
                            Narrowing,
                            format!("DECIMAL({ap},{as_}) actual narrows to DECIMAL({dp},{ds}) desired"),
                        )
                    } else {
                        DriftClassification::new(
                            Incompatible,
                            format!("DECIMAL({ap},{as_}) actual and DECIMAL({dp},{ds}) desired move in different directions"),
                        )
                    }
                }
                _ => DriftClassification::new(
                    Unknown,
                    "precision/scale present on only one side",
                ),
            }
        }
        _ => DriftClassification::new(Equivalent, "identical canonical type, no comparable parameters"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{PhysicalType, TypeParams};

    #[test]
    fn identical_types_are_equivalent() {
        let a = PhysicalType::new(CanonicalType::String, TypeParams::length(50));
        assert_eq!(classify_drift(&a, &a).kind, DriftKind::Equivalent);
    }

    #[test]
    fn string_widens_when_actual_is_shorter() {
        let desired = PhysicalType::new(CanonicalType::String, TypeParams::length(100));
        let actual = PhysicalType::new(CanonicalType::String, TypeParams::length(50));
        assert_eq!(classify_drift(&desired, &actual).kind, DriftKind::Widening);
    }

    #[test]
    fn string_narrows_when_actual_is_longer() {
        let desired = PhysicalType::new(CanonicalType::String, TypeParams::length(50));
        let actual = PhysicalType::new(CanonicalType::String, TypeParams::length(100));
        assert_eq!(classify_drift(&desired, &actual).kind, DriftKind::Narrowing);
    }

    #[test]
    fn date_to_timestamp_widens() {
        let desired = PhysicalType::simple(CanonicalType::Timestamp);
        let actual = PhysicalType::simple(CanonicalType::Date);
        assert_eq!(classify_drift(&desired, &actual).kind, DriftKind::Widening);
    }

    #[test]
    fn timestamp_to_date_narrows() {
        let desired = PhysicalType::simple(CanonicalType::Date);
        let actual = PhysicalType::simple(CanonicalType::Timestamp);
        assert_eq!(classify_drift(&desired, &actual).kind, DriftKind::Narrowing);
    }

    #[test]
    fn decimal_missing_params_both_sides_is_equivalent() {
        let desired = PhysicalType::simple(CanonicalType::Decimal);
        let actual = PhysicalType::simple(CanonicalType::Decimal);
        assert_eq!(classify_drift(&desired, &actual).kind, DriftKind::Equivalent);
    }

    #[test]
    fn decimal_to_float_is_widening_but_lossy() {
        let desired = PhysicalType::simple(CanonicalType::Float);
        let actual = PhysicalType::new(CanonicalType::Decimal, TypeParams::decimal(10, 2));
        assert_eq!(classify_drift(&desired, &actual).kind, DriftKind::Widening);
    }

    #[test]
    fn float_to_decimal_is_incompatible() {
        let desired = PhysicalType::new(CanonicalType::Decimal, TypeParams::decimal(10, 2));
        let actual = PhysicalType::simple(CanonicalType::Float);
        assert_eq!(classify_drift(&desired, &actual).kind, DriftKind::Incompatible);
    }
}
