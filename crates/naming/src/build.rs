use crate::error::NameError;
use crate::sanitize::sanitize;
use crate::validate::validate_with_context;

/// Joins already-meaningful name parts with `_`, sanitizing and validating
/// each part independently before combining, then validating the whole.
pub fn build_physical_name(parts: &[&str]) -> Result<String, NameError> {
    let joined = parts
        .iter()
        .map(|p| sanitize(p))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    validate_with_context(&joined, "physical_name")?;
    Ok(joined)
}

/// `base + "_hist"`, the name of a dataset's SCD2 history table.
pub fn build_hist_name(base: &str) -> String {
    format!("{base}_hist")
}

/// `sanitize(base) + "_key"`, the name of a dataset's surrogate key column.
pub fn build_surrogate_key_name(base: &str) -> String {
    format!("{}_key", sanitize(base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_physical_name_from_prefix_short_and_base() {
        assert_eq!(
            build_physical_name(&["raw", "crm", "Kunden Auftrag"]).unwrap(),
            "raw_crm_kunden_auftrag"
        );
    }

    #[test]
    fn hist_name_appends_suffix() {
        assert_eq!(build_hist_name("bizcore_orders"), "bizcore_orders_hist");
    }

    #[test]
    fn surrogate_key_name_sanitizes_then_appends_suffix() {
        assert_eq!(
            build_surrogate_key_name("Kunden Auftrag"),
            "kunden_auftrag_key"
        );
    }
}
