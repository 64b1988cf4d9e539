//! Collection identifiers and titles derived from layer names.

use crate::errors::{FeaturesError, Result};

/// Highest numeric suffix a collection id may carry.
pub const MAX_ID_SUFFIX: u32 = 99;

/// Lowercase kebab-case form of `name`.
///
/// Runs of whitespace, `_`, `-` and other punctuation (except `.`) become a
/// single `-`; leading and trailing separators are dropped.
pub fn to_kebab(name: &str) -> String {
    name.split(|c: char| !(c.is_alphanumeric() || c == '.'))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Base collection id for a layer: the kebab form of the name after its
/// first `.` (which drops a PostGIS schema prefix).
pub fn base_id_for_layer(layer_name: &str) -> String {
    let table = layer_name
        .split_once('.')
        .map(|(_, rest)| rest)
        .unwrap_or(layer_name);
    to_kebab(table)
}

/// Human title for an id: words capitalised and joined with spaces.
pub fn title_from_id(id: &str) -> String {
    id.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pick a free id for `base` given the ids already in use.
///
/// `base` itself when free; otherwise `base-NN` where `NN` is one more than
/// the largest numeric suffix already taken, zero padded to two digits.
pub fn allocate_collection_id<S: AsRef<str>>(base: &str, existing: &[S]) -> Result<String> {
    if base.is_empty() {
        return Err(FeaturesError::InvalidParameter(
            "layer name does not produce a usable collection id".to_string(),
        ));
    }
    if !existing.iter().any(|id| id.as_ref() == base) {
        return Ok(base.to_string());
    }

    let prefix = format!("{}-", base);
    let max_suffix = existing
        .iter()
        .filter_map(|id| id.as_ref().strip_prefix(&prefix))
        .filter_map(leading_number)
        .max();

    let next = match max_suffix {
        Some(n) => n.checked_add(1),
        None => Some(1),
    };
    let next = match next {
        Some(next) if next <= u64::from(MAX_ID_SUFFIX) => next,
        _ => {
            return Err(FeaturesError::Conflict(format!(
                "Too many collections with the same base id {}",
                base
            )))
        }
    };
    Ok(format!("{}-{:02}", base, next))
}

fn leading_number(suffix: &str) -> Option<u64> {
    let digits: String = suffix.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_kebab() {
        assert_eq!(to_kebab("Road Network"), "road-network");
        assert_eq!(to_kebab("rivers__main--2023"), "rivers-main-2023");
        assert_eq!(to_kebab("  Lakes "), "lakes");
        assert_eq!(to_kebab("LAKES_v1.2"), "lakes-v1.2");
    }

    #[test]
    fn test_base_id_strips_schema() {
        assert_eq!(base_id_for_layer("public.Road_Network"), "road-network");
        assert_eq!(base_id_for_layer("buildings"), "buildings");
    }

    #[test]
    fn test_title_from_id() {
        assert_eq!(title_from_id("road-network"), "Road Network");
        assert_eq!(title_from_id("lakes-01"), "Lakes 01");
    }

    #[test]
    fn test_allocate_free_base() {
        let existing: Vec<String> = vec!["rivers".into()];
        assert_eq!(allocate_collection_id("lakes", &existing).unwrap(), "lakes");
    }

    #[test]
    fn test_allocate_suffixes() {
        let mut existing = vec!["lakes".to_string()];
        assert_eq!(allocate_collection_id("lakes", &existing).unwrap(), "lakes-01");

        existing.push("lakes-01".to_string());
        existing.push("lakes-07".to_string());
        existing.push("lakes-shore".to_string());
        assert_eq!(allocate_collection_id("lakes", &existing).unwrap(), "lakes-08");
    }

    #[test]
    fn test_allocate_exhausted() {
        let existing = vec!["lakes".to_string(), "lakes-99".to_string()];
        let err = allocate_collection_id("lakes", &existing).unwrap_err();
        assert!(err.to_string().contains("Too many collections"));
    }

    #[test]
    fn test_allocate_huge_suffix_conflicts() {
        let existing = vec!["lakes".to_string(), "lakes-18446744073709551615".to_string()];
        let err = allocate_collection_id("lakes", &existing).unwrap_err();
        assert!(matches!(err, FeaturesError::Conflict(_)));

        // Too long for u64 at all; ignored like any other non-numeric suffix.
        let existing = vec!["lakes".to_string(), "lakes-99999999999999999999999".to_string()];
        assert_eq!(allocate_collection_id("lakes", &existing).unwrap(), "lakes-01");
    }
}
