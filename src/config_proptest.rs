//! Property-based tests for configuration parsing.
//!
//! These tests use proptest to generate repository descriptors, dimension
//! names and section references, and verify that validation holds for all of
//! them.

#[cfg(test)]
mod proptest_tests {
    use crate::config::NomenclatureConfig;
    use crate::dimension::Dimension;
    use crate::error::Error;
    use crate::repository::{RawRepository, Repository};
    use proptest::prelude::*;

    fn pin_value() -> impl Strategy<Value = Option<String>> {
        prop::option::of("[a-z0-9.]{0,8}")
    }

    // ============================================================================
    // Repository descriptor property tests
    // ============================================================================

    proptest! {
        /// Property: a repository auto-updates iff it carries no pin
        #[test]
        fn auto_update_iff_no_pin(
            url in "https://[a-z]{1,10}\\.org/[a-z]{1,10}\\.git",
            hash in pin_value(),
            release in pin_value(),
        ) {
            let raw = RawRepository {
                url,
                hash: hash.clone(),
                release: release.clone(),
                local_path: None,
            };
            let hash_set = hash.is_some_and(|h| !h.is_empty());
            let release_set = release.is_some_and(|r| !r.is_empty());

            match Repository::from_raw("repo", raw) {
                Ok(repository) => {
                    prop_assert!(!(hash_set && release_set));
                    prop_assert_eq!(repository.has_auto_update(), !hash_set && !release_set);
                    prop_assert_eq!(repository.hash().is_some(), hash_set);
                    prop_assert_eq!(repository.release().is_some(), release_set);
                }
                Err(err) => {
                    prop_assert!(hash_set && release_set);
                    let is_conflicting_pins = matches!(err, Error::ConflictingPins { .. });
                    prop_assert!(is_conflicting_pins);
                }
            }
        }
    }

    // ============================================================================
    // Dimension property tests
    // ============================================================================

    proptest! {
        /// Property: only the five dimension names parse
        #[test]
        fn dimension_parse_accepts_only_known_names(value in "[a-z]{1,10}") {
            let known = Dimension::ALL.iter().any(|d| d.as_str() == value);
            prop_assert_eq!(value.parse::<Dimension>().is_ok(), known);
        }

        /// Property: any subset of dimensions is a valid `dimensions` list
        #[test]
        fn dimension_subsets_are_accepted(
            selection in prop::sample::subsequence(Dimension::ALL.to_vec(), 0..=5)
        ) {
            let names: Vec<&str> = selection.iter().map(|d| d.as_str()).collect();
            let yaml = format!("dimensions: [{}]", names.join(", "));
            let config = NomenclatureConfig::parse(&yaml).unwrap();
            prop_assert_eq!(config.dimensions(), Some(selection.as_slice()));
        }
    }

    // ============================================================================
    // Reference resolution property tests
    // ============================================================================

    proptest! {
        /// Property: an undeclared reference is always named in the error
        #[test]
        fn unknown_reference_is_reported(
            declared in prop::collection::btree_set("repo-[a-z]{3,8}", 0..4),
            missing in "missing-[a-z]{3,8}",
        ) {
            let mut yaml = String::from("repositories:\n");
            for name in &declared {
                yaml.push_str(&format!("  {}:\n    url: https://example.org/{}.git\n", name, name));
            }
            if declared.is_empty() {
                yaml = String::new();
            }
            let mut references: Vec<&str> = declared.iter().map(String::as_str).collect();
            references.push(&missing);
            yaml.push_str(&format!(
                "definitions:\n  variable:\n    repositories: [{}]\n",
                references.join(", ")
            ));

            let err = NomenclatureConfig::parse(&yaml).unwrap_err();
            prop_assert_eq!(
                err.to_string(),
                format!("Unknown repository {{'{}'}} in 'variable'", missing)
            );
        }
    }
}
