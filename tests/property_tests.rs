//! Property-Based Tests for the launcher
//!
//! Uses proptest for testing invariants and edge cases
//!
//! These tests verify:
//! - Enum string round-trips (parse → to_string → parse)
//! - Manifest parser robustness on arbitrary input
//! - Name normalization invariants

use proptest::prelude::*;

// =============================================================================
// InstallMode Enum Property Tests
// =============================================================================

use dra_launcher::types::InstallMode;

/// Strategy for generating valid InstallMode variants
fn install_mode_strategy() -> impl Strategy<Value = InstallMode> {
    prop_oneof![
        Just(InstallMode::Auto),
        Just(InstallMode::Always),
        Just(InstallMode::Never),
    ]
}

proptest! {
    /// InstallMode: to_string → parse round-trip is identity
    #[test]
    fn install_mode_roundtrip(mode in install_mode_strategy()) {
        let s = mode.to_string();
        let parsed: InstallMode = s.parse().expect("Should parse");
        prop_assert_eq!(mode, parsed);
    }

    /// InstallMode: Display output is non-empty lowercase
    #[test]
    fn install_mode_display_is_valid(mode in install_mode_strategy()) {
        let s = mode.to_string();
        prop_assert!(!s.is_empty());
        let lowercase = s.to_lowercase();
        prop_assert_eq!(s, lowercase);
    }
}

// =============================================================================
// Manifest Parser Property Tests
// =============================================================================

use dra_launcher::manifest::{normalize_name, parse_requirements};

proptest! {
    /// The parser never panics, whatever the file contains
    #[test]
    fn parser_never_panics(content in ".{0,512}") {
        let _ = parse_requirements(&content);
    }

    /// Parsed names never contain version-comparison characters
    #[test]
    fn parsed_names_are_clean(content in ".{0,512}") {
        for req in parse_requirements(&content) {
            prop_assert!(!req.name.is_empty());
            prop_assert!(!req.name.contains(['<', '>', '=', '!', '~', '[', ';']));
        }
    }

    /// A well-formed requirement line always parses to its own name
    #[test]
    fn wellformed_line_parses(name in "[A-Za-z][A-Za-z0-9_-]{0,30}", version in "[0-9]{1,3}\\.[0-9]{1,3}") {
        let content = format!("{}>={}\n", name, version);
        let reqs = parse_requirements(&content);
        prop_assert_eq!(reqs.len(), 1);
        prop_assert_eq!(&reqs[0].name, &name);
        let expected = format!(">={}", version);
        prop_assert_eq!(reqs[0].spec.as_deref(), Some(expected.as_str()));
    }
}

// =============================================================================
// Name Normalization Property Tests
// =============================================================================

proptest! {
    /// Normalization is idempotent
    #[test]
    fn normalize_idempotent(name in "[A-Za-z0-9._-]{1,40}") {
        let once = normalize_name(&name);
        let twice = normalize_name(&once);
        prop_assert_eq!(once, twice);
    }

    /// Normalized names never contain uppercase, '_' or '.'
    #[test]
    fn normalize_output_alphabet(name in "[A-Za-z0-9._-]{1,40}") {
        let normalized = normalize_name(&name);
        prop_assert!(!normalized.contains('_'));
        prop_assert!(!normalized.contains('.'));
        prop_assert!(!normalized.chars().any(|c| c.is_ascii_uppercase()));
        prop_assert!(!normalized.contains("--"));
    }
}

// =============================================================================
// Server Settings Property Tests
// =============================================================================

use dra_launcher::ServerSettings;

proptest! {
    /// Any in-range port string is accepted verbatim
    #[test]
    fn valid_ports_accepted(port in 1024u16..=65535) {
        let s = port.to_string();
        let settings = ServerSettings::from_vars(None, Some(&s), None).expect("Should accept");
        prop_assert_eq!(settings.port, port);
    }

    /// Privileged ports are always rejected
    #[test]
    fn privileged_ports_rejected(port in 0u16..1024) {
        let s = port.to_string();
        prop_assert!(ServerSettings::from_vars(None, Some(&s), None).is_err());
    }

    /// Arbitrary port strings never panic
    #[test]
    fn port_parsing_never_panics(port in ".{0,16}") {
        let _ = ServerSettings::from_vars(None, Some(&port), None);
    }
}
