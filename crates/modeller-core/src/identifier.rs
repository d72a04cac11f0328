//! Markup identifiers derived from human-readable element names.
//!
//! Every place that references an element inside generated markup uses an
//! [`Identifier`]. Declarations, note anchors and link statements must agree
//! byte-for-byte, so there is exactly one derivation function and it never
//! changes the case of a retained character.
//!
//! Derivation rules, applied per character:
//!
//! | input                   | output     |
//! |-------------------------|------------|
//! | ASCII letter or digit   | unchanged  |
//! | `_`                     | unchanged  |
//! | whitespace, `-`         | `_`        |
//! | `&`                     | `And`      |
//! | anything else           | dropped    |
//!
//! A result that does not begin with a letter is prefixed with `E`. A name
//! with no letters or digits at all falls back to `Element`.

use std::fmt;

use serde::Serialize;

use crate::catalogue::ElementType;

/// Prefix used when a derived identifier would not start with a letter.
const LEADING_PREFIX: char = 'E';

/// Identifier used for names that contain nothing usable.
const FALLBACK: &str = "Element";

/// A sanitized, case-preserving identifier usable inside diagram markup.
///
/// # Examples
///
/// ```
/// use modeller_core::identifier::Identifier;
///
/// assert_eq!(Identifier::derive("API Gateway"), "API_Gateway");
/// assert_eq!(Identifier::derive("3Com"), "E3Com");
/// assert_eq!(Identifier::derive("R&D"), "RAndD");
/// assert_eq!(Identifier::derive("!!!"), "Element");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Derives an identifier from a free-form name.
    ///
    /// This is a total function: every input, including the empty string,
    /// yields a valid identifier.
    pub fn derive(name: &str) -> Self {
        let mut out = String::with_capacity(name.len());
        let mut has_alnum = false;

        for ch in name.chars() {
            match ch {
                c if c.is_ascii_alphanumeric() => {
                    has_alnum = true;
                    out.push(c);
                }
                '_' => out.push('_'),
                '-' => out.push('_'),
                c if c.is_whitespace() => out.push('_'),
                '&' => {
                    has_alnum = true;
                    out.push_str("And");
                }
                _ => {}
            }
        }

        if !has_alnum {
            return Self(FALLBACK.to_string());
        }

        if !out.starts_with(|c: char| c.is_ascii_alphabetic()) {
            out.insert(0, LEADING_PREFIX);
        }

        Self(out)
    }

    /// Returns the identifier an element of the given type binds in markup.
    ///
    /// Singleton types (see [`ElementType::singleton_variable`]) always bind
    /// their fixed lower-case variable; every other type binds the identifier
    /// derived from the element name.
    pub fn for_element(name: &str, element_type: &ElementType) -> Self {
        match element_type.singleton_variable() {
            Some(variable) => Self(variable.to_string()),
            None => Self::derive(name),
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn check_is_valid_identifier(name: &str) -> Result<(), TestCaseError> {
        let id = Identifier::derive(name);
        let s = id.as_str();

        prop_assert!(!s.is_empty());
        prop_assert!(s.starts_with(|c: char| c.is_ascii_alphabetic()));
        prop_assert!(s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        Ok(())
    }

    fn check_is_deterministic(name: &str) -> Result<(), TestCaseError> {
        prop_assert_eq!(Identifier::derive(name), Identifier::derive(name));
        Ok(())
    }

    fn check_alnum_names_are_unchanged(name: &str) -> Result<(), TestCaseError> {
        let derived = Identifier::derive(name);
        prop_assert_eq!(derived.as_str(), name);
        Ok(())
    }

    proptest! {
        #[test]
        fn derived_identifier_is_valid(name in ".*") {
            check_is_valid_identifier(&name)?;
        }

        #[test]
        fn derivation_is_deterministic(name in ".*") {
            check_is_deterministic(&name)?;
        }

        #[test]
        fn letter_led_alnum_names_are_unchanged(name in "[A-Za-z][A-Za-z0-9]{0,20}") {
            check_alnum_names_are_unchanged(&name)?;
        }
    }
}
