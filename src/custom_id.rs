//! # Custom Identifier Codec
//!
//! Custom identifiers are the opaque strings attached to message controls
//! and modals which round-trip through the platform back to the bot. They
//! take the shape `match[:metadata]`: the match portion is the registry
//! lookup key, the metadata portion is caller data carried back verbatim to
//! the invoked context.
//!
//! The codec is pure and stateless. Identifiers meant to survive process
//! restarts must be built from fixed strings rather than [`generate`]d.

use uuid::Uuid;

use crate::error::{ValidationError, MAX_CUSTOM_ID_LENGTH};

/// Separator between the match and metadata portions of an identifier.
pub const SEPARATOR: char = ':';

/// Split a custom identifier into its match and metadata portions.
///
/// Splits on the first `:` only; metadata may itself contain further
/// separators.
pub fn split(custom_id: &str) -> (&str, Option<&str>) {
    match custom_id.split_once(SEPARATOR) {
        Some((id_match, metadata)) => (id_match, Some(metadata)),
        None => (custom_id, None),
    }
}

/// Join a match portion and optional metadata into a wire identifier.
///
/// # Errors
///
/// Returns [`ValidationError`] if the match portion is empty or contains the
/// separator, or if the joined identifier exceeds
/// [`MAX_CUSTOM_ID_LENGTH`](crate::error::MAX_CUSTOM_ID_LENGTH) characters.
pub fn join(id_match: &str, metadata: Option<&str>) -> Result<String, ValidationError> {
    validate_match(id_match)?;

    let joined = match metadata {
        Some(metadata) => format!("{id_match}{SEPARATOR}{metadata}"),
        None => id_match.to_owned(),
    };

    let length = joined.chars().count();
    if length > MAX_CUSTOM_ID_LENGTH {
        return Err(ValidationError::IdTooLong { length });
    }

    Ok(joined)
}

/// Check that a match portion is usable as a registry key.
pub fn validate_match(id_match: &str) -> Result<(), ValidationError> {
    if id_match.is_empty() {
        return Err(ValidationError::EmptyMatch);
    }

    if id_match.contains(SEPARATOR) {
        return Err(ValidationError::SeparatorInMatch {
            value: id_match.to_owned(),
        });
    }

    let length = id_match.chars().count();
    if length > MAX_CUSTOM_ID_LENGTH {
        return Err(ValidationError::IdTooLong { length });
    }

    Ok(())
}

/// Generate a random match portion for a per-process registration.
///
/// The result is a UUID-v4 and therefore unique per process; it must not be
/// used for registrations meant to be re-resolved after a restart.
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_split_on_first_separator_only() {
        assert_eq!(split("btn:user:42"), ("btn", Some("user:42")));
        assert_eq!(split("btn:"), ("btn", Some("")));
        assert_eq!(split("btn"), ("btn", None));
    }

    #[test]
    fn test_join_without_metadata() {
        assert_eq!(join("next", None).unwrap(), "next");
    }

    #[test]
    fn test_join_rejects_separator_in_match() {
        assert!(matches!(
            join("a:b", None),
            Err(ValidationError::SeparatorInMatch { .. })
        ));
    }

    #[test]
    fn test_join_rejects_empty_match() {
        assert!(matches!(join("", Some("meta")), Err(ValidationError::EmptyMatch)));
    }

    #[test]
    fn test_join_rejects_oversized_id() {
        let id_match = "m".repeat(80);
        let metadata = "x".repeat(40);
        assert!(matches!(
            join(&id_match, Some(&metadata)),
            Err(ValidationError::IdTooLong { length: 121 })
        ));
    }

    #[test]
    fn test_join_accepts_exactly_max_length() {
        let id_match = "m".repeat(49);
        let metadata = "x".repeat(50);
        let joined = join(&id_match, Some(&metadata)).unwrap();
        assert_eq!(joined.len(), 100);
    }

    #[test]
    fn test_generated_ids_are_unique_and_valid() {
        let first = generate();
        let second = generate();
        assert_ne!(first, second);
        validate_match(&first).unwrap();
    }

    proptest! {
        #[test]
        fn prop_round_trip(id_match in "[^:]{1,40}", metadata in proptest::option::of("[ -~]{0,40}")) {
            let joined = join(&id_match, metadata.as_deref()).unwrap();
            let (out_match, out_metadata) = split(&joined);
            prop_assert_eq!(out_match, id_match.as_str());
            prop_assert_eq!(out_metadata, metadata.as_deref());
        }
    }
}
