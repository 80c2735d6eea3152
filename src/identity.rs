// src/identity.rs

//! Content-addressed identifiers.
//!
//! A record's identity is the SHA-256 digest of its identity-bearing fields,
//! concatenated in order and rendered as lowercase hex. Identical content
//! always produces the same identifier, and any edit produces a new one, so
//! persisted state can be reconciled by set difference alone.
//!
//! The hasher performs no normalization. Callers must trim, collapse
//! whitespace, and strip markup *before* hashing, or logically identical
//! content will hash differently.

use sha2::{Digest, Sha256};

/// Compute the content-addressed identifier for an ordered sequence of
/// identity-bearing fields.
///
/// The fields are hashed as one concatenated byte stream, so the order
/// matters: swapping two fields changes the identity.
pub fn content_id<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = content_id(["hello", "world"]);
        let b = content_id(["hello", "world"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        assert_eq!(
            content_id(["abc"]),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_order_sensitive() {
        assert_ne!(content_id(["a", "b"]), content_id(["b", "a"]));
    }

    #[test]
    fn test_fields_are_concatenated() {
        // The digest covers the concatenated stream, not field boundaries.
        assert_eq!(content_id(["ab", "c"]), content_id(["a", "bc"]));
    }

    #[test]
    fn test_lowercase_hex_output() {
        let id = content_id(["anything"]);
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_empty_input_is_valid() {
        // sha256("")
        assert_eq!(
            content_id([]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
