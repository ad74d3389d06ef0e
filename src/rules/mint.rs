//! Content-addressed relation identifiers.
//!
//! A minted IRI is `base + "_" + hex(SHA-256(root ‖ gloss))[..8]`. It depends
//! only on the key, never on the entities the derived triple connects.

use sha2::{Digest, Sha256};

use crate::graph::{Iri, Term};

/// Hex characters of the digest kept in a minted IRI.
pub const MINT_DIGEST_LEN: usize = 8;

/// Mint the identifier for `(root, gloss)` under `base`.
pub fn mint_iri(base: &Iri, root: &str, gloss: &str) -> Iri {
    let mut hasher = Sha256::new();
    hasher.update(root.as_bytes());
    hasher.update(gloss.as_bytes());
    let digest = hex::encode(hasher.finalize());
    Iri::new(format!("{}_{}", base.as_str(), &digest[..MINT_DIGEST_LEN]))
}

/// The string a bound term contributes to a mint key: the lexical form of a
/// literal or the IRI string. Blank nodes have no stable key.
pub fn key_part(term: &Term) -> Option<&str> {
    match term {
        Term::Iri(iri) => Some(iri.as_str()),
        Term::Literal(lit) => Some(lit.value()),
        Term::Blank(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_iri() {
        let base = Iri::new("http://ex.org/acquires");
        let a = mint_iri(&base, "acquire", "come into the possession of something");
        let b = mint_iri(&base, "acquire", "come into the possession of something");
        assert_eq!(a, b);
        let suffix = a.as_str().strip_prefix("http://ex.org/acquires_").unwrap();
        assert_eq!(suffix.len(), MINT_DIGEST_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn gloss_changes_the_iri() {
        let base = Iri::new("http://ex.org/acquires");
        assert_ne!(
            mint_iri(&base, "acquire", "gain knowledge or skills"),
            mint_iri(&base, "acquire", "come into the possession of something"),
        );
    }

    #[test]
    fn known_digest() {
        // sha256("ab") = fb8e20fc2e4c3f24...
        let iri = mint_iri(&Iri::new("urn:r"), "a", "b");
        assert_eq!(iri.as_str(), "urn:r_fb8e20fc");
    }

    #[test]
    fn blank_nodes_have_no_key() {
        assert_eq!(key_part(&Term::blank("b0")), None);
        assert_eq!(key_part(&Term::literal("x")), Some("x"));
    }
}
