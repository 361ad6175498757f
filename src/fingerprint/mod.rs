//! Request fingerprinting for cache keys.
//!
//! Two requests for the same product must share cache entries even when they
//! differ in casing or whitespace, so the key is a normalized digest of
//! (name, supercategory, category).

use blake3::Hasher;

/// Lowercases and collapses all interior whitespace to single spaces.
#[inline]
pub fn normalize(part: &str) -> String {
    part.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hashes arbitrary bytes to a 64-bit value (first 8 bytes of BLAKE3, LE).
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Computes the 64-bit cache fingerprint of a source item.
///
/// The digest is the first 8 bytes of a BLAKE3 hash over the normalized
/// parts, each length-prefixed so content cannot shift across field
/// boundaries: `("ab", "c")` and `("a", "bc")` never collide structurally,
/// whatever bytes the parts contain. 64 bits is plenty for the keyspace
/// here: distinct (product, category) combinations, not arbitrary user
/// input volume.
#[inline]
pub fn fingerprint(name: &str, supercategory: &str, category: &str) -> u64 {
    let mut hasher = Hasher::new();
    for part in [name, supercategory, category] {
        let normalized = normalize(part);
        hasher.update(&(normalized.len() as u64).to_le_bytes());
        hasher.update(normalized.as_bytes());
    }

    let hash = hasher.finalize();
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize("  Copy   Paper\tLetter "), "copy paper letter");
        assert_eq!(normalize("COPY PAPER"), "copy paper");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_fingerprint_ignores_cosmetic_differences() {
        let a = fingerprint("Copy Paper Letter Size", "Office Supplies", "Copy Paper");
        let b = fingerprint("  copy  PAPER letter size", "office supplies", "COPY PAPER ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_distinguishes_products() {
        let a = fingerprint("Copy Paper", "Office Supplies", "Copy Paper");
        let b = fingerprint("Legal Pads", "Office Supplies", "Copy Paper");
        let c = fingerprint("Copy Paper", "Office Supplies", "Cardstock");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_fingerprint_length_prefix_prevents_ambiguity() {
        let a = fingerprint("ab", "cd", "ef");
        let b = fingerprint("a", "bcd", "ef");
        let c = fingerprint("ab", "c", "def");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_fingerprint_part_boundaries_survive_pipe_content() {
        let a = fingerprint("a|b", "c", "d");
        let b = fingerprint("a", "b|c", "d");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_determinism() {
        let a = fingerprint("Stapler", "Office Supplies", "Staplers");
        let b = fingerprint("Stapler", "Office Supplies", "Staplers");
        assert_eq!(a, b);
    }
}
