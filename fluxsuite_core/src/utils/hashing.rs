//! Short digests used to derive problem variable ids
use std::hash::{DefaultHasher, Hash, Hasher};

/// Hexadecimal digest of `value`, stable within one build
pub(crate) fn hex_digest<T: Hash + ?Sized>(value: &T) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(hex_digest("PFK"), hex_digest("PFK"));
        assert_ne!(hex_digest("PFK"), hex_digest("PGI"));
        assert!(hex_digest("PFK").chars().all(|c| c.is_ascii_hexdigit()));
    }
}
