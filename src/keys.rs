use crate::errors::{RateLimitError, Result};

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "request_rate_limiter";

/// The pair of keys holding one bucket's state: `ns.{id}.tokens` and
/// `ns.{id}.timestamp`. Both must hash to the same cluster slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKeys {
    pub tokens: String,
    pub timestamp: String,
}

impl BucketKeys {
    /// Derive the keys for `id`.
    ///
    /// Fails when `id` is empty or when the derived keys would not share a
    /// hash tag (an id starting with `}` closes the tag before it opens).
    pub fn derive(namespace: &str, id: &str) -> Result<Self> {
        if id.is_empty() {
            return Err(RateLimitError::InvalidIdentifier(
                "Rule identifier cannot be empty".to_string(),
            ));
        }

        let prefix = format!("{}.{{{}}}", namespace, id);
        let keys = Self {
            tokens: format!("{}.tokens", prefix),
            timestamp: format!("{}.timestamp", prefix),
        };

        let slot = hash_tag(&keys.tokens);
        if slot == keys.tokens || slot != hash_tag(&keys.timestamp) {
            return Err(RateLimitError::InvalidIdentifier(format!(
                "Rule identifier '{}' does not form a hash tag",
                id
            )));
        }

        Ok(keys)
    }

    /// Hash tag shared by both keys.
    pub fn slot(&self) -> &str {
        hash_tag(&self.tokens)
    }
}

/// Return the part of `key` that determines its cluster slot.
///
/// Follows Redis Cluster rules: if the key contains `{` followed later by `}`
/// with at least one character between them, only that substring is hashed.
/// Otherwise the whole key is.
pub fn hash_tag(key: &str) -> &str {
    if let Some(open) = key.find('{') {
        if let Some(len) = key[open + 1..].find('}') {
            if len > 0 {
                return &key[open + 1..open + 1 + len];
            }
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_layout() {
        let keys = BucketKeys::derive(DEFAULT_NAMESPACE, "rule-42").unwrap();
        assert_eq!(keys.tokens, "request_rate_limiter.{rule-42}.tokens");
        assert_eq!(keys.timestamp, "request_rate_limiter.{rule-42}.timestamp");
        assert_ne!(keys.tokens, keys.timestamp);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = BucketKeys::derive("ns", "tenant").unwrap();
        let b = BucketKeys::derive("ns", "tenant").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_rejects_empty_identifier() {
        let err = BucketKeys::derive("ns", "").unwrap_err();
        assert!(matches!(err, RateLimitError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_derive_rejects_identifier_closing_the_tag() {
        let err = BucketKeys::derive("ns", "}evil").unwrap_err();
        assert!(matches!(err, RateLimitError::InvalidIdentifier(_)));
        assert!(BucketKeys::derive("ns", "}").is_err());
    }

    #[test]
    fn test_derive_accepts_inner_braces() {
        let keys = BucketKeys::derive("ns", "a}b").unwrap();
        assert_eq!(hash_tag(&keys.tokens), hash_tag(&keys.timestamp));

        let keys = BucketKeys::derive("ns", "a{b").unwrap();
        assert_eq!(keys.slot(), "a{b");
    }

    #[test]
    fn test_keys_share_slot() {
        let keys = BucketKeys::derive("ns", "user:1").unwrap();
        assert_eq!(hash_tag(&keys.tokens), "user:1");
        assert_eq!(hash_tag(&keys.timestamp), "user:1");
        assert_eq!(keys.slot(), "user:1");
    }

    #[test]
    fn test_hash_tag_rules() {
        assert_eq!(hash_tag("plain"), "plain");
        assert_eq!(hash_tag("a{b}c"), "b");
        assert_eq!(hash_tag("a{}c{d}"), "a{}c{d}");
        assert_eq!(hash_tag("a{b"), "a{b");
        assert_eq!(hash_tag("a{b}{c}"), "b");
        assert_eq!(hash_tag("{x}}"), "x");
    }

    #[test]
    fn test_distinct_identifiers_get_distinct_keys() {
        let a = BucketKeys::derive("ns", "a").unwrap();
        let b = BucketKeys::derive("ns", "b").unwrap();
        assert_ne!(a.tokens, b.tokens);
        assert_ne!(a.slot(), b.slot());
    }
}
