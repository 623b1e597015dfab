use crate::error::EngineResult;
use crate::models::{CachedSimilarity, SimilarityMatrix};

/// Result of looking up a persisted similarity matrix
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// A valid matrix built from the same corpus
    Hit(SimilarityMatrix),
    /// Nothing persisted yet
    Miss,
    /// Something is persisted but it cannot be read or decoded
    Corrupt(String),
    /// The backend could not be reached, so nothing is known about the entry
    Unavailable(String),
    /// A valid matrix built from a different corpus
    Stale { found: String },
}

impl CacheLookup {
    /// Decodes a persisted blob and checks it against the current corpus hash
    pub fn decode(bytes: &[u8], corpus_hash: &str) -> Self {
        let cached: CachedSimilarity = match serde_json::from_slice(bytes) {
            Ok(cached) => cached,
            Err(e) => return CacheLookup::Corrupt(format!("undecodable entry: {}", e)),
        };

        if let Err(e) = cached.matrix.check_shape() {
            return CacheLookup::Corrupt(e.to_string());
        }

        if cached.corpus_hash != corpus_hash {
            return CacheLookup::Stale {
                found: cached.corpus_hash,
            };
        }

        CacheLookup::Hit(cached.matrix)
    }
}

/// Encodes an entry for persistence
pub fn encode(entry: &CachedSimilarity) -> EngineResult<Vec<u8>> {
    Ok(serde_json::to_vec(entry)?)
}

/// Persistence backend for the content similarity matrix
///
/// Implementations must make `store` all-or-nothing: a reader never observes a
/// partially written entry.
#[cfg_attr(test, mockall::automock)]
pub trait SimilarityStore: Send + Sync {
    /// Looks up the matrix for the corpus identified by `corpus_hash`
    fn load(&self, corpus_hash: &str) -> CacheLookup;

    /// Persists a freshly built matrix
    fn store(&self, entry: &CachedSimilarity) -> EngineResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(hash: &str) -> CachedSimilarity {
        CachedSimilarity {
            corpus_hash: hash.to_string(),
            built_at: Utc::now(),
            matrix: SimilarityMatrix::new(2, vec![1.0, 0.5, 0.5, 1.0]).unwrap(),
        }
    }

    #[test]
    fn test_decode_hit() {
        let bytes = encode(&entry("abc")).unwrap();
        match CacheLookup::decode(&bytes, "abc") {
            CacheLookup::Hit(matrix) => assert_eq!(matrix.get(0, 1), 0.5),
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_stale() {
        let bytes = encode(&entry("old")).unwrap();
        assert_eq!(
            CacheLookup::decode(&bytes, "new"),
            CacheLookup::Stale {
                found: "old".to_string()
            }
        );
    }

    #[test]
    fn test_decode_garbage_is_corrupt() {
        assert!(matches!(
            CacheLookup::decode(b"\x00\x01garbage", "abc"),
            CacheLookup::Corrupt(_)
        ));
    }

    #[test]
    fn test_decode_bad_shape_is_corrupt() {
        let bytes = br#"{"corpus_hash":"abc","built_at":"2024-01-01T00:00:00Z","matrix":{"size":2,"values":[1.0]}}"#;
        assert!(matches!(
            CacheLookup::decode(bytes, "abc"),
            CacheLookup::Corrupt(_)
        ));
    }
}
