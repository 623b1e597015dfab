use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::cache::{encode, CacheLookup, SimilarityStore};
use crate::error::{EngineError, EngineResult};
use crate::models::CachedSimilarity;

/// Keeps the similarity matrix in a single file on disk
///
/// Writes go to a temporary file in the same directory which is then renamed over the
/// target, so concurrent readers see either the old entry or the new one.
#[derive(Debug, Clone)]
pub struct FileSimilarityStore {
    path: PathBuf,
}

impl FileSimilarityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl SimilarityStore for FileSimilarityStore {
    fn load(&self, corpus_hash: &str) -> CacheLookup {
        match std::fs::read(&self.path) {
            Ok(bytes) => CacheLookup::decode(&bytes, corpus_hash),
            Err(e) if e.kind() == ErrorKind::NotFound => CacheLookup::Miss,
            Err(e) => CacheLookup::Corrupt(format!("unreadable {}: {}", self.path.display(), e)),
        }
    }

    fn store(&self, entry: &CachedSimilarity) -> EngineResult<()> {
        let bytes = encode(entry)?;
        let dir = self.parent_dir();
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| EngineError::Io(e.error))?;

        tracing::debug!(
            path = %self.path.display(),
            bytes = bytes.len(),
            "Similarity cache written"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SimilarityMatrix;
    use chrono::Utc;

    fn entry(hash: &str) -> CachedSimilarity {
        CachedSimilarity {
            corpus_hash: hash.to_string(),
            built_at: Utc::now(),
            matrix: SimilarityMatrix::new(2, vec![1.0, 0.1 + 0.2, 0.1 + 0.2, 1.0]).unwrap(),
        }
    }

    #[test]
    fn test_missing_file_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSimilarityStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load("abc"), CacheLookup::Miss);
    }

    #[test]
    fn test_store_then_load_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSimilarityStore::new(dir.path().join("nested").join("sim.json"));
        let original = entry("abc");

        store.store(&original).unwrap();

        match store.load("abc") {
            CacheLookup::Hit(matrix) => assert_eq!(matrix, original.matrix),
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        std::fs::write(&path, br#"{"corpus_hash":"abc","matrix":"#).unwrap();

        let store = FileSimilarityStore::new(&path);
        assert!(matches!(store.load("abc"), CacheLookup::Corrupt(_)));
    }

    #[test]
    fn test_overwrite_replaces_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSimilarityStore::new(dir.path().join("sim.json"));

        store.store(&entry("first")).unwrap();
        store.store(&entry("second")).unwrap();

        assert!(matches!(store.load("second"), CacheLookup::Hit(_)));
        assert!(matches!(store.load("first"), CacheLookup::Stale { .. }));
    }
}
