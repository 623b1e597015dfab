use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Square article-by-article similarity matrix stored row-major
///
/// Row and column `i` both refer to the `i`-th deduplicated article row of the corpus
/// the matrix was built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn new(size: usize, values: Vec<f64>) -> EngineResult<Self> {
        let matrix = Self { size, values };
        matrix.check_shape()?;
        Ok(matrix)
    }

    /// Number of articles (rows and columns)
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.size + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.size;
        &self.values[start..start + self.size]
    }

    /// Fails when the value buffer does not hold exactly `size * size` entries
    pub fn check_shape(&self) -> EngineResult<()> {
        let expected = self.size.checked_mul(self.size).ok_or_else(|| {
            EngineError::InvalidInput(format!("matrix size {} overflows", self.size))
        })?;
        if self.values.len() != expected {
            return Err(EngineError::InvalidInput(format!(
                "expected {} similarity values for {} articles, found {}",
                expected,
                self.size,
                self.values.len()
            )));
        }
        Ok(())
    }
}

/// Persisted form of a similarity matrix, tagged with the corpus it came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedSimilarity {
    pub corpus_hash: String,
    pub built_at: DateTime<Utc>,
    pub matrix: SimilarityMatrix,
}
