use std::collections::{BTreeMap, HashMap};

use super::tokenize::Tokenizer;
use crate::error::{EngineError, EngineResult};
use crate::models::SimilarityMatrix;

/// Sparse TF-IDF document-term matrix
///
/// Each row holds `(term index, weight)` pairs sorted by term index. Rows are
/// L2-normalized, so the dot product of two rows is their cosine similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfMatrix {
    rows: Vec<Vec<(usize, f64)>>,
    vocabulary: BTreeMap<String, usize>,
}

impl TfidfMatrix {
    pub fn rows(&self) -> &[Vec<(usize, f64)>] {
        &self.rows
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Dot product of this matrix with its own transpose
    ///
    /// Only the upper triangle is computed; the lower one is mirrored, so the result
    /// is exactly symmetric.
    pub fn self_similarity(&self) -> EngineResult<SimilarityMatrix> {
        let n = self.rows.len();
        let mut values = vec![0.0; n * n];

        for i in 0..n {
            for j in i..n {
                let score = sparse_dot(&self.rows[i], &self.rows[j]);
                values[i * n + j] = score;
                values[j * n + i] = score;
            }
        }

        SimilarityMatrix::new(n, values)
    }
}

fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Term-count vectorizer followed by smoothed IDF weighting and L2 normalization
///
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, where `n` is the number of documents.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    tokenizer: Tokenizer,
    lowercase: bool,
}

impl TfidfVectorizer {
    pub fn new(tokenizer: Tokenizer, lowercase: bool) -> Self {
        Self {
            tokenizer,
            lowercase,
        }
    }

    /// Whether documents are lowercased before tokenizing
    pub fn lowercase(&self) -> bool {
        self.lowercase
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    fn tokens(&self, document: &str) -> Vec<String> {
        if self.lowercase {
            self.tokenizer.tokenize(&document.to_lowercase())
        } else {
            self.tokenizer.tokenize(document)
        }
    }

    /// Learns the vocabulary of `documents` and returns their TF-IDF rows
    ///
    /// Fails when no document produces a single term.
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> EngineResult<TfidfMatrix> {
        let tokenized: Vec<Vec<String>> =
            documents.iter().map(|d| self.tokens(d.as_ref())).collect();

        let mut vocabulary: BTreeMap<String, usize> = BTreeMap::new();
        for tokens in &tokenized {
            for token in tokens {
                vocabulary.entry(token.clone()).or_insert(0);
            }
        }
        if vocabulary.is_empty() {
            return Err(EngineError::InvalidInput(
                "empty vocabulary; documents contain only stopwords or no text".to_string(),
            ));
        }
        for (index, slot) in vocabulary.values_mut().enumerate() {
            *slot = index;
        }

        let counts: Vec<HashMap<usize, f64>> = tokenized
            .iter()
            .map(|tokens| {
                let mut tf: HashMap<usize, f64> = HashMap::new();
                for token in tokens {
                    *tf.entry(vocabulary[token]).or_default() += 1.0;
                }
                tf
            })
            .collect();

        let mut document_frequency = vec![0usize; vocabulary.len()];
        for tf in &counts {
            for term in tf.keys() {
                document_frequency[*term] += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .into_iter()
            .map(|tf| {
                let mut row: Vec<(usize, f64)> = tf
                    .into_iter()
                    .map(|(term, count)| (term, count * idf[term]))
                    .collect();
                row.sort_by_key(|(term, _)| *term);

                let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in &mut row {
                        *w /= norm;
                    }
                }
                row
            })
            .collect();

        Ok(TfidfMatrix { rows, vocabulary })
    }
}
