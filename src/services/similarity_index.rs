use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;

use crate::{
    db::{CacheLookup, InteractionDataset, SimilarityStore},
    error::{EngineError, EngineResult},
    models::{ArticleRow, CachedSimilarity, SimilarityMatrix},
    services::text::{StopwordMatch, TfidfVectorizer},
};

/// Bumped whenever the text pipeline changes in a way that alters similarity values
const PIPELINE_VERSION: &str = "tfidf-v2";

/// Article-by-article text similarity over one corpus
#[derive(Debug, Clone, PartialEq)]
pub struct TextSimilarityIndex {
    articles: Vec<ArticleRow>,
    corpus_hash: String,
    matrix: SimilarityMatrix,
}

impl TextSimilarityIndex {
    /// Fits TF-IDF over the articles and computes the similarity matrix
    pub fn build(articles: Vec<ArticleRow>, vectorizer: &TfidfVectorizer) -> EngineResult<Self> {
        let corpus_hash = corpus_hash(&articles, vectorizer);
        let documents: Vec<String> = articles.iter().map(ArticleRow::document).collect();
        let matrix = vectorizer.fit_transform(&documents)?.self_similarity()?;

        Ok(Self {
            articles,
            corpus_hash,
            matrix,
        })
    }

    /// Wraps a previously persisted matrix
    pub fn from_parts(
        articles: Vec<ArticleRow>,
        corpus_hash: String,
        matrix: SimilarityMatrix,
    ) -> EngineResult<Self> {
        if matrix.size() != articles.len() {
            return Err(EngineError::InvalidInput(format!(
                "similarity matrix covers {} articles, corpus has {}",
                matrix.size(),
                articles.len()
            )));
        }
        Ok(Self {
            articles,
            corpus_hash,
            matrix,
        })
    }

    pub fn articles(&self) -> &[ArticleRow] {
        &self.articles
    }

    pub fn corpus_hash(&self) -> &str {
        &self.corpus_hash
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    /// Rows whose title is `title`, in corpus order
    pub fn rows_for_title<'a>(&'a self, title: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.articles
            .iter()
            .enumerate()
            .filter(move |(_, a)| a.title == title)
            .map(|(i, _)| i)
    }

    /// First row carrying `title`
    pub fn first_row_for_title(&self, title: &str) -> Option<&ArticleRow> {
        self.articles.iter().find(|a| a.title == title)
    }

    /// Rows scoring at or above the `percentile` of `row`'s similarity scores
    ///
    /// Results keep row order, include `row` itself when it qualifies, and stop after
    /// `max_candidates` entries.
    pub fn rows_above_percentile(
        &self,
        row: usize,
        percentile: f64,
        max_candidates: usize,
    ) -> Vec<usize> {
        let scores = self.matrix.row(row);
        let Some(threshold) = percentile_of(scores, percentile) else {
            return Vec::new();
        };

        scores
            .iter()
            .enumerate()
            .filter(|(_, &score)| score >= threshold)
            .map(|(i, _)| i)
            .take(max_candidates)
            .collect()
    }

    fn to_cached(&self) -> CachedSimilarity {
        CachedSimilarity {
            corpus_hash: self.corpus_hash.clone(),
            built_at: Utc::now(),
            matrix: self.matrix.clone(),
        }
    }
}

/// Percentile with linear interpolation between the two nearest ranks
///
/// Returns `None` for an empty slice. `percentile` is clamped to `[0, 100]`. Only the
/// two ranks involved are selected, so the cost is linear in the row length.
pub fn percentile_of(values: &[f64], percentile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let rank = percentile.clamp(0.0, 100.0) / 100.0 * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let fraction = rank - lo as f64;

    let mut scratch = values.to_vec();
    let (_, lo_value, above) = scratch.select_nth_unstable_by(lo, |a, b| a.total_cmp(b));
    let lo_value = *lo_value;
    if fraction == 0.0 {
        return Some(lo_value);
    }

    // The next rank is the smallest value above the `lo` partition
    let hi_value = above
        .iter()
        .copied()
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(lo_value);

    Some((lo_value + (hi_value - lo_value) * fraction).min(hi_value))
}

/// Stable identity of a corpus and the pipeline settings that shape its matrix
pub fn corpus_hash(articles: &[ArticleRow], vectorizer: &TfidfVectorizer) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(PIPELINE_VERSION.as_bytes());
    hasher.update(&[
        vectorizer.lowercase() as u8,
        (vectorizer.tokenizer().stopword_match() == StopwordMatch::CaseInsensitive) as u8,
    ]);
    for article in articles {
        for field in [&article.title, &article.description, &article.link] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Process-lifetime owner of the content similarity index
///
/// Holds the most recently built index and a single build lock. Concurrent cold starts
/// for the same corpus build once; requests already holding an `Arc` to the previous
/// index keep using it while a rebuild runs.
pub struct ContentModel {
    vectorizer: TfidfVectorizer,
    store: Option<Arc<dyn SimilarityStore>>,
    current: RwLock<Option<Arc<TextSimilarityIndex>>>,
    build_lock: Mutex<()>,
}

impl ContentModel {
    pub fn new(vectorizer: TfidfVectorizer, store: Option<Arc<dyn SimilarityStore>>) -> Self {
        Self {
            vectorizer,
            store,
            current: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    fn cached_index(&self, hash: &str) -> EngineResult<Option<Arc<TextSimilarityIndex>>> {
        let current = self
            .current
            .read()
            .map_err(|_| EngineError::Internal("similarity index lock poisoned".to_string()))?;
        Ok(current
            .as_ref()
            .filter(|index| index.corpus_hash() == hash)
            .cloned())
    }

    /// Returns the index for the dataset's current corpus, building it if needed
    ///
    /// `Ok(None)` means the corpus is empty. A build failure is reported as
    /// `EngineUnavailable`.
    pub fn index_for(
        &self,
        dataset: &InteractionDataset,
    ) -> EngineResult<Option<Arc<TextSimilarityIndex>>> {
        let articles = dataset.articles();
        if articles.is_empty() {
            return Ok(None);
        }

        let hash = corpus_hash(&articles, &self.vectorizer);
        if let Some(index) = self.cached_index(&hash)? {
            return Ok(Some(index));
        }

        let _guard = self
            .build_lock
            .lock()
            .map_err(|_| EngineError::Internal("similarity build lock poisoned".to_string()))?;

        // Another request may have finished the build while we waited
        if let Some(index) = self.cached_index(&hash)? {
            return Ok(Some(index));
        }

        let index = Arc::new(self.load_or_build(articles, hash)?);
        let mut current = self
            .current
            .write()
            .map_err(|_| EngineError::Internal("similarity index lock poisoned".to_string()))?;
        *current = Some(Arc::clone(&index));

        Ok(Some(index))
    }

    fn load_or_build(
        &self,
        articles: Vec<ArticleRow>,
        hash: String,
    ) -> EngineResult<TextSimilarityIndex> {
        if let Some(store) = &self.store {
            match store.load(&hash) {
                CacheLookup::Hit(matrix) => {
                    match TextSimilarityIndex::from_parts(articles.clone(), hash.clone(), matrix)
                    {
                        Ok(index) => {
                            tracing::info!(
                                backend = store.name(),
                                articles = index.articles().len(),
                                "Similarity cache hit"
                            );
                            return Ok(index);
                        }
                        Err(e) => {
                            tracing::warn!(
                                backend = store.name(),
                                error = %e,
                                "Similarity cache corrupt, rebuilding"
                            );
                        }
                    }
                }
                CacheLookup::Miss => {
                    tracing::info!(backend = store.name(), "Similarity cache miss, building");
                }
                CacheLookup::Corrupt(reason) => {
                    tracing::warn!(
                        backend = store.name(),
                        reason = %reason,
                        "Similarity cache corrupt, rebuilding"
                    );
                }
                CacheLookup::Unavailable(reason) => {
                    tracing::warn!(
                        backend = store.name(),
                        reason = %reason,
                        "Similarity cache unavailable, building"
                    );
                }
                CacheLookup::Stale { found } => {
                    tracing::info!(
                        backend = store.name(),
                        found = %found,
                        expected = %hash,
                        "Similarity cache built for another corpus, rebuilding"
                    );
                }
            }
        }

        let started = std::time::Instant::now();
        let index = TextSimilarityIndex::build(articles, &self.vectorizer).map_err(|e| {
            tracing::error!(error = %e, "Failed to build content similarity index");
            EngineError::EngineUnavailable(e.to_string())
        })?;

        tracing::info!(
            articles = index.articles().len(),
            build_time_ms = started.elapsed().as_millis(),
            "Content similarity index built"
        );

        if let Some(store) = &self.store {
            if let Err(e) = store.store(&index.to_cached()) {
                tracing::warn!(
                    backend = store.name(),
                    error = %e,
                    "Failed to persist similarity cache"
                );
            }
        }

        Ok(index)
    }
}
