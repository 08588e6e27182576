use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use crate::{
    error::{AppError, AppResult},
    models::{BookRecord, Catalog, Recommendation, SimilarityStatus},
};

use super::tfidf::{dot, TfidfModel};
use super::SimilarityStrategy;

/// Limits applied when building a similarity model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOptions {
    /// Vocabulary cap
    pub max_features: usize,
    /// Largest catalog the dense matrix is built for
    pub max_documents: usize,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            max_features: 4000,
            max_documents: 5000,
        }
    }
}

/// Dense symmetric cosine-similarity matrix over a catalog
#[derive(Debug, Clone)]
pub struct SimilarityModel {
    size: usize,
    scores: Vec<f64>,
    vocabulary_size: usize,
    built_at: DateTime<Utc>,
}

impl SimilarityModel {
    /// Vectorizes `title + " " + author` for every book and scores all pairs.
    ///
    /// Fails with `AppError::DataSource` for an empty catalog, one whose
    /// text yields no terms, or one larger than `max_documents`.
    pub fn build(catalog: &Catalog, options: ModelOptions) -> AppResult<Self> {
        let start = Instant::now();

        // The matrix holds n * n scores
        if catalog.len() > options.max_documents {
            return Err(AppError::DataSource(format!(
                "catalog has {} books, similarity model is limited to {}",
                catalog.len(),
                options.max_documents
            )));
        }

        let documents: Vec<String> = catalog.books().iter().map(BookRecord::joined_text).collect();
        let tfidf = TfidfModel::fit(&documents, options.max_features)?;
        let vectors = tfidf.vectors();

        let size = vectors.len();
        let mut scores = vec![0.0; size * size];
        for i in 0..size {
            scores[i * size + i] = 1.0;
            for j in (i + 1)..size {
                let score = dot(&vectors[i], &vectors[j]).clamp(0.0, 1.0);
                scores[i * size + j] = score;
                scores[j * size + i] = score;
            }
        }

        tracing::info!(
            documents = size,
            vocabulary = tfidf.vocabulary_size(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Similarity model built"
        );

        Ok(Self {
            size,
            scores,
            vocabulary_size: tfidf.vocabulary_size(),
            built_at: Utc::now(),
        })
    }

    /// Number of documents (rows) in the matrix
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn score(&self, i: usize, j: usize) -> f64 {
        self.scores[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.scores[i * self.size..(i + 1) * self.size]
    }

    /// Top `k` books most similar to `title`, highest score first.
    ///
    /// Equal scores are ordered by ascending catalog index. The query book is
    /// never part of the result.
    pub fn recommend(
        &self,
        catalog: &Catalog,
        title: &str,
        k: usize,
    ) -> AppResult<Vec<(BookRecord, f64)>> {
        let index = catalog
            .position(title)
            .ok_or_else(|| AppError::UnknownTitle(title.to_string()))?;

        if catalog.len() != self.size {
            return Err(AppError::Internal(format!(
                "similarity model covers {} books but catalog has {}",
                self.size,
                catalog.len()
            )));
        }

        let mut ranked: Vec<(usize, f64)> = self
            .row(index)
            .iter()
            .copied()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(k);

        Ok(ranked
            .into_iter()
            .filter_map(|(j, score)| catalog.get(j).map(|book| (book.clone(), score)))
            .collect())
    }
}

/// Content-based recommender with a build-once similarity model
///
/// The model is built on first use (or by `warm_up`). Concurrent first
/// callers wait for a single in-flight build; a failed build is not cached.
pub struct SimilarityEngine {
    catalog: Arc<Catalog>,
    options: ModelOptions,
    model: OnceCell<Arc<SimilarityModel>>,
}

impl SimilarityEngine {
    pub fn new(catalog: Arc<Catalog>, options: ModelOptions) -> Self {
        Self {
            catalog,
            options,
            model: OnceCell::new(),
        }
    }

    /// Returns the model, building it on the blocking pool if needed
    pub async fn model(&self) -> AppResult<Arc<SimilarityModel>> {
        self.model
            .get_or_try_init(|| async {
                let catalog = self.catalog.clone();
                let options = self.options;
                tracing::info!(
                    books = catalog.len(),
                    max_features = options.max_features,
                    "Building similarity model"
                );
                let model =
                    tokio::task::spawn_blocking(move || SimilarityModel::build(&catalog, options))
                        .await??;
                Ok::<_, AppError>(Arc::new(model))
            })
            .await
            .cloned()
    }

    /// Builds the model ahead of the first query
    pub async fn warm_up(&self) -> AppResult<()> {
        self.model().await.map(|_| ())
    }

    pub fn is_built(&self) -> bool {
        self.model.initialized()
    }

    pub fn status(&self) -> SimilarityStatus {
        match self.model.get() {
            Some(model) => SimilarityStatus {
                built: true,
                documents: model.size(),
                vocabulary_size: Some(model.vocabulary_size()),
                built_at: Some(model.built_at()),
            },
            None => SimilarityStatus {
                built: false,
                documents: self.catalog.len(),
                vocabulary_size: None,
                built_at: None,
            },
        }
    }

    /// Top `k` books similar to `title` with their scores
    pub async fn recommend(&self, title: &str, k: usize) -> AppResult<Vec<(BookRecord, f64)>> {
        // Fail on unknown titles without forcing a build
        if !self.catalog.contains(title) {
            return Err(AppError::UnknownTitle(title.to_string()));
        }
        let model = self.model().await?;
        model.recommend(&self.catalog, title, k)
    }
}

#[async_trait::async_trait]
impl SimilarityStrategy for SimilarityEngine {
    async fn similar(&self, title: &str, k: usize) -> AppResult<Vec<Recommendation>> {
        Ok(self
            .recommend(title, k)
            .await?
            .into_iter()
            .map(|(book, score)| Recommendation {
                book,
                score: Some(score),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "content"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::StaticCatalogSource;

    fn catalog(books: &[(&str, &str)]) -> Catalog {
        Catalog::from_records(
            books
                .iter()
                .map(|(title, author)| BookRecord::new(*title, *author, "")),
        )
    }

    fn build(catalog: &Catalog) -> AppResult<SimilarityModel> {
        SimilarityModel::build(catalog, ModelOptions::default())
    }

    fn engine(catalog: Catalog) -> SimilarityEngine {
        SimilarityEngine::new(Arc::new(catalog), ModelOptions::default())
    }

    fn sample_catalog() -> Catalog {
        catalog(&[
            ("The Power of Habit", "Charles Duhigg"),
            ("Atomic Habits", "James Clear"),
            ("The Habit Loop", "Charles Duhigg"),
            ("The Hobbit", "J.R.R. Tolkien"),
            ("The Silmarillion", "J.R.R. Tolkien"),
            ("Rich Dad Poor Dad", "Robert Kiyosaki"),
        ])
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let model = build(&sample_catalog()).unwrap();

        for i in 0..model.size() {
            assert!((model.score(i, i) - 1.0).abs() < 1e-12);
            for j in 0..model.size() {
                assert!((model.score(i, j) - model.score(j, i)).abs() < 1e-12);
                assert!((0.0..=1.0).contains(&model.score(i, j)));
            }
        }
    }

    #[test]
    fn test_unit_diagonal_holds_for_books_without_terms() {
        let catalog = catalog(&[("It", ""), ("Dune", "Frank Herbert")]);
        let model = build(&catalog).unwrap();
        assert_eq!(model.score(0, 0), 1.0);
        assert_eq!(model.score(0, 1), 0.0);
    }

    #[test]
    fn test_empty_catalog_is_data_source_error() {
        let err = build(&Catalog::default()).unwrap_err();
        assert!(matches!(err, AppError::DataSource(_)));
    }

    #[test]
    fn test_oversized_catalog_is_data_source_error() {
        let options = ModelOptions {
            max_documents: 5,
            ..ModelOptions::default()
        };

        let err = SimilarityModel::build(&sample_catalog(), options).unwrap_err();
        assert!(matches!(err, AppError::DataSource(msg) if msg.contains("limited to 5")));

        let options = ModelOptions {
            max_documents: 6,
            ..ModelOptions::default()
        };
        assert!(SimilarityModel::build(&sample_catalog(), options).is_ok());
    }

    #[test]
    fn test_recommend_ranks_shared_terms_first() {
        let catalog = sample_catalog();
        let model = build(&catalog).unwrap();

        let recs = model.recommend(&catalog, "The Hobbit", 2).unwrap();
        assert_eq!(recs[0].0.title, "The Silmarillion");
        assert!(recs[0].1 > recs[1].1);
    }

    #[test]
    fn test_recommend_excludes_query_and_respects_length() {
        let catalog = sample_catalog();
        let model = build(&catalog).unwrap();

        for book in catalog.books() {
            for k in [0, 1, 3, 5, 10] {
                let recs = model.recommend(&catalog, &book.title, k).unwrap();
                assert_eq!(recs.len(), k.min(catalog.len() - 1));
                assert!(recs.iter().all(|(r, _)| r.title != book.title));
            }
        }
    }

    #[test]
    fn test_recommend_sorted_descending() {
        let catalog = sample_catalog();
        let model = build(&catalog).unwrap();

        let recs = model.recommend(&catalog, "The Power of Habit", 5).unwrap();
        for pair in recs.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_ties_broken_by_catalog_index() {
        // "Dune" and "DUNE" tokenize identically, so they tie for every query
        let catalog = catalog(&[
            ("Dune Messiah", "Frank Herbert"),
            ("DUNE", "Frank Herbert"),
            ("Emma", "Jane Austen"),
            ("Dune", "Frank Herbert"),
        ]);
        let model = build(&catalog).unwrap();

        let recs = model.recommend(&catalog, "Dune Messiah", 3).unwrap();
        assert_eq!(recs[0].0.title, "DUNE");
        assert_eq!(recs[1].0.title, "Dune");
        assert_eq!(recs[0].1, recs[1].1);
        assert_eq!(recs[2].0.title, "Emma");
    }

    #[test]
    fn test_small_catalog_returns_what_is_available() {
        let catalog = catalog(&[("Dune", "Frank Herbert"), ("Emma", "Jane Austen")]);
        let model = build(&catalog).unwrap();

        let recs = model.recommend(&catalog, "Dune", 5).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].0.title, "Emma");
    }

    #[test]
    fn test_recommend_unknown_title() {
        let catalog = sample_catalog();
        let model = build(&catalog).unwrap();

        let err = model.recommend(&catalog, "Dune", 3).unwrap_err();
        assert!(matches!(err, AppError::UnknownTitle(t) if t == "Dune"));
    }

    #[test]
    fn test_recommend_is_idempotent() {
        let catalog = Arc::new(StaticCatalogSource::catalog());
        let model = build(&catalog).unwrap();

        let first = model.recommend(&catalog, "Atomic Habits", 5).unwrap();
        let second = model.recommend(&catalog, "Atomic Habits", 5).unwrap();
        assert_eq!(first, second);

        let rebuilt = build(&catalog).unwrap();
        assert_eq!(first, rebuilt.recommend(&catalog, "Atomic Habits", 5).unwrap());
    }

    #[tokio::test]
    async fn test_engine_builds_lazily_once() {
        let engine = Arc::new(engine(sample_catalog()));
        assert!(!engine.is_built());
        assert!(!engine.status().built);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.model().await.unwrap() })
            })
            .collect();

        let mut models = Vec::new();
        for handle in handles {
            models.push(handle.await.unwrap());
        }

        assert!(engine.is_built());
        assert!(models.iter().all(|m| Arc::ptr_eq(m, &models[0])));

        let status = engine.status();
        assert!(status.built);
        assert_eq!(status.documents, 6);
        assert!(status.vocabulary_size.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_engine_surfaces_build_failure_and_stays_unbuilt() {
        let engine = engine(Catalog::default());

        let err = engine.warm_up().await.unwrap_err();
        assert!(matches!(err, AppError::DataSource(_)));
        assert!(!engine.is_built());
    }

    #[tokio::test]
    async fn test_engine_unknown_title_does_not_build() {
        let engine = engine(sample_catalog());

        let err = engine.recommend("Dune", 3).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownTitle(_)));
        assert!(!engine.is_built());
    }

    #[tokio::test]
    async fn test_strategy_yields_scored_recommendations() {
        let engine = engine(sample_catalog());

        let recs = engine.similar("Atomic Habits", 5).await.unwrap();
        assert_eq!(recs.len(), 5);
        assert!(recs.iter().all(|r| r.score.is_some()));
        assert_eq!(engine.name(), "content");
    }
}
