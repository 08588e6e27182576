use crate::{error::AppResult, models::Recommendation};

pub mod catalog;
pub mod curated;
pub mod similarity;
pub mod tfidf;

pub use curated::{CuratedLookup, CuratedTable};
pub use similarity::{ModelOptions, SimilarityEngine, SimilarityModel};

/// Trait for recommendation strategies
///
/// Implementations answer "which books are similar to this one" over a catalog
/// fixed at construction. Titles missing from the strategy's data fail with
/// `AppError::UnknownTitle`; the query title itself is never returned.
#[async_trait::async_trait]
pub trait SimilarityStrategy: Send + Sync {
    /// Up to `k` books similar to `title`, best match first
    async fn similar(&self, title: &str, k: usize) -> AppResult<Vec<Recommendation>>;

    /// Strategy name for logging
    fn name(&self) -> &'static str;
}
