use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{BookRecord, Catalog, Recommendation},
};

use super::SimilarityStrategy;

/// Title to hand-picked similar titles, in the curator's order
pub type CuratedTable = HashMap<String, Vec<String>>;

/// Recommender answering from a hand-authored adjacency table
///
/// The table is opaque authored data: no score is attached and the stored
/// order is returned as-is.
pub struct CuratedLookup {
    catalog: Arc<Catalog>,
    table: CuratedTable,
}

impl CuratedLookup {
    /// Creates a lookup over `catalog`, rejecting tables that name books the
    /// catalog does not hold or that list a book as similar to itself.
    pub fn new(catalog: Arc<Catalog>, table: CuratedTable) -> AppResult<Self> {
        for (title, similar) in &table {
            if !catalog.contains(title) {
                return Err(AppError::DataSource(format!(
                    "curated table entry '{}' is not in the catalog",
                    title
                )));
            }
            if let Some(missing) = similar.iter().find(|t| !catalog.contains(t)) {
                return Err(AppError::DataSource(format!(
                    "curated neighbour '{}' of '{}' is not in the catalog",
                    missing, title
                )));
            }
            if similar.contains(title) {
                return Err(AppError::DataSource(format!(
                    "curated table lists '{}' as similar to itself",
                    title
                )));
            }
        }

        tracing::info!(entries = table.len(), "Curated table loaded");

        Ok(Self { catalog, table })
    }

    /// Reads a curated table from a JSON object of `title -> [titles]`
    pub fn read_table(path: &Path) -> AppResult<CuratedTable> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::DataSource(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            AppError::DataSource(format!("invalid curated table {}: {}", path.display(), e))
        })
    }

    /// Curated neighbours of `title`, truncated to `k`
    pub fn similar_to(&self, title: &str, k: usize) -> AppResult<Vec<BookRecord>> {
        let similar = self
            .table
            .get(title)
            .ok_or_else(|| AppError::UnknownTitle(title.to_string()))?;

        Ok(similar
            .iter()
            .filter_map(|t| self.catalog.find(t))
            .take(k)
            .cloned()
            .collect())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[async_trait::async_trait]
impl SimilarityStrategy for CuratedLookup {
    async fn similar(&self, title: &str, k: usize) -> AppResult<Vec<Recommendation>> {
        Ok(self
            .similar_to(title, k)?
            .into_iter()
            .map(|book| Recommendation { book, score: None })
            .collect())
    }

    fn name(&self) -> &'static str {
        "curated"
    }
}
