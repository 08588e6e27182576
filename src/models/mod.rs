use serde::{Deserialize, Serialize};
use std::fmt::Display;

mod book;

pub use book::{BookRecord, Catalog};

/// Recommendation strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Hand-authored adjacency table
    Curated,
    /// TF-IDF cosine similarity over title and author
    Content,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Curated => write!(f, "curated"),
            Strategy::Content => write!(f, "content"),
        }
    }
}

/// A recommended book, with a score when the strategy produces one
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    #[serde(flatten)]
    pub book: BookRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Response for a recommendation query
#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub title: String,
    pub strategy: Strategy,
    pub recommendations: Vec<Recommendation>,
}

/// Build status of the content model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimilarityStatus {
    pub built: bool,
    pub documents: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocabulary_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub built_at: Option<chrono::DateTime<chrono::Utc>>,
}
