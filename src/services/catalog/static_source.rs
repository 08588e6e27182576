use crate::{
    error::AppResult,
    models::{BookRecord, Catalog},
    services::curated::CuratedTable,
};

use super::CatalogSource;

/// Built-in catalog: (title, author, cover image)
const BOOKS: &[(&str, &str, &str)] = &[
    (
        "The Alchemist",
        "Paulo Coelho",
        "https://m.media-amazon.com/images/I/71aFt4+OTOL.jpg",
    ),
    (
        "Harry Potter",
        "J.K. Rowling",
        "https://m.media-amazon.com/images/I/81YOuOGFCJL.jpg",
    ),
    (
        "The Power of Habit",
        "Charles Duhigg",
        "https://m.media-amazon.com/images/I/91bYsX41DVL.jpg",
    ),
    (
        "Atomic Habits",
        "James Clear",
        "https://m.media-amazon.com/images/I/81wgcld4wxL.jpg",
    ),
    (
        "Rich Dad Poor Dad",
        "Robert Kiyosaki",
        "https://m.media-amazon.com/images/I/81bsw6fnUiL.jpg",
    ),
    (
        "The Hobbit",
        "J.R.R. Tolkien",
        "https://m.media-amazon.com/images/I/91b0C2YNSrL.jpg",
    ),
];

/// Curated neighbours for the built-in catalog
const CURATED: &[(&str, [&str; 3])] = &[
    ("The Alchemist", ["The Hobbit", "Atomic Habits", "Rich Dad Poor Dad"]),
    ("Harry Potter", ["The Hobbit", "The Alchemist", "Atomic Habits"]),
    (
        "The Power of Habit",
        ["Atomic Habits", "Rich Dad Poor Dad", "The Alchemist"],
    ),
    (
        "Atomic Habits",
        ["The Power of Habit", "Rich Dad Poor Dad", "The Alchemist"],
    ),
    (
        "Rich Dad Poor Dad",
        ["The Power of Habit", "Atomic Habits", "The Alchemist"],
    ),
    ("The Hobbit", ["Harry Potter", "The Alchemist", "Atomic Habits"]),
];

/// Catalog source serving the built-in book table
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource;

impl StaticCatalogSource {
    pub fn new() -> Self {
        Self
    }

    /// The built-in catalog, in curation order
    pub fn catalog() -> Catalog {
        Catalog::from_records(
            BOOKS
                .iter()
                .map(|(title, author, cover)| BookRecord::new(*title, *author, *cover)),
        )
    }

    /// Curated neighbours matching the built-in catalog
    pub fn curated_table() -> CuratedTable {
        CURATED
            .iter()
            .map(|(title, similar)| {
                (
                    title.to_string(),
                    similar.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn load(&self) -> AppResult<Catalog> {
        Ok(Self::catalog())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
