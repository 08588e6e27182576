use std::collections::HashMap;

use serde::Serialize;

/// A single book in the catalog
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookRecord {
    /// Title of the book, unique within a catalog
    pub title: String,
    /// Author name, empty when the source had none
    pub author: String,
    /// Cover image URI or path, empty when the source had none
    pub cover_ref: String,
}

impl BookRecord {
    /// Creates a new book record
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        cover_ref: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            cover_ref: cover_ref.into(),
        }
    }

    /// Text fed to the content model: title and author joined by one space
    pub fn joined_text(&self) -> String {
        format!("{} {}", self.title, self.author)
    }
}

/// Ordered, title-unique collection of books
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: Vec<BookRecord>,
    positions: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog from records in source order.
    ///
    /// Records with a blank title are dropped and repeated titles collapse to
    /// their first occurrence.
    pub fn from_records(records: impl IntoIterator<Item = BookRecord>) -> Self {
        let mut books = Vec::new();
        let mut positions = HashMap::new();
        let mut skipped_blank = 0usize;
        let mut skipped_duplicate = 0usize;

        for record in records {
            if record.title.trim().is_empty() {
                skipped_blank += 1;
                continue;
            }
            if positions.contains_key(&record.title) {
                skipped_duplicate += 1;
                continue;
            }
            positions.insert(record.title.clone(), books.len());
            books.push(record);
        }

        if skipped_blank > 0 || skipped_duplicate > 0 {
            tracing::debug!(
                kept = books.len(),
                skipped_blank,
                skipped_duplicate,
                "Catalog records filtered"
            );
        }

        Self { books, positions }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// All books in display order
    pub fn books(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn get(&self, index: usize) -> Option<&BookRecord> {
        self.books.get(index)
    }

    /// Index of the book with the given title
    pub fn position(&self, title: &str) -> Option<usize> {
        self.positions.get(title).copied()
    }

    pub fn find(&self, title: &str) -> Option<&BookRecord> {
        self.position(title).and_then(|index| self.books.get(index))
    }

    pub fn contains(&self, title: &str) -> bool {
        self.positions.contains_key(title)
    }

    /// First `n` books in catalog order
    pub fn popular(&self, n: usize) -> &[BookRecord] {
        &self.books[..n.min(self.books.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, author: &str) -> BookRecord {
        BookRecord::new(title, author, "")
    }

    #[test]
    fn test_joined_text_uses_single_space() {
        let book = record("The Hobbit", "J.R.R. Tolkien");
        assert_eq!(book.joined_text(), "The Hobbit J.R.R. Tolkien");
    }

    #[test]
    fn test_duplicates_collapse_to_first_occurrence() {
        let catalog = Catalog::from_records(vec![
            record("Dune", "Frank Herbert"),
            record("Emma", "Jane Austen"),
            record("Dune", "Someone Else"),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find("Dune").unwrap().author, "Frank Herbert");
        assert_eq!(catalog.position("Emma"), Some(1));
    }

    #[test]
    fn test_blank_titles_are_dropped() {
        let catalog = Catalog::from_records(vec![
            record("", "Nobody"),
            record("   ", "Nobody"),
            record("Emma", "Jane Austen"),
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().title, "Emma");
    }

    #[test]
    fn test_popular_is_bounded_by_catalog_size() {
        let catalog = Catalog::from_records(vec![
            record("A Tale", "X"),
            record("B Tale", "Y"),
            record("C Tale", "Z"),
        ]);

        let titles: Vec<&str> = catalog
            .popular(2)
            .iter()
            .map(|b| b.title.as_str())
            .collect();
        assert_eq!(titles, vec!["A Tale", "B Tale"]);
        assert_eq!(catalog.popular(10).len(), 3);
        assert!(catalog.popular(0).is_empty());
    }

    #[test]
    fn test_unknown_title_has_no_position() {
        let catalog = Catalog::from_records(vec![record("Emma", "Jane Austen")]);
        assert_eq!(catalog.position("Persuasion"), None);
        assert!(!catalog.contains("Persuasion"));
    }
}
