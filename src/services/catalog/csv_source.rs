use std::io::Read;
use std::path::PathBuf;

use crate::{
    error::{AppError, AppResult},
    models::{BookRecord, Catalog},
};

use super::CatalogSource;

/// Header names of the columns read from the catalog file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvColumns {
    pub title: String,
    pub author: String,
    pub image: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            title: "Book-Title".to_string(),
            author: "Book-Author".to_string(),
            image: "Image-URL-M".to_string(),
        }
    }
}

/// Catalog source backed by a delimited file with a header row
#[derive(Debug, Clone)]
pub struct CsvCatalogSource {
    path: PathBuf,
    delimiter: u8,
    columns: CsvColumns,
}

impl CsvCatalogSource {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8, columns: CsvColumns) -> Self {
        Self {
            path: path.into(),
            delimiter,
            columns,
        }
    }

    /// Parses catalog rows from any reader.
    ///
    /// Short rows and empty cells yield empty strings; a missing column in
    /// the header is an error.
    pub fn parse<R: Read>(reader: R, delimiter: u8, columns: &CsvColumns) -> AppResult<Catalog> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let column_index = |name: &str| -> AppResult<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    AppError::DataSource(format!(
                        "missing column '{}', available columns: {:?}",
                        name,
                        headers.iter().collect::<Vec<_>>()
                    ))
                })
        };

        let title_idx = column_index(&columns.title)?;
        let author_idx = column_index(&columns.author)?;
        let image_idx = column_index(&columns.image)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let field = |idx: usize| row.get(idx).unwrap_or("").to_string();
            records.push(BookRecord::new(
                field(title_idx),
                field(author_idx),
                field(image_idx),
            ));
        }

        tracing::debug!(rows = records.len(), "Catalog rows read");

        Ok(Catalog::from_records(records))
    }

    fn read_file(&self) -> AppResult<Catalog> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            AppError::DataSource(format!("failed to open {}: {}", self.path.display(), e))
        })?;
        Self::parse(file, self.delimiter, &self.columns)
    }
}

#[async_trait::async_trait]
impl CatalogSource for CsvCatalogSource {
    async fn load(&self) -> AppResult<Catalog> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.read_file()).await?
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(data: &str, delimiter: u8) -> AppResult<Catalog> {
        CsvCatalogSource::parse(data.as_bytes(), delimiter, &CsvColumns::default())
    }

    #[test]
    fn test_parse_reads_configured_columns() {
        let data = "ISBN,Book-Title,Book-Author,Year,Image-URL-M\n\
                    1,Dune,Frank Herbert,1965,dune.jpg\n\
                    2,Emma,Jane Austen,1815,emma.jpg\n";

        let catalog = parse(data, b',').unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get(0).unwrap(),
            &BookRecord::new("Dune", "Frank Herbert", "dune.jpg")
        );
        assert_eq!(catalog.get(1).unwrap().cover_ref, "emma.jpg");
    }

    #[test]
    fn test_parse_fills_missing_fields_with_empty_strings() {
        let data = "Book-Title;Book-Author;Image-URL-M\n\
                    Dune;;dune.jpg\n\
                    Emma\n";

        let catalog = parse(data, b';').unwrap();

        assert_eq!(catalog.find("Dune").unwrap().author, "");
        let emma = catalog.find("Emma").unwrap();
        assert_eq!(emma.author, "");
        assert_eq!(emma.cover_ref, "");
    }

    #[test]
    fn test_parse_deduplicates_and_drops_blank_titles() {
        let data = "Book-Title,Book-Author,Image-URL-M\n\
                    Dune,Frank Herbert,a.jpg\n\
                    ,Anonymous,b.jpg\n\
                    Dune,Brian Herbert,c.jpg\n";

        let catalog = parse(data, b',').unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find("Dune").unwrap().cover_ref, "a.jpg");
    }

    #[test]
    fn test_parse_rejects_missing_column() {
        let data = "Title,Author\nDune,Frank Herbert\n";

        let err = parse(data, b',').unwrap_err();

        assert!(matches!(err, AppError::DataSource(msg) if msg.contains("Book-Title")));
    }

    #[test]
    fn test_parse_uses_custom_column_names() {
        let data = "name,writer,cover\nDune,Frank Herbert,dune.jpg\n";
        let columns = CsvColumns {
            title: "name".to_string(),
            author: "writer".to_string(),
            image: "cover".to_string(),
        };

        let catalog = CsvCatalogSource::parse(data.as_bytes(), b',', &columns).unwrap();
        assert_eq!(catalog.find("Dune").unwrap().author, "Frank Herbert");
    }

    #[tokio::test]
    async fn test_load_reads_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "Book-Title,Book-Author,Image-URL-M").expect("write header");
        writeln!(file, "The Hobbit,J.R.R. Tolkien,hobbit.jpg").expect("write row");
        writeln!(file, "\"Dune, Deluxe\",Frank Herbert,dune.jpg").expect("write row");

        let source = CsvCatalogSource::new(file.path(), b',', CsvColumns::default());
        let catalog = source.load().await.unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("Dune, Deluxe"));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_data_source_error() {
        let source = CsvCatalogSource::new("/nonexistent/books.csv", b',', CsvColumns::default());

        let err = source.load().await.unwrap_err();
        assert!(matches!(err, AppError::DataSource(_)));
    }
}
