//! Catalog source abstraction
//!
//! A source produces the ordered, title-unique book catalog the recommenders
//! work on. The built-in source serves a fixed table; the file source reads a
//! delimited export.

use crate::{error::AppResult, models::Catalog};

pub mod csv_source;
pub mod static_source;

pub use csv_source::{CsvCatalogSource, CsvColumns};
pub use static_source::StaticCatalogSource;

/// Trait for catalog sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Load the full catalog.
    ///
    /// Fails with `AppError::DataSource` when the backing data cannot be read
    /// or does not have the expected shape.
    async fn load(&self) -> AppResult<Catalog>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Loads the catalog and rejects an empty result
pub async fn load_catalog(source: &dyn CatalogSource) -> AppResult<Catalog> {
    let catalog = source.load().await?;

    if catalog.is_empty() {
        return Err(crate::error::AppError::DataSource(format!(
            "catalog source '{}' produced no books",
            source.name()
        )));
    }

    tracing::info!(
        source = source.name(),
        books = catalog.len(),
        "Catalog loaded"
    );

    Ok(catalog)
}
