use std::sync::Arc;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{Catalog, Strategy},
    services::{
        catalog::{load_catalog, CatalogSource, CsvCatalogSource, CsvColumns, StaticCatalogSource},
        CuratedLookup, ModelOptions, SimilarityEngine, SimilarityStrategy,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<AppStateInner>,
}

/// Read-only state built once at startup
pub struct AppStateInner {
    pub catalog: Arc<Catalog>,
    pub curated: Option<Arc<CuratedLookup>>,
    pub content: Arc<SimilarityEngine>,
    pub default_strategy: Strategy,
    pub limits: Limits,
}

/// Defaults and bounds for query parameters
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub popular: usize,
    pub curated_k: usize,
    pub content_k: usize,
    pub max_k: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            popular: 50,
            curated_k: 3,
            content_k: 5,
            max_k: 100,
        }
    }
}

impl From<&Config> for Limits {
    fn from(config: &Config) -> Self {
        Self {
            popular: config.popular_limit,
            curated_k: config.curated_k,
            content_k: config.content_k,
            max_k: config.max_k,
        }
    }
}

impl AppState {
    /// Creates state over the built-in catalog and its curated table
    pub fn new() -> AppResult<Self> {
        let catalog = Arc::new(StaticCatalogSource::catalog());
        let curated = CuratedLookup::new(catalog.clone(), StaticCatalogSource::curated_table())?;
        Ok(Self::from_parts(
            catalog,
            Some(curated),
            ModelOptions::default(),
            None,
            Limits::default(),
        ))
    }

    /// Assembles state from an already loaded catalog
    pub fn from_parts(
        catalog: Arc<Catalog>,
        curated: Option<CuratedLookup>,
        options: ModelOptions,
        default_strategy: Option<Strategy>,
        limits: Limits,
    ) -> Self {
        let default_strategy = default_strategy.unwrap_or(if curated.is_some() {
            Strategy::Curated
        } else {
            Strategy::Content
        });

        Self {
            inner: Arc::new(AppStateInner {
                content: Arc::new(SimilarityEngine::new(catalog.clone(), options)),
                curated: curated.map(Arc::new),
                catalog,
                default_strategy,
                limits,
            }),
        }
    }

    /// Loads the catalog and curated table named by `config`.
    ///
    /// Any catalog or table problem fails here, before the server accepts
    /// queries. With `eager_build` the content model is built as well.
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        config
            .validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let source: Box<dyn CatalogSource> = match &config.catalog_path {
            Some(path) => {
                let delimiter = config
                    .delimiter()
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                Box::new(CsvCatalogSource::new(
                    path.clone(),
                    delimiter,
                    CsvColumns {
                        title: config.title_column.clone(),
                        author: config.author_column.clone(),
                        image: config.image_column.clone(),
                    },
                ))
            }
            None => Box::new(StaticCatalogSource::new()),
        };

        let catalog = Arc::new(load_catalog(source.as_ref()).await?);

        let table = match (&config.curated_table_path, &config.catalog_path) {
            (Some(path), _) => Some(CuratedLookup::read_table(path)?),
            (None, None) => Some(StaticCatalogSource::curated_table()),
            (None, Some(_)) => None,
        };
        let curated = table
            .map(|table| CuratedLookup::new(catalog.clone(), table))
            .transpose()?;

        if curated.is_none() && config.default_strategy == Some(Strategy::Curated) {
            return Err(AppError::InvalidInput(
                "DEFAULT_STRATEGY is curated but no curated table is configured".to_string(),
            ));
        }

        let state = Self::from_parts(
            catalog,
            curated,
            config.model_options(),
            config.default_strategy,
            Limits::from(config),
        );

        if config.eager_build {
            state.inner.content.warm_up().await?;
        }

        Ok(state)
    }

    /// Strategy implementation for `strategy`
    pub fn strategy(&self, strategy: Strategy) -> AppResult<Arc<dyn SimilarityStrategy>> {
        match strategy {
            Strategy::Curated => self
                .inner
                .curated
                .clone()
                .map(|lookup| lookup as Arc<dyn SimilarityStrategy>)
                .ok_or_else(|| {
                    AppError::InvalidInput("curated strategy is not configured".to_string())
                }),
            Strategy::Content => Ok(self.inner.content.clone() as Arc<dyn SimilarityStrategy>),
        }
    }

    /// Default `k` for `strategy`
    pub fn default_k(&self, strategy: Strategy) -> usize {
        match strategy {
            Strategy::Curated => self.inner.limits.curated_k,
            Strategy::Content => self.inner.limits.content_k,
        }
    }
}
