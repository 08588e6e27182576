use std::path::PathBuf;

use serde::Deserialize;

use crate::{models::Strategy, services::ModelOptions};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Delimited catalog file. When unset the built-in catalog is served.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Field delimiter of the catalog file (single byte)
    #[serde(default = "default_delimiter")]
    pub catalog_delimiter: String,

    #[serde(default = "default_title_column")]
    pub title_column: String,

    #[serde(default = "default_author_column")]
    pub author_column: String,

    #[serde(default = "default_image_column")]
    pub image_column: String,

    /// JSON object mapping a title to its curated neighbours
    #[serde(default)]
    pub curated_table_path: Option<PathBuf>,

    /// Vocabulary cap for the content model
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// Largest catalog the content model is built for
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,

    /// Build the content model at startup instead of on first query
    #[serde(default = "default_eager_build")]
    pub eager_build: bool,

    /// Strategy used when a request does not name one
    #[serde(default)]
    pub default_strategy: Option<Strategy>,

    /// Number of books returned by the popular listing when no limit is given
    #[serde(default = "default_popular_limit")]
    pub popular_limit: usize,

    #[serde(default = "default_curated_k")]
    pub curated_k: usize,

    #[serde(default = "default_content_k")]
    pub content_k: usize,

    /// Upper bound accepted for `k` and `limit` query parameters
    #[serde(default = "default_max_k")]
    pub max_k: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_title_column() -> String {
    "Book-Title".to_string()
}

fn default_author_column() -> String {
    "Book-Author".to_string()
}

fn default_image_column() -> String {
    "Image-URL-M".to_string()
}

fn default_max_features() -> usize {
    4000
}

fn default_max_documents() -> usize {
    5000
}

fn default_eager_build() -> bool {
    true
}

fn default_popular_limit() -> usize {
    50
}

fn default_curated_k() -> usize {
    3
}

fn default_content_k() -> usize {
    5
}

fn default_max_k() -> usize {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            catalog_path: None,
            catalog_delimiter: default_delimiter(),
            title_column: default_title_column(),
            author_column: default_author_column(),
            image_column: default_image_column(),
            curated_table_path: None,
            max_features: default_max_features(),
            max_documents: default_max_documents(),
            eager_build: default_eager_build(),
            default_strategy: None,
            popular_limit: default_popular_limit(),
            curated_k: default_curated_k(),
            content_k: default_content_k(),
            max_k: default_max_k(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but cannot be served
    pub fn validate(&self) -> anyhow::Result<()> {
        self.delimiter()?;
        if self.max_features == 0 {
            anyhow::bail!("MAX_FEATURES must be greater than zero");
        }
        if self.max_documents == 0 {
            anyhow::bail!("MAX_DOCUMENTS must be greater than zero");
        }
        Ok(())
    }

    /// Limits for building the content model
    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            max_features: self.max_features,
            max_documents: self.max_documents,
        }
    }

    /// Catalog delimiter as a single byte
    pub fn delimiter(&self) -> anyhow::Result<u8> {
        match self.catalog_delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(anyhow::anyhow!(
                "CATALOG_DELIMITER must be a single byte, got {:?}",
                self.catalog_delimiter
            )),
        }
    }

    /// Address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
