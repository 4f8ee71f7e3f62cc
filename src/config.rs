// Application settings, loaded with the `config` crate and `.env` support.

use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_address: String,
    /// Base URL of the catalog API (brands/cars), e.g. `http://localhost:5000/api`.
    pub catalog_api_url: Option<String>,
    /// Local JSON snapshot `{ "brands": [...], "cars": [...] }`; wins over the API.
    pub catalog_file: Option<String>,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub max_compare: usize,
}

/// Where car and brand data come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Remote(String),
    Snapshot(String),
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Config::builder()
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("default_page_size", 12)?
            .set_default("max_page_size", 100)?
            .set_default("max_compare", 4)?
            // Optional config.toml next to the binary
            .add_source(File::with_name("config").required(false))
            // APP_CATALOG_API_URL, APP_DEFAULT_PAGE_SIZE, ...
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.catalog_source()?;
        Ok(settings)
    }

    pub fn catalog_source(&self) -> Result<CatalogSource> {
        let non_empty = |v: &Option<String>| v.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        match (non_empty(&self.catalog_file), non_empty(&self.catalog_api_url)) {
            (Some(path), api) => {
                if api.is_some() {
                    tracing::warn!("Both catalog_file and catalog_api_url are set; using catalog_file");
                }
                Ok(CatalogSource::Snapshot(path))
            }
            (None, Some(url)) => Ok(CatalogSource::Remote(url.trim_end_matches('/').to_string())),
            (None, None) => bail!("Either catalog_api_url or catalog_file must be configured"),
        }
    }

    /// Page size to use for a request, clamped to `max_page_size`.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|size| *size > 0)
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }
}
