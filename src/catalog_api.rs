// Access to the brand/car catalog: the storefront's REST API, or a local JSON
// snapshot of it for offline use and tests.

use cached::proc_macro::cached;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;

use crate::config::CatalogSource;
use crate::error::CatalogError;
use crate::models::{cars_from_json, value_kind, Brand, Car, Lenient};

/// In-memory copy of the catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub brands: Vec<Brand>,
    pub cars: Vec<Car>,
}

impl CatalogSnapshot {
    /// Parses `{ "brands": [...], "cars": [...] }`. Malformed car records are
    /// skipped; a malformed brand fails the load.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(raw)?;
        let brands = match value.get("brands") {
            Some(brands) => serde_json::from_value(brands.clone())?,
            None => Vec::new(),
        };
        let cars = value.get("cars").cloned().map(cars_from_json).unwrap_or_default();
        Ok(CatalogSnapshot { brands, cars })
    }

    /// Cars filed under a brand: by `brandId`, or by name for records whose
    /// brand ID is missing or unreadable.
    fn cars_of_brand(&self, brand_id: i64) -> Vec<Car> {
        let brand_name = self
            .brands
            .iter()
            .find(|b| b.id == brand_id)
            .map(|b| b.name.to_lowercase());
        self.cars
            .iter()
            .filter(|car| match car.brand_id.as_ref().and_then(Lenient::valid) {
                Some(id) => id == brand_id,
                None => match (&brand_name, car.brand.as_deref()) {
                    (Some(wanted), Some(name)) => name.to_lowercase() == *wanted,
                    _ => false,
                },
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum Catalog {
    Remote { client: Arc<Client>, base_url: String },
    Snapshot(Arc<CatalogSnapshot>),
}

impl Catalog {
    pub async fn load(source: &CatalogSource, client: Arc<Client>) -> Result<Self, CatalogError> {
        match source {
            CatalogSource::Remote(base_url) => {
                tracing::info!("Using catalog API at {}", base_url);
                Ok(Catalog::Remote {
                    client,
                    base_url: base_url.clone(),
                })
            }
            CatalogSource::Snapshot(path) => {
                let raw = tokio::fs::read_to_string(path).await?;
                let snapshot = CatalogSnapshot::from_json_str(&raw)?;
                tracing::info!(
                    "Loaded catalog snapshot from {}: {} brands, {} cars",
                    path,
                    snapshot.brands.len(),
                    snapshot.cars.len()
                );
                Ok(Catalog::Snapshot(Arc::new(snapshot)))
            }
        }
    }

    pub async fn list_brands(&self) -> Result<Vec<Brand>, CatalogError> {
        match self {
            Catalog::Remote { client, base_url } => fetch_brands(client, base_url).await,
            Catalog::Snapshot(snapshot) => Ok(snapshot.brands.clone()),
        }
    }

    /// `Ok(None)` when the brand does not exist.
    pub async fn get_brand(&self, id: i64) -> Result<Option<Brand>, CatalogError> {
        match self {
            Catalog::Remote { client, base_url } => {
                let url = format!("{}/brands/{}", base_url, id);
                match get_json(client, &url).await? {
                    Some(value) => Ok(Some(serde_json::from_value(unwrap_item(value, "brand"))?)),
                    None => Ok(None),
                }
            }
            Catalog::Snapshot(snapshot) => Ok(snapshot.brands.iter().find(|b| b.id == id).cloned()),
        }
    }

    /// All cars, or only those the catalog files under `brand_id`.
    pub async fn list_cars(&self, brand_id: Option<i64>) -> Result<Vec<Car>, CatalogError> {
        match self {
            Catalog::Remote { client, base_url } => {
                let url = match brand_id {
                    Some(id) => format!("{}/cars?brandId={}", base_url, id),
                    None => format!("{}/cars", base_url),
                };
                let value = get_json(client, &url).await?.ok_or_else(|| CatalogError::Status {
                    status: StatusCode::NOT_FOUND,
                    url: url.clone(),
                })?;
                let cars = cars_from_json(unwrap_list(value, "cars"));
                tracing::debug!("Fetched {} cars from {}", cars.len(), url);
                Ok(cars)
            }
            Catalog::Snapshot(snapshot) => Ok(match brand_id {
                Some(id) => snapshot.cars_of_brand(id),
                None => snapshot.cars.clone(),
            }),
        }
    }

    /// `Ok(None)` when the car does not exist.
    pub async fn get_car(&self, id: i64) -> Result<Option<Car>, CatalogError> {
        match self {
            Catalog::Remote { client, base_url } => {
                let url = format!("{}/cars/{}", base_url, id);
                match get_json(client, &url).await? {
                    Some(value) => Ok(Some(serde_json::from_value(unwrap_item(value, "car"))?)),
                    None => Ok(None),
                }
            }
            Catalog::Snapshot(snapshot) => Ok(snapshot.cars.iter().find(|c| c.id == id).cloned()),
        }
    }
}

// The brand directory changes rarely (admin edits only); keep it for 5 minutes per API.
#[cached(
    time = 300,
    result = true,
    key = "String",
    convert = r#"{ base_url.to_string() }"#
)]
async fn fetch_brands(client: &Client, base_url: &str) -> Result<Vec<Brand>, CatalogError> {
    let url = format!("{}/brands", base_url);
    let value = get_json(client, &url).await?.ok_or_else(|| CatalogError::Status {
        status: StatusCode::NOT_FOUND,
        url: url.clone(),
    })?;
    let brands: Vec<Brand> = serde_json::from_value(unwrap_list(value, "brands"))?;
    tracing::info!("Fetched {} brands from catalog API", brands.len());
    Ok(brands)
}

// GET a JSON document. 404 is `None`; other non-success statuses are errors.
async fn get_json(client: &Client, url: &str) -> Result<Option<Value>, CatalogError> {
    tracing::debug!(url, "Catalog request");
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        tracing::debug!(url, "Catalog returned 404");
        return Ok(None);
    }
    if !status.is_success() {
        tracing::warn!(url, status = %status, "Catalog returned an error status");
        return Err(CatalogError::Status {
            status,
            url: url.to_string(),
        });
    }

    Ok(Some(response.json::<Value>().await?))
}

// List endpoints answer either a bare array or an envelope such as
// `{ "data": [...] }` / `{ "cars": [...] }`.
fn unwrap_list(value: Value, key: &str) -> Value {
    match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove("data")
            .or_else(|| map.remove(key))
            .unwrap_or_else(|| {
                tracing::warn!("No '{}' list in catalog response envelope", key);
                Value::Array(Vec::new())
            }),
        other => {
            tracing::warn!("Unexpected {} in place of a '{}' list", value_kind(&other), key);
            Value::Array(Vec::new())
        }
    }
}

// Single-item endpoints answer the record itself or `{ "data": {...} }`.
fn unwrap_item(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if !map.contains_key("id") => {
            map.remove("data").or_else(|| map.remove(key)).unwrap_or(Value::Object(map))
        }
        other => other,
    }
}
