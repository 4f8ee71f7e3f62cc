// Car listing storefront backend.
//
// The core is three pure functions over data already in memory:
// `brand_resolver::resolve_brand`, `matcher::match_cars` and
// `listing::sort_and_paginate`. Around them sit the catalog client and
// the axum API that serve the storefront.

use axum::extract::FromRef;
use std::sync::Arc;

pub mod brand_resolver;
pub mod catalog_api;
pub mod compare;
pub mod config;
pub mod error;
pub mod facets;
pub mod filters;
pub mod listing;
pub mod matcher;
pub mod models;
pub mod routes;

pub use brand_resolver::resolve_brand;
pub use listing::sort_and_paginate;
pub use matcher::match_cars;

use crate::{catalog_api::Catalog, config::Settings};

// Application state shared by every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub catalog: Catalog,
}
