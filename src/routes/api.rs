// Handlers for the storefront API endpoints

use axum::{
    extract::{Json as JsonExtract, Path, Query, State},
    response::{IntoResponse, Json},
};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::{
    brand_resolver::{resolve_brand, BrandQuery},
    catalog_api::Catalog,
    compare::{check_selection, compare_cars, parse_ids},
    error::{AppError, AppResult},
    facets::collect_facets,
    filters::{CarQuery, FilterSpec},
    listing::{page_of, SortKey},
    matcher::match_cars,
    models::{lenient, Brand, BrandIdentity, Car, Lenient, NavigationBrand},
    AppState,
};

// --- Response Wrappers ---

#[derive(Serialize)]
struct BrandResponse {
    brand: BrandIdentity,
    details: Option<Brand>,
}

// --- Request Structs ---

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BrandParams {
    #[serde(alias = "brand")]
    brand_id: Option<String>,
    brand_name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    filters: FilterSpec,
    sort: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    page: Option<Lenient<i64>>,
    #[serde(default, deserialize_with = "lenient::optional")]
    page_size: Option<Lenient<i64>>,
    /// Brand handed over by the page the shopper came from.
    navigation_brand: Option<NavigationBrand>,
}

#[derive(Deserialize, Debug)]
pub struct CompareQuery {
    ids: Option<String>,
}

// --- Helpers ---

fn brand_not_found(raw: &str) -> AppError {
    AppError::NotFound(format!("Brand '{}' not found", raw))
}

// Resolves the brand against the directory, then lets the catalog narrow the
// car list by ID when one is known. Without any brand information the
// directory is not needed.
async fn brand_scoped_cars(
    catalog: &Catalog,
    query: &BrandQuery,
) -> AppResult<(Option<BrandIdentity>, Vec<Car>)> {
    if *query == BrandQuery::default() {
        return Ok((None, catalog.list_cars(None).await?));
    }
    let directory = catalog.list_brands().await?;
    let identity = resolve_brand(query, &directory);
    let cars = catalog.list_cars(identity.as_ref().and_then(|i| i.id)).await?;
    Ok((identity, cars))
}

// Page numbers in a JSON body: numbers or numeric strings, anything else ignored.
fn count(value: Option<&Lenient<i64>>) -> Option<usize> {
    value
        .and_then(Lenient::valid)
        .and_then(|n| usize::try_from(n).ok())
}

fn with_brand(filters: FilterSpec, identity: Option<&BrandIdentity>) -> FilterSpec {
    match identity {
        Some(identity) => filters.merged_with(FilterSpec::for_brand(identity)),
        None => filters,
    }
}

// --- API Handlers ---

pub async fn list_brands(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    tracing::info!("[HANDLER] /api/brands - Request received.");
    let brands = app_state.catalog.list_brands().await?;
    tracing::info!("[HANDLER] /api/brands - Returning {} brands.", brands.len());
    Ok(Json(brands))
}

// `:brand` is an ID or a slug such as `land-rover`
pub async fn get_brand(
    State(app_state): State<AppState>,
    Path(brand): Path<String>,
    Query(params): Query<BrandParams>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("[HANDLER] /api/brands/:brand - Request received for brand: {}", brand);

    let query = BrandQuery {
        route_brand_id: Some(brand.clone()),
        query_brand_id: params.brand_id,
        query_brand_name: params.brand_name,
        ..BrandQuery::default()
    };
    let directory = app_state.catalog.list_brands().await?;
    let identity = resolve_brand(&query, &directory).ok_or_else(|| brand_not_found(&brand))?;

    let details = match identity.id {
        Some(id) => app_state.catalog.get_brand(id).await?,
        None => None,
    };
    tracing::debug!("[HANDLER] /api/brands/:brand - Resolved '{}' to {:?}", brand, identity);
    Ok(Json(BrandResponse {
        brand: identity,
        details,
    }))
}

// Brand page listing: the brand comes from the route, the rest from the query.
pub async fn brand_cars(
    State(app_state): State<AppState>,
    Path(brand): Path<String>,
    Query(query): Query<CarQuery>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("[HANDLER] /api/brands/:brand/cars - Request received for brand: {}", brand);

    let brand_query = BrandQuery {
        route_brand_id: Some(brand.clone()),
        query_brand_id: query.brand.clone(),
        query_brand_name: query.brand_name.clone(),
        ..BrandQuery::default()
    };
    // The catalog narrows by ID; the matcher still applies the full brand clause.
    let (identity, cars) = brand_scoped_cars(&app_state.catalog, &brand_query).await?;
    let identity = identity.ok_or_else(|| brand_not_found(&brand))?;
    let filters = with_brand(query.filter_spec(), Some(&identity));
    let matched = match_cars(&cars, &filters);

    let page_size = app_state.settings.page_size(query.page_size());
    let page = page_of(matched, SortKey::parse(query.sort.as_deref()), query.page(), page_size);
    tracing::info!(
        "[HANDLER] /api/brands/:brand/cars - {} cars matched for {:?}, returning page {} of {}.",
        page.total,
        identity.name,
        page.page,
        page.total_pages
    );
    Ok(Json(page))
}

pub async fn list_cars(
    State(app_state): State<AppState>,
    Query(query): Query<CarQuery>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("[HANDLER] /api/cars - Request received with query: {:?}", query);

    let brand_query = BrandQuery {
        query_brand_id: query.brand.clone(),
        query_brand_name: query.brand_name.clone(),
        ..BrandQuery::default()
    };
    let (identity, cars) = brand_scoped_cars(&app_state.catalog, &brand_query).await?;
    let filters = with_brand(query.filter_spec(), identity.as_ref());
    let matched = match_cars(&cars, &filters);

    let page_size = app_state.settings.page_size(query.page_size());
    let page = page_of(matched, SortKey::parse(query.sort.as_deref()), query.page(), page_size);
    tracing::info!("[HANDLER] /api/cars - {} of {} cars matched.", page.total, cars.len());
    Ok(Json(page))
}

// JSON form of the listing query. Filters are applied exactly as given unless
// a navigation brand is supplied, in which case it is resolved first.
pub async fn search_cars(
    State(app_state): State<AppState>,
    JsonExtract(request): JsonExtract<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("[HANDLER] /api/search - Request received: {:?}", request);

    let (identity, cars) = match &request.navigation_brand {
        Some(navigation) => {
            let brand_query = BrandQuery {
                query_brand_id: request.filters.brand.as_ref().map(|brand| brand.to_string()),
                query_brand_name: request
                    .filters
                    .brand_name
                    .as_ref()
                    .and_then(Lenient::as_valid)
                    .cloned(),
                navigation_state: Some(navigation.clone()),
                ..BrandQuery::default()
            };
            brand_scoped_cars(&app_state.catalog, &brand_query).await?
        }
        None => (None, app_state.catalog.list_cars(None).await?),
    };

    let filters = with_brand(request.filters.clone(), identity.as_ref());
    let matched = match_cars(&cars, &filters);
    let page_size = app_state.settings.page_size(count(request.page_size.as_ref()));
    let page = page_of(
        matched,
        SortKey::parse(request.sort.as_deref()),
        count(request.page.as_ref()).unwrap_or(1),
        page_size,
    );
    tracing::info!("[HANDLER] /api/search - {} cars matched.", page.total);
    Ok(Json(page))
}

pub async fn get_car(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("[HANDLER] /api/cars/:id - Request received for car: {}", id);
    let car_id = match Lenient::<i64>::parse(&id) {
        Some(Lenient::Valid(car_id)) => car_id,
        _ => return Err(AppError::BadRequest(format!("Invalid car id '{}'", id))),
    };
    let car = app_state
        .catalog
        .get_car(car_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Car {} not found", car_id)))?;
    Ok(Json(car))
}

pub async fn get_filters(
    State(app_state): State<AppState>,
    Query(params): Query<BrandParams>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("[HANDLER] /api/filters - Request received: {:?}", params);

    let brand_query = BrandQuery {
        query_brand_id: params.brand_id,
        query_brand_name: params.brand_name,
        ..BrandQuery::default()
    };
    let (identity, cars) = brand_scoped_cars(&app_state.catalog, &brand_query).await?;
    let cars = match &identity {
        Some(identity) => match_cars(&cars, &FilterSpec::for_brand(identity)),
        None => cars,
    };
    Ok(Json(collect_facets(&cars)))
}

pub async fn compare(
    State(app_state): State<AppState>,
    Query(params): Query<CompareQuery>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("[HANDLER] /api/compare - Request received for ids: {:?}", params.ids);

    let ids = parse_ids(params.ids.as_deref().unwrap_or(""))?;
    check_selection(&ids, app_state.settings.max_compare)?;

    // Fetch the selected cars concurrently
    let catalog = &app_state.catalog;
    let found: Vec<Car> = try_join_all(ids.iter().map(|id| catalog.get_car(*id)))
        .await?
        .into_iter()
        .flatten()
        .collect();

    let comparison = compare_cars(&found, &ids, app_state.settings.max_compare)?;
    if !comparison.missing.is_empty() {
        tracing::warn!("[HANDLER] /api/compare - Cars not found: {:?}", comparison.missing);
    }
    Ok(Json(comparison))
}
