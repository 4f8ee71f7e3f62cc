//! Router tests against the sample catalog snapshot.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use carlist_rust::{
    catalog_api::{Catalog, CatalogSnapshot},
    config::Settings,
    routes::create_router,
    AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SAMPLE_CATALOG: &str = include_str!("../data/catalog.sample.json");

fn test_app() -> Router {
    let settings = Settings {
        server_address: "127.0.0.1:0".into(),
        catalog_api_url: None,
        catalog_file: Some("data/catalog.sample.json".into()),
        default_page_size: 12,
        max_page_size: 50,
        max_compare: 3,
    };
    let snapshot = CatalogSnapshot::from_json_str(SAMPLE_CATALOG).expect("sample catalog parses");
    create_router(AppState {
        settings: Arc::new(settings),
        catalog: Catalog::Snapshot(Arc::new(snapshot)),
    })
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = test_app().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

async fn get(uri: &str) -> (StatusCode, Value) {
    send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

fn item_ids(page: &Value) -> Vec<i64> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|car| car["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn lists_brands() {
    let (status, body) = get("/api/brands").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
    assert_eq!(body[3]["id"], json!(7));
}

#[tokio::test]
async fn resolves_brand_by_slug_and_by_id() {
    let (status, body) = get("/api/brands/land-rover").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brand"], json!({ "id": 8, "name": "Land Rover" }));
    assert_eq!(body["details"]["backgroundImage"], json!("/images/brands/land-rover-bg.jpg"));

    let (_, by_id) = get("/api/brands/3?brandName=Hyundai").await;
    assert_eq!(by_id["brand"]["name"], json!("Tata"));
}

#[tokio::test]
async fn unknown_brand_name_falls_back_to_name_identity() {
    let (status, body) = get("/api/brands/mahindra").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brand"], json!({ "id": null, "name": "mahindra" }));
    assert_eq!(body["details"], Value::Null);
}

#[tokio::test]
async fn brand_page_includes_name_only_records() {
    let (status, page) = get("/api/brands/tata/cars").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_ids(&page), vec![1, 5, 7]);

    let (_, sorted) = get("/api/brands/3/cars?sort=price-desc").await;
    assert_eq!(item_ids(&sorted), vec![1, 7, 5]);

    let (_, petrol) = get("/api/brands/tata/cars?fuelType=Petrol").await;
    assert_eq!(item_ids(&petrol), vec![5]);
}

#[tokio::test]
async fn lists_cars_with_query_filters() {
    let (status, page) = get("/api/cars?brand=3&minPrice=10000&maxPrice=25000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_ids(&page), vec![1, 5, 7]);

    let (_, suv) = get("/api/cars?bodyType=SUV&transmission=Automatic").await;
    assert_eq!(item_ids(&suv), vec![3, 6]);

    let (_, years) = get("/api/cars?yearMin=2021&yearMax=2022&sort=year-desc").await;
    assert_eq!(item_ids(&years), vec![1, 2]);

    let (_, nothing) = get("/api/cars?year=2099").await;
    assert_eq!(nothing["total"], json!(0));
}

#[tokio::test]
async fn malformed_price_is_excluded_only_by_price_filters() {
    let (_, all) = get("/api/cars?bodyType=SUV").await;
    assert!(item_ids(&all).contains(&6));

    let (_, priced) = get("/api/cars?bodyType=SUV&maxPrice=1000000").await;
    assert!(!item_ids(&priced).contains(&6));
}

#[tokio::test]
async fn pages_and_clamps_page_size() {
    let (_, first) = get("/api/cars?pageSize=3").await;
    assert_eq!(item_ids(&first), vec![1, 2, 3]);
    assert_eq!(first["total"], json!(7));
    assert_eq!(first["totalPages"], json!(3));

    let (_, past_end) = get("/api/cars?pageSize=3&page=4").await;
    assert_eq!(item_ids(&past_end), Vec::<i64>::new());

    let (_, clamped) = get("/api/cars?pageSize=1000").await;
    assert_eq!(clamped["pageSize"], json!(50));
}

#[tokio::test]
async fn search_applies_json_filters() {
    let (status, page) = post_json(
        "/api/search",
        json!({ "filters": { "brand": "3", "priceRange": [10000, 25000] }, "sort": "price-desc" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_ids(&page), vec![1, 5]);

    let (_, ev) = post_json("/api/search", json!({ "filters": { "fuelType": "Electric" } })).await;
    assert_eq!(item_ids(&ev), vec![7]);
}

#[tokio::test]
async fn search_with_non_string_text_filter_matches_nothing() {
    let (status, page) = post_json("/api/search", json!({ "filters": { "fuelType": 5 } })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], json!(0));

    let (status, by_id) = post_json(
        "/api/search",
        json!({ "filters": { "brand": "3", "brandName": 3 } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_ids(&by_id), vec![1, 5]);
}

#[tokio::test]
async fn search_reads_paging_from_strings() {
    let (status, page) = post_json(
        "/api/search",
        json!({ "filters": {}, "page": "2", "pageSize": "3" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_ids(&page), vec![4, 5, 6]);
    assert_eq!(page["page"], json!(2));

    let (_, fallback) = post_json("/api/search", json!({ "page": "two", "pageSize": -1 })).await;
    assert_eq!(fallback["page"], json!(1));
    assert_eq!(fallback["pageSize"], json!(12));
}

#[tokio::test]
async fn search_resolves_navigation_brand() {
    let (_, page) = post_json(
        "/api/search",
        json!({ "filters": {}, "navigationBrand": { "id": "4", "name": "Hyundai" } }),
    )
    .await;
    assert_eq!(item_ids(&page), vec![2]);
}

#[tokio::test]
async fn gets_single_car() {
    let (status, car) = get("/api/cars/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(car["model"], json!("Seltos"));
    assert_eq!(car["sunroof"], json!(true));

    let (missing, _) = get("/api/cars/99").await;
    assert_eq!(missing, StatusCode::NOT_FOUND);

    let (bad, body) = get("/api/cars/seltos").await;
    assert_eq!(bad, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn filter_facets_for_a_brand() {
    let (status, facets) = get("/api/filters?brandName=tata").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(facets["fuelTypes"], json!(["Diesel", "Electric", "Petrol"]));
    assert_eq!(facets["years"], json!([2023, 2022]));
    assert_eq!(facets["priceBounds"], json!({ "min": 11000.0, "max": 20000.0 }));
}

#[tokio::test]
async fn compares_selected_cars() {
    let (status, comparison) = get("/api/compare?ids=2,1,42").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = comparison["cars"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(comparison["missing"], json!([42]));
    assert!(comparison["differing"].as_array().unwrap().contains(&json!("engine")));

    let (too_many, _) = get("/api/compare?ids=1,2,3,4").await;
    assert_eq!(too_many, StatusCode::BAD_REQUEST);

    let (empty, _) = get("/api/compare").await;
    assert_eq!(empty, StatusCode::BAD_REQUEST);
}
