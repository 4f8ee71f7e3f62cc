// Route definitions

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::AppState;

mod api;

// create_router takes the AppState and returns a Router with the state applied
pub fn create_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route("/brands", get(api::list_brands))
        .route("/brands/:brand", get(api::get_brand))
        .route("/brands/:brand/cars", get(api::brand_cars))
        .route("/cars", get(api::list_cars))
        .route("/cars/:id", get(api::get_car))
        .route("/search", post(api::search_cars))
        .route("/filters", get(api::get_filters))
        .route("/compare", get(api::compare))
        .with_state(app_state);

    Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
}
