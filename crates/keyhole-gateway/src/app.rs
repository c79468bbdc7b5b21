use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{create_url_handler, health_handler, redirect_handler};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/url", post(create_url_handler))
            .route("/{short_url}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Browser access is limited to `origins`, for `GET` and `POST`.
    pub fn cors(origins: &[String]) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
        let origins = origins
            .iter()
            .map(|origin| HeaderValue::from_str(origin))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(AllowHeaders::mirror_request()))
    }
}
