use crate::error::{AppError, Result};
use crate::model::{CreateUrlRequest, UrlResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::Json;
use keyhole_shortener::{ShortKey, ShortenerError};
use tracing::warn;

pub async fn create_url_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<Json<UrlResponse>> {
    let Json(request) = request.map_err(|e| AppError::unprocessable(e.body_text()))?;

    match state
        .shortener()
        .shorten_and_persist(&request.long_url)
        .await
    {
        Ok(record) => Ok(Json(record.into())),
        // The binding is durable; only the cache is cold.
        Err(ShortenerError::CacheWarm { record, source }) => {
            warn!(key = %record.short_key, error = %source, "Serving record with cold cache");
            Ok(Json(record.into()))
        }
        Err(e) => Err(AppError::from_shorten(e)),
    }
}

pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(short_url): Path<String>,
) -> Result<Redirect> {
    let key = ShortKey::new(short_url)
        .map_err(|e| AppError::from_resolve(ShortenerError::from(e)))?;

    let long_url = state
        .shortener()
        .resolve(&key)
        .await
        .map_err(AppError::from_resolve)?;

    Ok(Redirect::temporary(&long_url))
}
