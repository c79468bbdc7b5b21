mod url;

pub use url::{CreateUrlRequest, ErrorResponse, HealthResponse, UrlResponse};
