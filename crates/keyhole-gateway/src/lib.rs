//! HTTP front end for the keyhole shortener.
//!
//! `POST /url` shortens, `GET /{short_url}` redirects and `GET /health`
//! reports liveness.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use error::AppError;
pub use state::AppState;
