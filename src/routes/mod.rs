mod tokens;

pub use tokens::{issue_tokens, refresh_tokens};

use actix_web::HttpResponse;

/// GET /health_check
pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check requested");
    HttpResponse::Ok().finish()
}
