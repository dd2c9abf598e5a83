/// Token Routes
///
/// Thin transport over `TokenService`: pull the credentials out of the
/// request, call the core, serialize the pair.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::TokenService;
use crate::error::RouteError;

const REFRESH_HEADER: &str = "Refresh";

/// POST /access/{user_id}
///
/// Start a new token family for `user_id`, bound to the caller's address.
///
/// # Responses
/// - 200: `{"accessToken": "...", "refreshToken": "..."}`
/// - 500: plaintext error
pub async fn issue_tokens(
    req: HttpRequest,
    user_id: web::Path<String>,
    service: web::Data<TokenService>,
) -> Result<HttpResponse, RouteError> {
    let client_address = client_address(&req);

    let pair = service
        .issue_pair(&user_id, &client_address)
        .await
        .map_err(RouteError::Issue)?;

    Ok(HttpResponse::Ok().json(pair))
}

/// POST /refresh
///
/// Rotate the refresh token of the family the access token belongs to.
///
/// # Headers
/// - `Authorization: Bearer <access_token>` (may be expired)
/// - `Refresh: <refresh_token>`
///
/// # Responses
/// - 200: `{"accessToken": "...", "refreshToken": "..."}`
/// - 500: plaintext error including the cause
pub async fn refresh_tokens(
    req: HttpRequest,
    service: web::Data<TokenService>,
) -> Result<HttpResponse, RouteError> {
    let access_token =
        bearer_token(req.headers()).ok_or(RouteError::MissingHeader("Authorization"))?;
    let refresh_token =
        header_value(req.headers(), REFRESH_HEADER).ok_or(RouteError::MissingHeader(REFRESH_HEADER))?;

    let pair = service
        .rotate(access_token, refresh_token)
        .await
        .map_err(RouteError::Refresh)?;

    Ok(HttpResponse::Ok().json(pair))
}

fn client_address(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default()
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    header_value(headers, AUTHORIZATION.as_str())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
