use axum::{
    extract::{Json, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::{AppError, Result},
    models::admin::LoginRequest,
    state::AppState,
};

/// Exchange admin credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let response = state.auth.login(&request).await?;
    Ok((StatusCode::OK, Json(response)))
}

/// Rejects requests without a valid admin token.
///
/// The token is read from the `Authorization: Bearer` header, or from a
/// `token` query parameter for clients that cannot set headers (websockets).
/// Verified claims are attached to the request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers())
        .or_else(|| query_token(request.uri().query()))
        .ok_or_else(|| AppError::Auth("Missing admin token".into()))?;

    let claims = state.auth.verify_token(&token)?;
    tracing::debug!("Admin {} -> {}", claims.username, request.uri().path());
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn query_token(query: Option<&str>) -> Option<String> {
    query?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));

        assert_eq!(query_token(Some("x=1&token=abc.def")).as_deref(), Some("abc.def"));
        assert_eq!(query_token(Some("token=")), None);
        assert_eq!(query_token(None), None);
    }
}
