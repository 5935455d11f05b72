use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use stockward_core::UserId;

use crate::context::RequestIdentity;

/// Attach the caller's identity to the request.
///
/// The upstream auth layer is expected to authenticate and forward the
/// acting user as an `x-user-id` header (UUID). Requests without one are
/// rejected; this engine never mints identities itself.
pub async fn identity_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = extract_user_id(req.headers())?;

    req.extensions_mut().insert(RequestIdentity::new(user_id));

    Ok(next.run(req).await)
}

fn extract_user_id(headers: &HeaderMap) -> Result<UserId, StatusCode> {
    let header = headers
        .get("x-user-id")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    header
        .trim()
        .parse::<UserId>()
        .map_err(|_| StatusCode::UNAUTHORIZED)
}
