use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::error::json_error;
use crate::models::Role;
use crate::AppState;

/// Routes served without a bearer token.
const PUBLIC_PATHS: &[&str] = &["/health", "/api/v1/auth/login", "/api/v1/auth/register"];

/// Scan endpoints stay public so printed QR labels resolve without a login.
const PUBLIC_PREFIXES: &[&str] = &["/api/v1/scan/"];

/// Identity attached to authenticated requests as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p))
}

fn unauthorized(message: &str) -> Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if is_public(req.uri().path()) {
        return next.run(req).await;
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return unauthorized("Missing bearer token");
    };
    let Some(claims) = state.auth.decode_token(token) else {
        return unauthorized("Invalid or expired token");
    };
    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return unauthorized("Invalid or expired token");
    };

    let user = match state.auth.get_user(user_id).await {
        Ok(user) => user,
        Err(_) => return unauthorized("Unknown user"),
    };
    if !user.is_active {
        return unauthorized("Account disabled");
    }

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        username: user.username,
        role: user.role,
    });
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_skip_auth() {
        assert!(is_public("/health"));
        assert!(is_public("/api/v1/auth/login"));
        assert!(is_public("/api/v1/scan/BOX-0001"));
        assert!(is_public("/api/v1/scan/BOX-0001/qr-image"));
    }

    #[test]
    fn protected_paths_require_auth() {
        assert!(!is_public("/api/v1/items"));
        assert!(!is_public("/api/v1/containers"));
        assert!(!is_public("/api/v1/auth/me"));
        assert!(!is_public("/api/v1/scan"));
    }
}
