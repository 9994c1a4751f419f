// src/utils/guard.rs

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, models::identity::Identity, state::AppState};

/// Axum Middleware: Session required.
///
/// Looks up the current session identity. If present and not banned,
/// injects the `Identity` into the request extensions for handlers.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let identity = state
        .sessions
        .current()
        .await
        .ok_or_else(|| AppError::Unauthenticated("Please log in first".to_string()))?;

    if identity.is_banned {
        return Err(AppError::Unauthenticated("This account is banned".to_string()));
    }

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `session_middleware`. Checks the injected `Identity` role.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| AppError::Unauthenticated("Please log in first".to_string()))?;

    if !identity.is_admin() {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(req).await)
}
