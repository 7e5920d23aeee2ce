//! Auth Middleware
//!
//! `resolve_session` runs on every request. A valid session cookie puts a
//! `CurrentUser` into the request extensions; anything else leaves the
//! request anonymous. Route-level access is then decided by the
//! `CurrentUser` extractor and `kernel::principal::require_role`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::cookie::extract_cookie;

use crate::application::CheckSessionUseCase;
use crate::application::config::AuthConfig;
use crate::domain::repository::AuthStore;
use crate::error::AuthError;
use crate::presentation::handlers::fingerprint_from_parts;

/// Middleware state
pub struct AuthMiddlewareState<R> {
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> Clone for AuthMiddlewareState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R> AuthMiddlewareState<R> {
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }
}

pub async fn resolve_session<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request,
    next: Next,
) -> Response
where
    R: AuthStore,
{
    let Some(token) = extract_cookie(req.headers(), &state.config.session_cookie_name) else {
        return next.run(req).await;
    };

    let Ok(fingerprint) = fingerprint_from_parts(req.headers(), req.extensions()) else {
        return next.run(req).await;
    };

    let use_case = CheckSessionUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    match use_case.execute(&token, &fingerprint).await {
        Ok(current) => {
            req.extensions_mut().insert(current);
            next.run(req).await
        }
        Err(e @ (AuthError::Database(_) | AuthError::Internal(_))) => e.into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unusable session cookie");
            let mut response = next.run(req).await;
            if let Some(clear) =
                platform::cookie::header_value(&state.config.session_cookie().build_delete_cookie())
            {
                response.headers_mut().append(header::SET_COOKIE, clear);
            }
            response
        }
    }
}
