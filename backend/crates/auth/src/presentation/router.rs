//! Auth Router

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
};
use kernel::principal::{Role, require_role};
use platform::mail::{AppMailer, Mailer};

use crate::domain::oauth::OAuthClient;
use crate::domain::repository::AuthStore;
use crate::infra::{oauth_http::HttpOAuthClient, postgres::PgAuthRepository};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::AuthMiddlewareState;

/// Production wiring: Postgres, the configured mailer, real providers
pub fn auth_router(state: AuthAppState<PgAuthRepository, AppMailer, HttpOAuthClient>) -> Router {
    auth_router_generic(state)
}

/// Auth routes for any repository, mailer and OAuth client
pub fn auth_router_generic<R, M, O>(state: AuthAppState<R, M, O>) -> Router
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    let admin = Router::new()
        .route("/users", get(handlers::list_users::<R, M, O>))
        .route("/users/{id}/role", patch(handlers::change_role::<R, M, O>))
        .route("/users/{id}", delete(handlers::delete_user::<R, M, O>))
        .route_layer(from_fn_with_state(Role::Admin, require_role));

    Router::new()
        .route("/register", post(handlers::register::<R, M, O>))
        .route("/login", post(handlers::login::<R, M, O>))
        .route("/logout", post(handlers::logout::<R, M, O>))
        .route("/me", get(handlers::me::<R, M, O>))
        .route("/verify-email/{token}", post(handlers::verify_email::<R, M, O>))
        .route("/verification/resend", post(handlers::resend_verification::<R, M, O>))
        .route("/password/forgot", post(handlers::forgot_password::<R, M, O>))
        .route("/password/reset/{token}", post(handlers::reset_password::<R, M, O>))
        .route("/oauth/{provider}/start", get(handlers::oauth_start::<R, M, O>))
        .route("/oauth/{provider}/callback", get(handlers::oauth_callback::<R, M, O>))
        .nest("/admin", admin)
        .with_state(state)
}

/// State for `middleware::resolve_session`, sharing the handlers' repository
pub fn session_layer_state<R, M, O>(state: &AuthAppState<R, M, O>) -> AuthMiddlewareState<R> {
    AuthMiddlewareState::new(state.repo.clone(), state.config.clone())
}
