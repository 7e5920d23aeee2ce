//! HTTP Handlers

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, FromRequestParts, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header, request::Parts};
use axum::response::{AppendHeaders, IntoResponse, Redirect};
use kernel::id::UserId;
use kernel::principal::CurrentUser;
use kernel::response::Success;
use platform::client::ClientFingerprint;
use platform::cookie::extract_cookie;
use platform::mail::Mailer;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::{
    ChangeRoleUseCase, DeleteUserUseCase, GetProfileUseCase, ListUsersUseCase, OAuthCallbackInput,
    OAuthCallbackUseCase, OAuthStartUseCase, RegisterInput, RegisterUseCase,
    RequestPasswordResetUseCase, ResendVerificationUseCase, ResetPasswordUseCase, SignInInput,
    SignInUseCase, SignOutUseCase, VerifyEmailUseCase,
};
use crate::domain::oauth::OAuthClient;
use crate::domain::repository::AuthStore;
use crate::domain::value_object::oauth_provider::OAuthProvider;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ChangeRoleRequest, EmailRequest, OAuthCallbackQuery, RegisterRequest, RegisterResponse,
    ResetPasswordRequest, SignInRequest, SignInResponse, UserEnvelope, UserListResponse,
    UserResponse,
};

/// Shared state for auth handlers
pub struct AuthAppState<R, M, O> {
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub oauth: Arc<O>,
    pub config: Arc<AuthConfig>,
}

impl<R, M, O> Clone for AuthAppState<R, M, O> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            mailer: self.mailer.clone(),
            oauth: self.oauth.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, M, O> AuthAppState<R, M, O> {
    pub fn new(repo: R, mailer: M, oauth: O, config: AuthConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            mailer: Arc::new(mailer),
            oauth: Arc::new(oauth),
            config: Arc::new(config),
        }
    }
}

/// Fingerprint of the calling browser
pub struct ClientContext(pub ClientFingerprint);

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(fingerprint_from_parts(&parts.headers, &parts.extensions)?))
    }
}

pub(crate) fn fingerprint_from_parts(
    headers: &HeaderMap,
    extensions: &axum::http::Extensions,
) -> AuthResult<ClientFingerprint> {
    let direct_ip = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    Ok(ClientFingerprint::from_headers(headers, direct_ip)?)
}

fn parse_provider(raw: &str) -> AuthResult<OAuthProvider> {
    raw.parse()
}

fn session_cookie(config: &AuthConfig, token: &str, remember_me: bool) -> String {
    config
        .session_cookie()
        .build_set_cookie_for(token, config.session_ttl(remember_me).as_secs() as i64)
}

// ============================================================================
// Register / Sign In / Sign Out
// ============================================================================

/// POST /api/auth/register
pub async fn register<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    let use_case = RegisterUseCase::new(state.repo.clone(), state.mailer.clone(), state.config.clone());

    let user = use_case
        .execute(RegisterInput {
            user_name: req.user_name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Success::new(RegisterResponse {
            user: UserResponse::from(&user),
            message: "Account created. Check your email to verify your address.".to_string(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    ClientContext(fingerprint): ClientContext,
    Json(req): Json<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let remember_me = req.remember_me;
    let output = use_case
        .execute(
            SignInInput {
                email: req.email,
                password: req.password,
                remember_me,
            },
            &fingerprint,
        )
        .await?;

    let cookie = session_cookie(&state.config, &output.session_token, remember_me);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Success::new(SignInResponse {
            user: UserResponse::from(&output.user),
            redirect_to: output.redirect_to,
        }),
    ))
}

/// POST /api/auth/logout
pub async fn logout<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    if let Some(token) = extract_cookie(&headers, &state.config.session_cookie_name) {
        SignOutUseCase::new(state.repo.clone(), state.config.clone())
            .execute(&token)
            .await?;
    }

    Ok((
        [(header::SET_COOKIE, state.config.session_cookie().build_delete_cookie())],
        Success::message("Signed out"),
    ))
}

/// GET /api/auth/me
pub async fn me<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    current: CurrentUser,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    let user = GetProfileUseCase::new(state.repo.clone())
        .execute(&current)
        .await?;

    Ok(Success::new(UserEnvelope {
        user: UserResponse::from(&user),
    }))
}

// ============================================================================
// Email verification and password reset
// ============================================================================

/// POST /api/auth/verify-email/{token}
pub async fn verify_email<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    Path(token): Path<String>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    VerifyEmailUseCase::new(state.repo.clone())
        .execute(&token)
        .await?;

    Ok(Success::message("Email verified. You can now sign in."))
}

/// POST /api/auth/verification/resend
pub async fn resend_verification<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    Json(req): Json<EmailRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    ResendVerificationUseCase::new(state.repo.clone(), state.mailer.clone(), state.config.clone())
        .execute(&req.email)
        .await?;

    Ok(Success::message(
        "If that address has an unverified account, a new link is on its way.",
    ))
}

/// POST /api/auth/password/forgot
pub async fn forgot_password<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    Json(req): Json<EmailRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    RequestPasswordResetUseCase::new(state.repo.clone(), state.mailer.clone(), state.config.clone())
        .execute(&req.email)
        .await?;

    Ok(Success::message(
        "If that address has an account, a reset link is on its way.",
    ))
}

/// POST /api/auth/password/reset/{token}
pub async fn reset_password<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    ResetPasswordUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone())
        .execute(&token, req.password)
        .await?;

    Ok((
        [(header::SET_COOKIE, state.config.session_cookie().build_delete_cookie())],
        Success::message("Password updated. Sign in with your new password."),
    ))
}

// ============================================================================
// OAuth
// ============================================================================

/// GET /api/auth/oauth/{provider}/start
pub async fn oauth_start<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    Path(provider): Path<String>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    let provider = parse_provider(&provider)?;
    let output = OAuthStartUseCase::new(state.oauth.clone(), state.config.clone()).execute(provider)?;

    let cookie = state
        .config
        .oauth_state_cookie()
        .build_set_cookie(&output.state_cookie);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Redirect::to(&output.authorize_url),
    ))
}

/// GET /api/auth/oauth/{provider}/callback
pub async fn oauth_callback<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
    headers: HeaderMap,
    ClientContext(fingerprint): ClientContext,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    let provider = parse_provider(&provider)?;
    let input = OAuthCallbackInput {
        code: query.code,
        state: query.state,
        error: query.error,
        state_cookie: extract_cookie(&headers, &state.config.oauth_state_cookie_name),
    };

    let output = OAuthCallbackUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.oauth.clone(),
        state.config.clone(),
    )
    .execute(provider, input, &fingerprint)
    .await?;

    let target = format!(
        "{}{}",
        state.config.public_base_url.trim_end_matches('/'),
        output.redirect_to
    );

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, state.config.oauth_state_cookie().build_delete_cookie()),
            (header::SET_COOKIE, session_cookie(&state.config, &output.session_token, false)),
        ]),
        Redirect::to(&target),
    ))
}

// ============================================================================
// Admin user management
// ============================================================================

/// GET /api/auth/admin/users
pub async fn list_users<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    let users = ListUsersUseCase::new(state.repo.clone()).execute().await?;

    Ok(Success::new(UserListResponse {
        users: users.iter().map(UserResponse::from).collect(),
    }))
}

/// PATCH /api/auth/admin/users/{id}/role
pub async fn change_role<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ChangeRoleRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    let user = ChangeRoleUseCase::new(state.repo.clone())
        .execute(&current, UserId::from_uuid(user_id), req.role)
        .await?;

    Ok(Success::new(UserEnvelope {
        user: UserResponse::from(&user),
    }))
}

/// DELETE /api/auth/admin/users/{id}
pub async fn delete_user<R, M, O>(
    State(state): State<AuthAppState<R, M, O>>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: Mailer + Sync + 'static,
    O: OAuthClient + Sync + 'static,
{
    DeleteUserUseCase::new(state.repo.clone(), state.repo.clone())
        .execute(&current, UserId::from_uuid(user_id))
        .await?;

    Ok(Success::message("User deleted"))
}
