//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use anyhow::Context;
use auth::domain::repository::AuthSessionRepository;
use auth::{
    AuthAppState, AuthConfig, HttpOAuthClient, OAuthProviderConfig, OAuthSettings,
    PgAuthRepository, auth_router, resolve_session, session_layer_state,
};
use axum::{
    Router, http,
    http::{Method, header},
    middleware::from_fn_with_state,
};
use base64::Engine;
use base64::engine::general_purpose;
use learning::{FsImageStore, LearningAppState, LearningConfig, PgLearningRepository, learning_router};
use platform::mail::AppMailer;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,learning=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: remove expired sessions
    // Errors here should not prevent server startup
    let auth_repo = PgAuthRepository::new(pool.clone());
    match auth_repo.cleanup_expired().await {
        Ok(sessions) => {
            tracing::info!(sessions_deleted = sessions, "Auth session cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Auth session cleanup failed, continuing anyway");
        }
    }

    // Auth configuration
    let auth_config = auth_config_from_env()?;
    let mailer = AppMailer::from_settings(
        env::var("RESEND_API_KEY").ok().as_deref(),
        &auth_config.site_name,
        &env::var("MAIL_FROM_DOMAIN").unwrap_or_else(|_| "localhost".to_string()),
    );
    if !mailer.is_live() {
        tracing::warn!("RESEND_API_KEY not set, outgoing mail is only logged");
    }
    let oauth = HttpOAuthClient::new(auth_config.oauth.clone());
    let auth_state = AuthAppState::new(auth_repo, mailer, oauth, auth_config);
    let session_state = session_layer_state(&auth_state);

    // Learning configuration
    let mut learning_config = LearningConfig::default();
    if let Ok(dir) = env::var("UPLOAD_DIR") {
        learning_config = learning_config.with_upload_dir(dir);
    }
    let images = FsImageStore::open(learning_config.upload_dir.clone())
        .await
        .with_context(|| format!("Cannot open upload directory {}", learning_config.upload_dir.display()))?;
    tracing::info!(upload_dir = %images.dir().display(), "Image store ready");

    let learning_state = LearningAppState::new(PgLearningRepository::new(pool.clone()), images, learning_config);

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router; the session layer resolves `CurrentUser` for both APIs
    let app = Router::new()
        .nest("/api/auth", auth_router(auth_state))
        .nest("/api", learning_router(learning_state))
        .layer(from_fn_with_state(session_state, resolve_session::<PgAuthRepository>))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .context("BIND_ADDR must be host:port")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Debug builds fall back to a random secret and plain-http cookies;
/// release builds require `SESSION_SECRET`.
fn auth_config_from_env() -> anyhow::Result<AuthConfig> {
    let mut config = match env::var("SESSION_SECRET") {
        Ok(secret_b64) => {
            let secret_bytes = general_purpose::STANDARD
                .decode(secret_b64.trim())
                .context("SESSION_SECRET must be base64")?;
            let secret: [u8; 32] = secret_bytes
                .try_into()
                .map_err(|_| anyhow::anyhow!("SESSION_SECRET must decode to 32 bytes"))?;
            AuthConfig {
                session_secret: secret,
                cookie_secure: !cfg!(debug_assertions),
                ..AuthConfig::default()
            }
        }
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("SESSION_SECRET not set, using a random secret; sessions end on restart");
            AuthConfig::development()
        }
        Err(_) => anyhow::bail!("SESSION_SECRET must be set in production"),
    };

    if let Some(pepper) = env::var("PASSWORD_PEPPER").ok().filter(|p| !p.is_empty()) {
        config.password_pepper = Some(pepper.into_bytes());
    }
    if let Ok(base_url) = env::var("PUBLIC_BASE_URL") {
        config.public_base_url = base_url;
    }

    config.oauth = OAuthSettings {
        google: oauth_provider_from_env("GOOGLE"),
        facebook: oauth_provider_from_env("FACEBOOK"),
    };
    for (name, configured) in [
        ("google", config.oauth.google.is_some()),
        ("facebook", config.oauth.facebook.is_some()),
    ] {
        tracing::info!(provider = name, configured, "OAuth provider");
    }

    Ok(config)
}

/// `{PREFIX}_CLIENT_ID`, `{PREFIX}_CLIENT_SECRET` and `{PREFIX}_REDIRECT_URI`, all or nothing
fn oauth_provider_from_env(prefix: &str) -> Option<OAuthProviderConfig> {
    let var = |suffix: &str| env::var(format!("{prefix}_{suffix}")).ok().filter(|v| !v.is_empty());

    Some(OAuthProviderConfig {
        client_id: var("CLIENT_ID")?,
        client_secret: var("CLIENT_SECRET")?,
        redirect_uri: var("REDIRECT_URI")?,
    })
}
