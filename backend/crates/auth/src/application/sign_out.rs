//! Sign Out Use Case

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session::parse_token;
use crate::domain::repository::AuthSessionRepository;
use crate::error::AuthResult;

pub struct SignOutUseCase<S>
where
    S: AuthSessionRepository,
{
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> SignOutUseCase<S>
where
    S: AuthSessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    /// Deletes the session behind `session_token`. A bad or unknown token
    /// is not an error: the caller clears the cookie either way.
    pub async fn execute(&self, session_token: &str) -> AuthResult<()> {
        let Ok(session_id) = parse_token(&self.config, session_token) else {
            return Ok(());
        };

        self.session_repo.delete(&session_id).await?;
        tracing::info!(session_id = %session_id, "Session deleted");

        Ok(())
    }
}
