//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, UserId};
use kernel::principal::Role;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    auth_session::AuthSession,
    user::{OAuthLink, User},
};
use crate::domain::repository::{AuthSessionRepository, UserInsert, UserRepository};
use crate::domain::value_object::{
    email::Email, oauth_provider::OAuthProvider, one_time_token::OneTimeToken,
    user_name::UserName, user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

const USER_NAME_CONSTRAINT: &str = "users_user_name_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";
const OAUTH_IDENTITY_CONSTRAINT: &str = "users_oauth_identity_key";

const USER_COLUMNS: &str = r#"
    user_id,
    user_name,
    email,
    password_hash,
    user_role,
    oauth_provider,
    oauth_provider_id,
    avatar_url,
    email_verified,
    verification_token_hash,
    verification_token_expires_at,
    reset_token_hash,
    reset_token_expires_at,
    last_login_at,
    created_at,
    updated_at
"#;

const SESSION_COLUMNS: &str = r#"
    session_id,
    user_id,
    user_role,
    expires_at_ms,
    remember_me,
    client_fingerprint_hash,
    client_ip,
    user_agent,
    created_at,
    last_activity_at
"#;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_user_where(&self, clause: &str, value: &str) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }
}

/// Name of the unique constraint a failed statement tripped, if any
fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Some(db.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn insert(&self, user: &User) -> AuthResult<UserInsert> {
        let result = sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
        ))
        .bind(user.user_id.as_uuid())
        .bind(user.user_name.as_str())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_ref().map(|p| p.as_phc_string()))
        .bind(user.role.id())
        .bind(user.oauth.as_ref().map(|l| l.provider.code()))
        .bind(user.oauth.as_ref().map(|l| l.provider_id.as_str()))
        .bind(user.oauth.as_ref().and_then(|l| l.avatar_url.as_deref()))
        .bind(user.email_verified)
        .bind(user.verification_token.as_ref().map(|t| t.hash.as_str()))
        .bind(user.verification_token.as_ref().map(|t| t.expires_at))
        .bind(user.reset_token.as_ref().map(|t| t.hash.as_str()))
        .bind(user.reset_token.as_ref().map(|t| t.expires_at))
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(UserInsert::Created),
            Err(e) => match unique_violation(&e).as_deref() {
                Some(USER_NAME_CONSTRAINT) => Ok(UserInsert::UserNameTaken),
                Some(EMAIL_CONSTRAINT) => Ok(UserInsert::EmailTaken),
                Some(OAUTH_IDENTITY_CONSTRAINT) => Ok(UserInsert::OAuthIdentityTaken),
                _ => Err(e.into()),
            },
        }
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.find_user_where("email = $1", email.as_str()).await
    }

    async fn find_by_oauth(
        &self,
        provider: OAuthProvider,
        provider_id: &str,
    ) -> AuthResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE oauth_provider = $1 AND oauth_provider_id = $2"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(provider.code())
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE user_name = $1)")
                .bind(user_name.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_verification_token(
        &self,
        user_id: &UserId,
        token: &OneTimeToken,
    ) -> AuthResult<bool> {
        let done = sqlx::query(
            r#"
            UPDATE users SET
                verification_token_hash = $2,
                verification_token_expires_at = $3,
                updated_at = now()
            WHERE user_id = $1 AND email_verified = FALSE
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(&token.hash)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected() == 1)
    }

    async fn set_reset_token(&self, user_id: &UserId, token: &OneTimeToken) -> AuthResult<bool> {
        let done = sqlx::query(
            r#"
            UPDATE users SET
                reset_token_hash = $2,
                reset_token_expires_at = $3,
                updated_at = now()
            WHERE user_id = $1 AND password_hash IS NOT NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(&token.hash)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected() == 1)
    }

    async fn link_oauth(&self, user_id: &UserId, link: &OAuthLink) -> AuthResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                oauth_provider = $2,
                oauth_provider_id = $3,
                avatar_url = COALESCE($4, avatar_url),
                email_verified = TRUE,
                verification_token_hash = NULL,
                verification_token_expires_at = NULL,
                updated_at = now()
            WHERE user_id = $1 AND oauth_provider IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(link.provider.code())
        .bind(&link.provider_id)
        .bind(&link.avatar_url)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() == 1),
            // The identity already belongs to someone else.
            Err(e) if unique_violation(&e).is_some() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn redeem_verification_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<UserId>> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users SET
                email_verified = TRUE,
                verification_token_hash = NULL,
                verification_token_expires_at = NULL,
                updated_at = $2
            WHERE verification_token_hash = $1
              AND verification_token_expires_at > $2
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user_id.map(UserId::from_uuid))
    }

    async fn redeem_reset_token(
        &self,
        token_hash: &str,
        password_hash: &UserPassword,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<UserId>> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users SET
                password_hash = $2,
                reset_token_hash = NULL,
                reset_token_expires_at = NULL,
                updated_at = $3
            WHERE reset_token_hash = $1
              AND reset_token_expires_at > $3
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .bind(password_hash.as_phc_string())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user_id.map(UserId::from_uuid))
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.into_user()).collect()
    }

    async fn set_role(&self, user_id: &UserId, role: Role) -> AuthResult<bool> {
        let done = sqlx::query("UPDATE users SET user_role = $2, updated_at = now() WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(role.id())
            .execute(&self.pool)
            .await?;

        Ok(done.rows_affected() == 1)
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
        let done = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(done.rows_affected() == 1)
    }
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for PgAuthRepository {
    async fn create(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(&format!(
            "INSERT INTO auth_sessions ({SESSION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(session.session_id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(session.role.id())
        .bind(session.expires_at_ms)
        .bind(session.remember_me)
        .bind(&session.client_fingerprint_hash)
        .bind(&session.client_ip)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, session_id: &SessionId) -> AuthResult<Option<AuthSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM auth_sessions WHERE session_id = $1 AND expires_at_ms > $2"
        );
        let row = sqlx::query_as::<_, AuthSessionRow>(&sql)
            .bind(session_id.as_uuid())
            .bind(Utc::now().timestamp_millis())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_session()).transpose()
    }

    async fn update(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                expires_at_ms = $2,
                last_activity_at = $3
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.expires_at_ms)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_all_for_user(
        &self,
        user_id: &UserId,
        except: Option<&SessionId>,
    ) -> AuthResult<u64> {
        let deleted = match except {
            Some(except_id) => {
                sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1 AND session_id != $2")
                    .bind(user_id.as_uuid())
                    .bind(except_id.as_uuid())
                    .execute(&self.pool)
                    .await?
                    .rows_affected()
            }
            None => {
                sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
                    .bind(user_id.as_uuid())
                    .execute(&self.pool)
                    .await?
                    .rows_affected()
            }
        };

        Ok(deleted)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < $1")
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    user_name: String,
    email: String,
    password_hash: Option<String>,
    user_role: i16,
    oauth_provider: Option<String>,
    oauth_provider_id: Option<String>,
    avatar_url: Option<String>,
    email_verified: bool,
    verification_token_hash: Option<String>,
    verification_token_expires_at: Option<DateTime<Utc>>,
    reset_token_hash: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn token(hash: Option<String>, expires_at: Option<DateTime<Utc>>) -> Option<OneTimeToken> {
    match (hash, expires_at) {
        (Some(hash), Some(expires_at)) => Some(OneTimeToken { hash, expires_at }),
        _ => None,
    }
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = Role::from_id(self.user_role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid user_role: {}", self.user_role)))?;

        let oauth = match (self.oauth_provider, self.oauth_provider_id) {
            (Some(provider), Some(provider_id)) => Some(OAuthLink {
                provider: provider
                    .parse()
                    .map_err(|_| AuthError::Internal(format!("Invalid oauth_provider: {provider}")))?,
                provider_id,
                avatar_url: self.avatar_url,
            }),
            _ => None,
        };

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            user_name: UserName::from_db(self.user_name),
            email: Email::from_db(self.email),
            password_hash: self.password_hash.map(UserPassword::from_db).transpose()?,
            role,
            oauth,
            email_verified: self.email_verified,
            verification_token: token(
                self.verification_token_hash,
                self.verification_token_expires_at,
            ),
            reset_token: token(self.reset_token_hash, self.reset_token_expires_at),
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    user_id: Uuid,
    user_role: i16,
    expires_at_ms: i64,
    remember_me: bool,
    client_fingerprint_hash: Vec<u8>,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthResult<AuthSession> {
        Ok(AuthSession {
            session_id: SessionId::from_uuid(self.session_id),
            user_id: UserId::from_uuid(self.user_id),
            role: Role::from_id(self.user_role).unwrap_or_default(),
            expires_at_ms: self.expires_at_ms,
            remember_me: self.remember_me,
            client_fingerprint_hash: self.client_fingerprint_hash,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        })
    }
}
