//! Use case tests for the auth crate, run against in-memory fakes

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, Utc};
    use kernel::id::{SessionId, UserId};
    use kernel::principal::Role;
    use platform::mail::{MailError, MailMessage, Mailer};

    use crate::domain::entity::{
        auth_session::AuthSession,
        user::{OAuthLink, User},
    };
    use crate::domain::oauth::{OAuthClient, OAuthProfile};
    use crate::domain::repository::{AuthSessionRepository, UserInsert, UserRepository};
    use crate::domain::value_object::{
        email::Email, oauth_provider::OAuthProvider, one_time_token::OneTimeToken,
        user_name::UserName, user_password::UserPassword,
    };
    use crate::error::{AuthError, AuthResult};

    /// Edits the stored users the way another request's commit would
    pub type UsersHook = Box<dyn FnOnce(&mut Vec<User>) + Send>;

    #[derive(Default)]
    pub struct InMemoryAuthStore {
        pub users: Mutex<Vec<User>>,
        pub sessions: Mutex<HashMap<SessionId, AuthSession>>,
        after_find_by_email: Mutex<Option<UsersHook>>,
        before_insert: Mutex<Option<UsersHook>>,
    }

    impl InMemoryAuthStore {
        /// Runs once, right after the next `find_by_email` has read its row.
        pub fn after_next_email_lookup(&self, hook: impl FnOnce(&mut Vec<User>) + Send + 'static) {
            *self.after_find_by_email.lock().unwrap() = Some(Box::new(hook));
        }

        /// Runs once, right before the next `insert` checks its constraints.
        pub fn before_next_insert(&self, hook: impl FnOnce(&mut Vec<User>) + Send + 'static) {
            *self.before_insert.lock().unwrap() = Some(Box::new(hook));
        }

        fn run_hook(&self, slot: &Mutex<Option<UsersHook>>) {
            let hook = slot.lock().unwrap().take();
            if let Some(hook) = hook {
                hook(&mut self.users.lock().unwrap());
            }
        }

        pub fn user_by_email(&self, email: &str) -> Option<User> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email.as_str() == email)
                .cloned()
        }

        pub fn session_count(&self) -> usize {
            self.sessions.lock().unwrap().len()
        }
    }

    impl UserRepository for InMemoryAuthStore {
        async fn insert(&self, user: &User) -> AuthResult<UserInsert> {
            self.run_hook(&self.before_insert);
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.user_name == user.user_name) {
                return Ok(UserInsert::UserNameTaken);
            }
            if users.iter().any(|u| u.email == user.email) {
                return Ok(UserInsert::EmailTaken);
            }
            if let Some(link) = &user.oauth {
                let taken = users.iter().any(|u| {
                    u.oauth
                        .as_ref()
                        .is_some_and(|l| l.provider == link.provider && l.provider_id == link.provider_id)
                });
                if taken {
                    return Ok(UserInsert::OAuthIdentityTaken);
                }
            }
            users.push(user.clone());
            Ok(UserInsert::Created)
        }

        async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.user_id == *user_id)
                .cloned())
        }

        async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
            let found = self.user_by_email(email.as_str());
            self.run_hook(&self.after_find_by_email);
            Ok(found)
        }

        async fn find_by_oauth(
            &self,
            provider: OAuthProvider,
            provider_id: &str,
        ) -> AuthResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| {
                    u.oauth
                        .as_ref()
                        .is_some_and(|l| l.provider == provider && l.provider_id == provider_id)
                })
                .cloned())
        }

        async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .any(|u| u.user_name == *user_name))
        }

        async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
            Ok(self.users.lock().unwrap().iter().any(|u| u.email == *email))
        }

        async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
            if let Some(user) = self.users.lock().unwrap().iter_mut().find(|u| u.user_id == *user_id) {
                user.last_login_at = Some(at);
            }
            Ok(())
        }

        async fn set_verification_token(
            &self,
            user_id: &UserId,
            token: &OneTimeToken,
        ) -> AuthResult<bool> {
            let mut users = self.users.lock().unwrap();
            match users
                .iter_mut()
                .find(|u| u.user_id == *user_id && !u.email_verified)
            {
                Some(user) => {
                    user.verification_token = Some(token.clone());
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn set_reset_token(&self, user_id: &UserId, token: &OneTimeToken) -> AuthResult<bool> {
            let mut users = self.users.lock().unwrap();
            match users
                .iter_mut()
                .find(|u| u.user_id == *user_id && u.password_hash.is_some())
            {
                Some(user) => {
                    user.reset_token = Some(token.clone());
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn link_oauth(&self, user_id: &UserId, link: &OAuthLink) -> AuthResult<bool> {
            let mut users = self.users.lock().unwrap();
            match users
                .iter_mut()
                .find(|u| u.user_id == *user_id && u.oauth.is_none())
            {
                Some(user) => {
                    user.oauth = Some(link.clone());
                    user.email_verified = true;
                    user.verification_token = None;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn redeem_verification_token(
            &self,
            token_hash: &str,
            now: DateTime<Utc>,
        ) -> AuthResult<Option<UserId>> {
            let mut users = self.users.lock().unwrap();
            let user = users.iter_mut().find(|u| {
                u.verification_token
                    .as_ref()
                    .is_some_and(|t| t.hash == token_hash && !t.is_expired_at(now))
            });
            Ok(user.map(|u| {
                u.email_verified = true;
                u.verification_token = None;
                u.user_id
            }))
        }

        async fn redeem_reset_token(
            &self,
            token_hash: &str,
            password_hash: &UserPassword,
            now: DateTime<Utc>,
        ) -> AuthResult<Option<UserId>> {
            let mut users = self.users.lock().unwrap();
            let user = users.iter_mut().find(|u| {
                u.reset_token
                    .as_ref()
                    .is_some_and(|t| t.hash == token_hash && !t.is_expired_at(now))
            });
            Ok(user.map(|u| {
                u.password_hash = Some(password_hash.clone());
                u.reset_token = None;
                u.user_id
            }))
        }

        async fn list(&self) -> AuthResult<Vec<User>> {
            Ok(self.users.lock().unwrap().clone())
        }

        async fn set_role(&self, user_id: &UserId, role: Role) -> AuthResult<bool> {
            let mut users = self.users.lock().unwrap();
            match users.iter_mut().find(|u| u.user_id == *user_id) {
                Some(user) => {
                    user.role = role;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
            let mut users = self.users.lock().unwrap();
            let before = users.len();
            users.retain(|u| u.user_id != *user_id);
            Ok(users.len() != before)
        }
    }

    impl AuthSessionRepository for InMemoryAuthStore {
        async fn create(&self, session: &AuthSession) -> AuthResult<()> {
            self.sessions
                .lock()
                .unwrap()
                .insert(session.session_id, session.clone());
            Ok(())
        }

        async fn find_by_id(&self, session_id: &SessionId) -> AuthResult<Option<AuthSession>> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .get(session_id)
                .filter(|s| !s.is_expired())
                .cloned())
        }

        async fn update(&self, session: &AuthSession) -> AuthResult<()> {
            if let Some(stored) = self.sessions.lock().unwrap().get_mut(&session.session_id) {
                stored.expires_at_ms = session.expires_at_ms;
                stored.last_activity_at = session.last_activity_at;
            }
            Ok(())
        }

        async fn delete(&self, session_id: &SessionId) -> AuthResult<()> {
            self.sessions.lock().unwrap().remove(session_id);
            Ok(())
        }

        async fn delete_all_for_user(
            &self,
            user_id: &UserId,
            except: Option<&SessionId>,
        ) -> AuthResult<u64> {
            let mut sessions = self.sessions.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|id, s| s.user_id != *user_id || Some(id) == except);
            Ok((before - sessions.len()) as u64)
        }

        async fn cleanup_expired(&self) -> AuthResult<u64> {
            let mut sessions = self.sessions.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|_, s| !s.is_expired());
            Ok((before - sessions.len()) as u64)
        }
    }

    /// Records every message; optionally fails delivery
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<MailMessage>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn last(&self) -> Option<MailMessage> {
            self.sent.lock().unwrap().last().cloned()
        }

        pub fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    impl Mailer for RecordingMailer {
        async fn send(&self, message: MailMessage) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Delivery("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    /// Hands out a fixed profile and counts code exchanges
    pub struct FakeOAuth {
        pub profile: OAuthProfile,
        pub exchanges: AtomicUsize,
    }

    impl FakeOAuth {
        pub fn with_profile(profile: OAuthProfile) -> Self {
            Self {
                profile,
                exchanges: AtomicUsize::new(0),
            }
        }

        pub fn exchange_count(&self) -> usize {
            self.exchanges.load(Ordering::SeqCst)
        }
    }

    impl OAuthClient for FakeOAuth {
        fn authorize_url(&self, provider: OAuthProvider, state: &str) -> AuthResult<String> {
            Ok(format!("https://provider.test/{}/authorize?state={}", provider.code(), state))
        }

        async fn exchange_code(&self, provider: OAuthProvider, code: &str) -> AuthResult<OAuthProfile> {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            if code == "bad-code" {
                return Err(AuthError::OAuthProvider("invalid_grant".to_string()));
            }
            Ok(OAuthProfile {
                provider,
                ..self.profile.clone()
            })
        }
    }

    /// Raw token from the last path segment of the first link in an email
    pub fn token_from_mail(message: &MailMessage, marker: &str) -> String {
        let start = message.html.find(marker).expect("link in email") + marker.len();
        message.html[start..]
            .split(['"', '<'])
            .next()
            .expect("token")
            .to_string()
    }
}

#[cfg(test)]
mod register_tests {
    use std::sync::Arc;

    use crate::application::{AuthConfig, RegisterInput, RegisterUseCase, VerifyEmailUseCase};
    use crate::error::AuthError;

    use super::fakes::*;

    fn input(user_name: &str, email: &str) -> RegisterInput {
        RegisterInput {
            user_name: user_name.to_string(),
            email: email.to_string(),
            password: "Lesson#Plan2024".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_unverified_student_and_mails_link() {
        let store = Arc::new(InMemoryAuthStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let config = Arc::new(AuthConfig::with_random_secret());
        let use_case = RegisterUseCase::new(store.clone(), mailer.clone(), config);

        let user = use_case.execute(input("Ada_Lovelace", "Ada@Example.com")).await.unwrap();

        assert_eq!(user.user_name.as_str(), "ada_lovelace");
        assert_eq!(user.email.as_str(), "ada@example.com");
        assert!(!user.email_verified);
        assert_eq!(user.role, kernel::principal::Role::Student);

        let stored = store.user_by_email("ada@example.com").unwrap();
        let token = stored.verification_token.unwrap();
        let hours = (token.expires_at - chrono::Utc::now()).num_minutes() as f64 / 60.0;
        assert!((23.9..=24.0).contains(&hours));

        let mail = mailer.last().unwrap();
        assert_eq!(mail.to, "ada@example.com");
        let raw = token_from_mail(&mail, "/auth/verify-email/");
        assert_ne!(raw, token.hash);
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_fail_registration() {
        let store = Arc::new(InMemoryAuthStore::default());
        let use_case = RegisterUseCase::new(
            store.clone(),
            Arc::new(RecordingMailer::failing()),
            Arc::new(AuthConfig::with_random_secret()),
        );

        assert!(use_case.execute(input("grace", "grace@example.com")).await.is_ok());
        assert!(store.user_by_email("grace@example.com").is_some());
    }

    #[tokio::test]
    async fn test_duplicate_user_name_and_email() {
        let store = Arc::new(InMemoryAuthStore::default());
        let use_case = RegisterUseCase::new(
            store,
            Arc::new(RecordingMailer::default()),
            Arc::new(AuthConfig::with_random_secret()),
        );
        use_case.execute(input("grace", "grace@example.com")).await.unwrap();

        let err = use_case.execute(input("GRACE", "other@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNameTaken));

        let err = use_case.execute(input("hopper", "grace@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_validation_errors_name_fields() {
        let use_case = RegisterUseCase::new(
            Arc::new(InMemoryAuthStore::default()),
            Arc::new(RecordingMailer::default()),
            Arc::new(AuthConfig::with_random_secret()),
        );

        let err = use_case.execute(input("ab", "ab@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation { field: "user_name", .. }));

        let err = use_case.execute(input("valid_name", "not-an-email")).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation { field: "email", .. }));

        let mut weak = input("valid_name", "valid@example.com");
        weak.password = "short".to_string();
        let err = use_case.execute(weak).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation { field: "password", .. }));
    }

    #[tokio::test]
    async fn test_verification_link_is_single_use() {
        let store = Arc::new(InMemoryAuthStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let config = Arc::new(AuthConfig::with_random_secret());
        RegisterUseCase::new(store.clone(), mailer.clone(), config)
            .execute(input("grace", "grace@example.com"))
            .await
            .unwrap();
        let raw = token_from_mail(&mailer.last().unwrap(), "/auth/verify-email/");

        let verify = VerifyEmailUseCase::new(store.clone());
        verify.execute(&raw).await.unwrap();
        assert!(store.user_by_email("grace@example.com").unwrap().email_verified);

        let err = verify.execute(&raw).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredToken));
    }
}

#[cfg(test)]
mod verification_tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use crate::application::{AuthConfig, ResendVerificationUseCase, VerifyEmailUseCase};
    use crate::domain::entity::user::User;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{
        email::Email,
        one_time_token::OneTimeToken,
        user_name::UserName,
        user_password::{NewPassword, UserPassword},
    };
    use crate::error::AuthError;

    use super::fakes::*;

    async fn seed_unverified(store: &InMemoryAuthStore, raw_token: &str, expires_in: Duration) {
        let password = NewPassword::new("Lesson#Plan2024".to_string(), &[]).unwrap();
        let mut user = User::new_local(
            UserName::new("linus").unwrap(),
            Email::new("linus@example.com").unwrap(),
            UserPassword::from_new(&password, None).unwrap(),
        );
        user.verification_token = Some(OneTimeToken {
            hash: OneTimeToken::digest(raw_token),
            expires_at: Utc::now() + expires_in,
        });
        UserRepository::insert(store, &user).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let store = Arc::new(InMemoryAuthStore::default());
        seed_unverified(&store, "expired-token", Duration::hours(-1)).await;

        let err = VerifyEmailUseCase::new(store.clone())
            .execute("expired-token")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidOrExpiredToken));
        assert!(!store.user_by_email("linus@example.com").unwrap().email_verified);
    }

    #[tokio::test]
    async fn test_unknown_and_blank_tokens() {
        let verify = VerifyEmailUseCase::new(Arc::new(InMemoryAuthStore::default()));
        assert!(matches!(
            verify.execute("nope").await,
            Err(AuthError::InvalidOrExpiredToken)
        ));
        assert!(matches!(
            verify.execute("  ").await,
            Err(AuthError::InvalidOrExpiredToken)
        ));
    }

    #[tokio::test]
    async fn test_resend_replaces_token() {
        let store = Arc::new(InMemoryAuthStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        seed_unverified(&store, "old-token", Duration::hours(1)).await;

        let resend = ResendVerificationUseCase::new(
            store.clone(),
            mailer.clone(),
            Arc::new(AuthConfig::with_random_secret()),
        );
        resend.execute("linus@example.com").await.unwrap();
        resend.execute("nobody@example.com").await.unwrap();
        assert_eq!(mailer.count(), 1);

        let verify = VerifyEmailUseCase::new(store.clone());
        assert!(verify.execute("old-token").await.is_err());
        let raw = token_from_mail(&mailer.last().unwrap(), "/auth/verify-email/");
        assert!(verify.execute(&raw).await.is_ok());
    }
}

#[cfg(test)]
mod sign_in_tests {
    use std::sync::Arc;

    use axum::http::{HeaderMap, HeaderValue, header};
    use platform::client::ClientFingerprint;

    use crate::application::{
        AuthConfig, CheckSessionUseCase, RegisterInput, RegisterUseCase, SignInInput,
        SignInUseCase, SignOutUseCase, VerifyEmailUseCase,
    };
    use crate::domain::entity::user::{OAuthLink, User};
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{
        email::Email, oauth_provider::OAuthProvider, user_name::UserName,
    };
    use crate::error::AuthError;

    use super::fakes::*;

    pub fn fingerprint(user_agent: &str) -> ClientFingerprint {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_str(user_agent).unwrap());
        ClientFingerprint::from_headers(&headers, None).unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryAuthStore>,
        mailer: Arc<RecordingMailer>,
        config: Arc<AuthConfig>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: Arc::new(InMemoryAuthStore::default()),
                mailer: Arc::new(RecordingMailer::default()),
                config: Arc::new(AuthConfig::with_random_secret()),
            }
        }

        async fn register(&self, verify: bool) {
            RegisterUseCase::new(self.store.clone(), self.mailer.clone(), self.config.clone())
                .execute(RegisterInput {
                    user_name: "grace".to_string(),
                    email: "grace@example.com".to_string(),
                    password: "Lesson#Plan2024".to_string(),
                })
                .await
                .unwrap();
            if verify {
                let raw = token_from_mail(&self.mailer.last().unwrap(), "/auth/verify-email/");
                VerifyEmailUseCase::new(self.store.clone()).execute(&raw).await.unwrap();
            }
        }

        fn sign_in(&self) -> SignInUseCase<InMemoryAuthStore, InMemoryAuthStore> {
            SignInUseCase::new(self.store.clone(), self.store.clone(), self.config.clone())
        }
    }

    fn credentials(password: &str, remember_me: bool) -> SignInInput {
        SignInInput {
            email: "Grace@example.com".to_string(),
            password: password.to_string(),
            remember_me,
        }
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let fx = Fixture::new();
        fx.register(true).await;
        let fp = fingerprint("Firefox");

        let err = fx.sign_in().execute(credentials("Wrong#Pass2024", false), &fp).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let mut unknown = credentials("Lesson#Plan2024", false);
        unknown.email = "nobody@example.com".to_string();
        let err = fx.sign_in().execute(unknown, &fp).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unverified_email_blocks_login() {
        let fx = Fixture::new();
        fx.register(false).await;

        let err = fx
            .sign_in()
            .execute(credentials("Lesson#Plan2024", false), &fingerprint("Firefox"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnverifiedEmail));
        assert_eq!(fx.store.session_count(), 0);
    }

    #[tokio::test]
    async fn test_oauth_only_account_cannot_use_password() {
        let fx = Fixture::new();
        let user = User::new_oauth(
            UserName::new("grace").unwrap(),
            Email::new("grace@example.com").unwrap(),
            OAuthLink {
                provider: OAuthProvider::Google,
                provider_id: "g-1".to_string(),
                avatar_url: None,
            },
        );
        UserRepository::insert(fx.store.as_ref(), &user).await.unwrap();

        let err = fx
            .sign_in()
            .execute(credentials("Lesson#Plan2024", false), &fingerprint("Firefox"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OAuthOnlyAccount(ref p) if p == "Google"));
    }

    #[tokio::test]
    async fn test_session_round_trip_and_sign_out() {
        let fx = Fixture::new();
        fx.register(true).await;
        let fp = fingerprint("Firefox");

        let output = fx.sign_in().execute(credentials("Lesson#Plan2024", true), &fp).await.unwrap();
        assert_eq!(output.redirect_to, "/dashboard");
        assert!(output.user.last_login_at.is_some());

        let check = CheckSessionUseCase::new(fx.store.clone(), fx.store.clone(), fx.config.clone());
        let current = check.execute(&output.session_token, &fp).await.unwrap();
        assert_eq!(current.user_name, "grace");
        assert_eq!(current.role, kernel::principal::Role::Student);

        let err = check
            .execute(&output.session_token, &fingerprint("Chrome"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SessionFingerprintMismatch));

        SignOutUseCase::new(fx.store.clone(), fx.config.clone())
            .execute(&output.session_token)
            .await
            .unwrap();
        assert!(matches!(
            check.execute(&output.session_token, &fp).await,
            Err(AuthError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_admin_lands_on_admin_area() {
        let fx = Fixture::new();
        fx.register(true).await;
        let user = fx.store.user_by_email("grace@example.com").unwrap();
        UserRepository::set_role(fx.store.as_ref(), &user.user_id, kernel::principal::Role::Admin)
            .await
            .unwrap();

        let output = fx
            .sign_in()
            .execute(credentials("Lesson#Plan2024", false), &fingerprint("Firefox"))
            .await
            .unwrap();
        assert_eq!(output.redirect_to, "/admin");
    }

    #[tokio::test]
    async fn test_sign_in_keeps_role_changed_meanwhile() {
        let fx = Fixture::new();
        fx.register(true).await;
        fx.store.after_next_email_lookup(|users| {
            for user in users.iter_mut().filter(|u| u.email.as_str() == "grace@example.com") {
                user.role = kernel::principal::Role::Instructor;
            }
        });

        let output = fx
            .sign_in()
            .execute(credentials("Lesson#Plan2024", false), &fingerprint("Firefox"))
            .await
            .unwrap();
        // The response reflects the row as read; storage keeps the promotion.
        assert_eq!(output.user.role, kernel::principal::Role::Student);

        let stored = fx.store.user_by_email("grace@example.com").unwrap();
        assert_eq!(stored.role, kernel::principal::Role::Instructor);
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_session_of_deleted_user_is_removed() {
        let fx = Fixture::new();
        fx.register(true).await;
        let fp = fingerprint("Firefox");
        let output = fx.sign_in().execute(credentials("Lesson#Plan2024", false), &fp).await.unwrap();

        UserRepository::delete(fx.store.as_ref(), &output.user.user_id).await.unwrap();

        let check = CheckSessionUseCase::new(fx.store.clone(), fx.store.clone(), fx.config.clone());
        assert!(matches!(
            check.execute(&output.session_token, &fp).await,
            Err(AuthError::SessionInvalid)
        ));
        assert_eq!(fx.store.session_count(), 0);
    }

    #[tokio::test]
    async fn test_live_role_is_used() {
        let fx = Fixture::new();
        fx.register(true).await;
        let fp = fingerprint("Firefox");
        let output = fx.sign_in().execute(credentials("Lesson#Plan2024", false), &fp).await.unwrap();

        UserRepository::set_role(
            fx.store.as_ref(),
            &output.user.user_id,
            kernel::principal::Role::Instructor,
        )
        .await
        .unwrap();

        let check = CheckSessionUseCase::new(fx.store.clone(), fx.store.clone(), fx.config.clone());
        let current = check.execute(&output.session_token, &fp).await.unwrap();
        assert_eq!(current.role, kernel::principal::Role::Instructor);
    }
}

#[cfg(test)]
mod password_reset_tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use crate::application::session::establish;
    use crate::application::{
        AuthConfig, RequestPasswordResetUseCase, ResetPasswordUseCase, SignInInput, SignInUseCase,
    };
    use crate::domain::entity::user::{OAuthLink, User};
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{
        email::Email,
        oauth_provider::OAuthProvider,
        one_time_token::OneTimeToken,
        user_name::UserName,
        user_password::{NewPassword, UserPassword},
    };
    use crate::error::AuthError;

    use super::fakes::*;
    use super::sign_in_tests::fingerprint;

    async fn seed_verified(store: &InMemoryAuthStore) -> User {
        let password = NewPassword::new("Lesson#Plan2024".to_string(), &[]).unwrap();
        let mut user = User::new_local(
            UserName::new("grace").unwrap(),
            Email::new("grace@example.com").unwrap(),
            UserPassword::from_new(&password, None).unwrap(),
        );
        user.email_verified = true;
        UserRepository::insert(store, &user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_reset_token_is_single_use_and_revokes_sessions() {
        let store = Arc::new(InMemoryAuthStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let config = Arc::new(AuthConfig::with_random_secret());
        let user = seed_verified(&store).await;

        establish(store.as_ref(), &config, &user, false, &fingerprint("Firefox"))
            .await
            .unwrap();
        establish(store.as_ref(), &config, &user, true, &fingerprint("Safari"))
            .await
            .unwrap();
        assert_eq!(store.session_count(), 2);

        RequestPasswordResetUseCase::new(store.clone(), mailer.clone(), config.clone())
            .execute("grace@example.com")
            .await
            .unwrap();
        let stored = store.user_by_email("grace@example.com").unwrap();
        let minutes = (stored.reset_token.unwrap().expires_at - Utc::now()).num_minutes();
        assert!((59..=60).contains(&minutes));

        let raw = token_from_mail(&mailer.last().unwrap(), "/auth/reset-password/");
        let reset = ResetPasswordUseCase::new(store.clone(), store.clone(), config.clone());

        reset.execute(&raw, "Brand#New2025pw".to_string()).await.unwrap();
        assert_eq!(store.session_count(), 0);

        let err = reset
            .execute(&raw, "Another#New2025".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredToken));

        let sign_in = SignInUseCase::new(store.clone(), store.clone(), config.clone());
        let input = |password: &str| SignInInput {
            email: "grace@example.com".to_string(),
            password: password.to_string(),
            remember_me: false,
        };
        assert!(sign_in.execute(input("Brand#New2025pw"), &fingerprint("Firefox")).await.is_ok());
        assert!(matches!(
            sign_in.execute(input("Lesson#Plan2024"), &fingerprint("Firefox")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_racing_sign_in_does_not_revive_reset_token() {
        let store = Arc::new(InMemoryAuthStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let config = Arc::new(AuthConfig::with_random_secret());
        seed_verified(&store).await;

        RequestPasswordResetUseCase::new(store.clone(), mailer.clone(), config.clone())
            .execute("grace@example.com")
            .await
            .unwrap();
        let raw = token_from_mail(&mailer.last().unwrap(), "/auth/reset-password/");
        let reset = ResetPasswordUseCase::new(store.clone(), store.clone(), config.clone());

        // The reset commits between the sign-in's read and its write.
        let new_password = NewPassword::new("Brand#New2025pw".to_string(), &[]).unwrap();
        let new_hash = UserPassword::from_new(&new_password, None).unwrap();
        store.after_next_email_lookup(move |users| {
            for user in users.iter_mut().filter(|u| u.email.as_str() == "grace@example.com") {
                user.password_hash = Some(new_hash.clone());
                user.reset_token = None;
            }
        });
        SignInUseCase::new(store.clone(), store.clone(), config.clone())
            .execute(
                SignInInput {
                    email: "grace@example.com".to_string(),
                    password: "Lesson#Plan2024".to_string(),
                    remember_me: false,
                },
                &fingerprint("Firefox"),
            )
            .await
            .unwrap();

        let stored = store.user_by_email("grace@example.com").unwrap();
        assert!(stored.reset_token.is_none());
        assert!(matches!(
            reset.execute(&raw, "Another#New2025".to_string()).await,
            Err(AuthError::InvalidOrExpiredToken)
        ));

        let sign_in = SignInUseCase::new(store.clone(), store.clone(), config);
        let attempt = |password: &str| SignInInput {
            email: "grace@example.com".to_string(),
            password: password.to_string(),
            remember_me: false,
        };
        assert!(sign_in.execute(attempt("Brand#New2025pw"), &fingerprint("Firefox")).await.is_ok());
        assert!(matches!(
            sign_in.execute(attempt("Lesson#Plan2024"), &fingerprint("Firefox")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_rejected_password_keeps_link_usable() {
        let store = Arc::new(InMemoryAuthStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let config = Arc::new(AuthConfig::with_random_secret());
        seed_verified(&store).await;

        RequestPasswordResetUseCase::new(store.clone(), mailer.clone(), config.clone())
            .execute("grace@example.com")
            .await
            .unwrap();
        let raw = token_from_mail(&mailer.last().unwrap(), "/auth/reset-password/");
        let reset = ResetPasswordUseCase::new(store.clone(), store.clone(), config);

        let err = reset.execute(&raw, "short".to_string()).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation { field: "password", .. }));
        assert!(reset.execute(&raw, "Brand#New2025pw".to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_reset_token() {
        let store = Arc::new(InMemoryAuthStore::default());
        let user = seed_verified(&store).await;
        let stale = OneTimeToken {
            hash: OneTimeToken::digest("stale"),
            expires_at: Utc::now() - Duration::minutes(1),
        };
        assert!(UserRepository::set_reset_token(store.as_ref(), &user.user_id, &stale).await.unwrap());

        let err = ResetPasswordUseCase::new(
            store.clone(),
            store.clone(),
            Arc::new(AuthConfig::with_random_secret()),
        )
        .execute("stale", "Brand#New2025pw".to_string())
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn test_request_is_silent_for_unknown_and_oauth_only() {
        let store = Arc::new(InMemoryAuthStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let oauth_user = User::new_oauth(
            UserName::new("oauth_only").unwrap(),
            Email::new("oauth@example.com").unwrap(),
            OAuthLink {
                provider: OAuthProvider::Facebook,
                provider_id: "fb-1".to_string(),
                avatar_url: None,
            },
        );
        UserRepository::insert(store.as_ref(), &oauth_user).await.unwrap();

        let request = RequestPasswordResetUseCase::new(
            store.clone(),
            mailer.clone(),
            Arc::new(AuthConfig::with_random_secret()),
        );
        request.execute("nobody@example.com").await.unwrap();
        request.execute("oauth@example.com").await.unwrap();

        assert_eq!(mailer.count(), 0);
    }
}

#[cfg(test)]
mod oauth_tests {
    use std::sync::Arc;

    use crate::application::oauth::verify_state;
    use crate::application::{
        AuthConfig, OAuthCallbackInput, OAuthCallbackUseCase, OAuthStartUseCase,
    };
    use crate::domain::entity::user::User;
    use crate::domain::oauth::OAuthProfile;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{
        email::Email,
        oauth_provider::OAuthProvider,
        user_name::UserName,
        user_password::{NewPassword, UserPassword},
    };
    use crate::error::AuthError;

    use super::fakes::*;
    use super::sign_in_tests::fingerprint;

    fn profile(email: Option<&str>) -> OAuthProfile {
        OAuthProfile {
            provider: OAuthProvider::Google,
            provider_id: "google-42".to_string(),
            email: email.map(str::to_string),
            name: Some("Ada".to_string()),
            avatar_url: Some("https://img.test/ada.png".to_string()),
        }
    }

    struct Fixture {
        store: Arc<InMemoryAuthStore>,
        oauth: Arc<FakeOAuth>,
        config: Arc<AuthConfig>,
    }

    impl Fixture {
        fn new(profile: OAuthProfile) -> Self {
            Self {
                store: Arc::new(InMemoryAuthStore::default()),
                oauth: Arc::new(FakeOAuth::with_profile(profile)),
                config: Arc::new(AuthConfig::with_random_secret()),
            }
        }

        /// Runs `start` and returns (state, cookie)
        fn start(&self) -> (String, String) {
            let output = OAuthStartUseCase::new(self.oauth.clone(), self.config.clone())
                .execute(OAuthProvider::Google)
                .unwrap();
            let state = output
                .authorize_url
                .split("state=")
                .nth(1)
                .unwrap()
                .to_string();
            (state, output.state_cookie)
        }

        async fn callback(&self, input: OAuthCallbackInput) -> Result<crate::application::OAuthCallbackOutput, AuthError> {
            OAuthCallbackUseCase::new(
                self.store.clone(),
                self.store.clone(),
                self.oauth.clone(),
                self.config.clone(),
            )
            .execute(OAuthProvider::Google, input, &fingerprint("Firefox"))
            .await
        }
    }

    fn input(code: &str, state: &str, cookie: &str) -> OAuthCallbackInput {
        OAuthCallbackInput {
            code: Some(code.to_string()),
            state: Some(state.to_string()),
            error: None,
            state_cookie: Some(cookie.to_string()),
        }
    }

    #[tokio::test]
    async fn test_state_mismatch_fails_before_exchange() {
        let fx = Fixture::new(profile(Some("ada@example.com")));
        let (_, cookie) = fx.start();

        let err = fx.callback(input("code", "forged-state", &cookie)).await.unwrap_err();
        assert!(matches!(err, AuthError::OAuthStateMismatch));

        let err = fx
            .callback(OAuthCallbackInput {
                code: Some("code".to_string()),
                state: Some("anything".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OAuthStateMismatch));

        assert_eq!(fx.oauth.exchange_count(), 0);
        assert_eq!(fx.store.session_count(), 0);
    }

    #[test]
    fn test_state_cookie_is_bound_to_provider_and_secret() {
        let config = AuthConfig::with_random_secret();
        let oauth = Arc::new(FakeOAuth::with_profile(profile(None)));
        let output = OAuthStartUseCase::new(oauth, Arc::new(config.clone()))
            .execute(OAuthProvider::Google)
            .unwrap();
        let state = output.authorize_url.split("state=").nth(1).unwrap();

        assert!(verify_state(&config, OAuthProvider::Google, Some(&output.state_cookie), Some(state)).is_ok());
        assert!(verify_state(&config, OAuthProvider::Facebook, Some(&output.state_cookie), Some(state)).is_err());

        let other = AuthConfig::with_random_secret();
        assert!(verify_state(&other, OAuthProvider::Google, Some(&output.state_cookie), Some(state)).is_err());
    }

    #[tokio::test]
    async fn test_provider_error_and_missing_email() {
        let fx = Fixture::new(profile(None));

        let (state, cookie) = fx.start();
        let mut denied = input("code", &state, &cookie);
        denied.error = Some("access_denied".to_string());
        assert!(matches!(fx.callback(denied).await, Err(AuthError::OAuthProvider(_))));

        let (state, cookie) = fx.start();
        assert!(matches!(
            fx.callback(input("bad-code", &state, &cookie)).await,
            Err(AuthError::OAuthProvider(_))
        ));

        let (state, cookie) = fx.start();
        assert!(matches!(
            fx.callback(input("code", &state, &cookie)).await,
            Err(AuthError::OAuthNoEmail)
        ));

        assert_eq!(fx.store.session_count(), 0);
        assert!(fx.store.users.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_account_gets_suffixed_user_name() {
        let fx = Fixture::new(profile(Some("ada+lms@example.com")));
        let password = NewPassword::new("Lesson#Plan2024".to_string(), &[]).unwrap();
        let existing = User::new_local(
            UserName::new("ada").unwrap(),
            Email::new("someone@example.com").unwrap(),
            UserPassword::from_new(&password, None).unwrap(),
        );
        UserRepository::insert(fx.store.as_ref(), &existing).await.unwrap();

        let (state, cookie) = fx.start();
        let output = fx.callback(input("code", &state, &cookie)).await.unwrap();

        assert!(output.created);
        assert_eq!(output.user.user_name.as_str(), "ada1");
        assert!(output.user.email_verified);
        assert!(output.user.is_oauth_only());
        assert_eq!(fx.store.session_count(), 1);

        // Second sign-in finds the linked identity
        let (state, cookie) = fx.start();
        let again = fx.callback(input("code", &state, &cookie)).await.unwrap();
        assert!(!again.created);
        assert_eq!(again.user.user_id, output.user.user_id);
    }

    #[tokio::test]
    async fn test_email_taken_during_insert_links_that_account() {
        let fx = Fixture::new(profile(Some("ada@example.com")));
        let password = NewPassword::new("Lesson#Plan2024".to_string(), &[]).unwrap();
        let racer = User::new_local(
            UserName::new("ada_lovelace").unwrap(),
            Email::new("ada@example.com").unwrap(),
            UserPassword::from_new(&password, None).unwrap(),
        );
        let racer_id = racer.user_id;
        fx.store.before_next_insert(move |users| users.push(racer));

        let (state, cookie) = fx.start();
        let output = fx.callback(input("code", &state, &cookie)).await.unwrap();

        assert!(!output.created);
        assert_eq!(output.user.user_id, racer_id);
        assert_eq!(fx.store.users.lock().unwrap().len(), 1);
        let stored = fx.store.user_by_email("ada@example.com").unwrap();
        assert!(stored.email_verified);
        assert_eq!(stored.oauth.unwrap().provider_id, "google-42");
        assert_eq!(fx.store.session_count(), 1);
    }

    #[tokio::test]
    async fn test_identity_taken_during_insert_reuses_that_account() {
        let fx = Fixture::new(profile(Some("ada@example.com")));
        // A concurrent callback stored the identity under the provider's older email.
        let racer = User::new_oauth(
            UserName::new("ada_first").unwrap(),
            Email::new("ada.old@example.com").unwrap(),
            crate::domain::entity::user::OAuthLink {
                provider: OAuthProvider::Google,
                provider_id: "google-42".to_string(),
                avatar_url: None,
            },
        );
        let racer_id = racer.user_id;
        fx.store.before_next_insert(move |users| users.push(racer));

        let (state, cookie) = fx.start();
        let output = fx.callback(input("code", &state, &cookie)).await.unwrap();

        assert!(!output.created);
        assert_eq!(output.user.user_id, racer_id);
        assert_eq!(fx.store.users.lock().unwrap().len(), 1);
        assert!(fx.store.user_by_email("ada@example.com").is_none());
        assert_eq!(fx.store.session_count(), 1);
    }

    #[tokio::test]
    async fn test_existing_email_is_linked() {
        let fx = Fixture::new(profile(Some("grace@example.com")));
        let password = NewPassword::new("Lesson#Plan2024".to_string(), &[]).unwrap();
        let local = User::new_local(
            UserName::new("grace").unwrap(),
            Email::new("grace@example.com").unwrap(),
            UserPassword::from_new(&password, None).unwrap(),
        );
        UserRepository::insert(fx.store.as_ref(), &local).await.unwrap();

        let (state, cookie) = fx.start();
        let output = fx.callback(input("code", &state, &cookie)).await.unwrap();

        assert!(!output.created);
        assert_eq!(output.user.user_id, local.user_id);
        let stored = fx.store.user_by_email("grace@example.com").unwrap();
        assert!(stored.email_verified);
        assert_eq!(stored.oauth.unwrap().provider_id, "google-42");
        assert!(stored.password_hash.is_some());
    }
}

#[cfg(test)]
mod admin_tests {
    use std::sync::Arc;

    use kernel::id::SessionId;
    use kernel::principal::{CurrentUser, Role};

    use crate::application::{ChangeRoleUseCase, DeleteUserUseCase};
    use crate::domain::entity::user::User;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{
        email::Email,
        user_name::UserName,
        user_password::{NewPassword, UserPassword},
    };
    use crate::error::AuthError;

    use super::fakes::*;

    async fn seed(store: &InMemoryAuthStore, name: &str) -> User {
        let password = NewPassword::new("Lesson#Plan2024".to_string(), &[]).unwrap();
        let user = User::new_local(
            UserName::new(name).unwrap(),
            Email::new(format!("{name}@example.com")).unwrap(),
            UserPassword::from_new(&password, None).unwrap(),
        );
        UserRepository::insert(store, &user).await.unwrap();
        user
    }

    fn actor(user: &User) -> CurrentUser {
        CurrentUser {
            user_id: user.user_id,
            user_name: user.user_name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            role: Role::Admin,
            session_id: SessionId::new(),
        }
    }

    #[tokio::test]
    async fn test_change_role() {
        let store = Arc::new(InMemoryAuthStore::default());
        let admin = seed(&store, "admin_user").await;
        let student = seed(&store, "student").await;
        let use_case = ChangeRoleUseCase::new(store.clone());

        let updated = use_case
            .execute(&actor(&admin), student.user_id, Role::Instructor)
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Instructor);

        let err = use_case
            .execute(&actor(&admin), admin.user_id, Role::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::CannotModifySelf));

        let err = use_case
            .execute(&actor(&admin), kernel::id::UserId::new(), Role::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let store = Arc::new(InMemoryAuthStore::default());
        let admin = seed(&store, "admin_user").await;
        let student = seed(&store, "student").await;
        let use_case = DeleteUserUseCase::new(store.clone(), store.clone());

        assert!(matches!(
            use_case.execute(&actor(&admin), admin.user_id).await,
            Err(AuthError::CannotModifySelf)
        ));
        use_case.execute(&actor(&admin), student.user_id).await.unwrap();
        assert!(store.user_by_email("student@example.com").is_none());
        assert!(matches!(
            use_case.execute(&actor(&admin), student.user_id).await,
            Err(AuthError::UserNotFound)
        ));
    }
}

#[cfg(test)]
mod router_tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::middleware::from_fn_with_state;
    use tower::ServiceExt;

    use crate::application::AuthConfig;
    use crate::domain::oauth::OAuthProfile;
    use crate::domain::value_object::oauth_provider::OAuthProvider;
    use crate::presentation::{AuthAppState, auth_router_generic, resolve_session, session_layer_state};

    use super::fakes::*;

    fn app() -> Router {
        let state = AuthAppState::new(
            InMemoryAuthStore::default(),
            RecordingMailer::default(),
            FakeOAuth::with_profile(OAuthProfile {
                provider: OAuthProvider::Google,
                provider_id: "g".to_string(),
                email: None,
                name: None,
                avatar_url: None,
            }),
            AuthConfig::development(),
        );
        let session_state = session_layer_state(&state);

        auth_router_generic(state).layer(from_fn_with_state(session_state, resolve_session::<InMemoryAuthStore>))
    }

    #[tokio::test]
    async fn test_anonymous_requests_are_rejected() {
        let response = app()
            .oneshot(Request::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app()
            .oneshot(Request::get("/admin/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_cookie_is_cleared() {
        let response = app()
            .oneshot(
                Request::get("/me")
                    .header(header::COOKIE, "lms_session=not.valid")
                    .header(header::USER_AGENT, "Firefox")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cleared = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.starts_with("lms_session=;"));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_oauth_start_redirects_with_state_cookie() {
        let response = app()
            .oneshot(Request::get("/oauth/google/start").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert!(location.starts_with("https://provider.test/google/authorize?state="));
        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("lms_oauth_state="));
        assert!(cookie.contains("HttpOnly"));

        let response = app()
            .oneshot(Request::get("/oauth/myspace/start").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
