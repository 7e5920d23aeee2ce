//! Request principal
//!
//! [`CurrentUser`] is resolved once per request by the session layer and
//! travels in the request extensions. Handlers take it as an extractor
//! instead of consulting any ambient session state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{SessionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum Role {
    #[default]
    Student = 0,
    Instructor = 1,
    Admin = 2,
}

impl Role {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Role::Student),
            1 => Some(Role::Instructor),
            2 => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "student" => Some(Role::Student),
            "instructor" => Some(Role::Instructor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Whether this role passes a gate that requires `required`.
    ///
    /// Instructor gates admit admins too; admin gates admit only admins.
    #[inline]
    pub const fn satisfies(&self, required: Role) -> bool {
        match required {
            Role::Student => true,
            Role::Instructor => matches!(self, Role::Instructor | Role::Admin),
            Role::Admin => matches!(self, Role::Admin),
        }
    }

    /// Instructors and admins can author content and preview unpublished lessons.
    #[inline]
    pub const fn is_staff(&self) -> bool {
        self.satisfies(Role::Instructor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Authenticated identity for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
    pub role: Role,
    pub session_id: SessionId,
}

impl CurrentUser {
    #[inline]
    pub fn has_role(&self, required: Role) -> bool {
        self.role.satisfies(required)
    }
}

#[cfg(feature = "axum")]
mod extract {
    use std::convert::Infallible;

    use axum::extract::{FromRequestParts, OptionalFromRequestParts, Request, State};
    use axum::middleware::Next;
    use axum::response::Response;
    use http::request::Parts;

    use super::{CurrentUser, Role};
    use crate::error::app_error::AppError;

    impl<S> FromRequestParts<S> for CurrentUser
    where
        S: Send + Sync,
    {
        type Rejection = AppError;

        async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
            parts
                .extensions
                .get::<CurrentUser>()
                .cloned()
                .ok_or_else(|| {
                    AppError::unauthorized("Authentication required").with_action("Sign in first")
                })
        }
    }

    impl<S> OptionalFromRequestParts<S> for CurrentUser
    where
        S: Send + Sync,
    {
        type Rejection = Infallible;

        async fn from_request_parts(
            parts: &mut Parts,
            _state: &S,
        ) -> Result<Option<Self>, Self::Rejection> {
            Ok(parts.extensions.get::<CurrentUser>().cloned())
        }
    }

    /// Role gate
    ///
    /// Mount with `axum::middleware::from_fn_with_state(Role::Instructor, require_role)`.
    /// Anonymous requests get 401, insufficient roles get 403.
    pub async fn require_role(
        State(required): State<Role>,
        req: Request,
        next: Next,
    ) -> Result<Response, AppError> {
        let Some(user) = req.extensions().get::<CurrentUser>() else {
            return Err(AppError::unauthorized("Authentication required").with_action("Sign in first"));
        };

        if !user.has_role(required) {
            tracing::debug!(
                user_id = %user.user_id,
                role = %user.role,
                required = %required,
                "Role gate rejected request"
            );
            return Err(AppError::forbidden(format!("{} access required", required.code())));
        }

        Ok(next.run(req).await)
    }
}

#[cfg(feature = "axum")]
pub use extract::require_role;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Id;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            user_id: Id::new(),
            user_name: "ada".to_string(),
            email: "ada@example.com".to_string(),
            role,
            session_id: Id::new(),
        }
    }

    #[test]
    fn test_role_codes() {
        for role in [Role::Student, Role::Instructor, Role::Admin] {
            assert_eq!(Role::from_code(role.code()), Some(role));
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_code("super_admin"), None);
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn test_instructor_gate_admits_admin() {
        assert!(!Role::Student.satisfies(Role::Instructor));
        assert!(Role::Instructor.satisfies(Role::Instructor));
        assert!(Role::Admin.satisfies(Role::Instructor));
    }

    #[test]
    fn test_admin_gate_admits_only_admin() {
        assert!(!Role::Student.satisfies(Role::Admin));
        assert!(!Role::Instructor.satisfies(Role::Admin));
        assert!(Role::Admin.satisfies(Role::Admin));
    }

    #[test]
    fn test_student_gate_admits_everyone() {
        assert!(user(Role::Student).has_role(Role::Student));
        assert!(user(Role::Admin).has_role(Role::Student));
    }

    #[cfg(feature = "axum")]
    mod gate {
        use axum::body::Body;
        use axum::routing::get;
        use axum::{Extension, Router, middleware};
        use http::{Request, StatusCode};
        use tower::ServiceExt;

        use super::user;
        use crate::principal::{CurrentUser, Role, require_role};

        fn app(required: Role, current: Option<CurrentUser>) -> Router {
            let router = Router::new()
                .route("/", get(|| async { "ok" }))
                .layer(middleware::from_fn_with_state(required, require_role));
            match current {
                Some(current) => router.layer(Extension(current)),
                None => router,
            }
        }

        async fn status(required: Role, current: Option<CurrentUser>) -> StatusCode {
            app(required, current)
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap()
                .status()
        }

        #[tokio::test]
        async fn anonymous_is_unauthorized() {
            assert_eq!(status(Role::Instructor, None).await, StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn wrong_role_is_forbidden() {
            assert_eq!(
                status(Role::Instructor, Some(user(Role::Student))).await,
                StatusCode::FORBIDDEN
            );
            assert_eq!(
                status(Role::Admin, Some(user(Role::Instructor))).await,
                StatusCode::FORBIDDEN
            );
        }

        #[tokio::test]
        async fn matching_role_passes() {
            assert_eq!(status(Role::Instructor, Some(user(Role::Admin))).await, StatusCode::OK);
            assert_eq!(status(Role::Admin, Some(user(Role::Admin))).await, StatusCode::OK);
        }
    }
}
