//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod notifications;
pub mod oauth;
pub mod password_reset;
pub mod register;
pub mod session;
pub mod sign_in;
pub mod sign_out;
pub mod users;
pub mod verify_email;

pub use check_session::CheckSessionUseCase;
pub use config::AuthConfig;
pub use oauth::{
    OAuthCallbackInput, OAuthCallbackOutput, OAuthCallbackUseCase, OAuthStartOutput,
    OAuthStartUseCase,
};
pub use password_reset::{RequestPasswordResetUseCase, ResetPasswordUseCase};
pub use register::{RegisterInput, RegisterUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use users::{ChangeRoleUseCase, DeleteUserUseCase, GetProfileUseCase, ListUsersUseCase};
pub use verify_email::{ResendVerificationUseCase, VerifyEmailUseCase};
