//! Learning Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, pure services
//! - `application/` - Use cases and content authoring services
//! - `infra/` - PostgreSQL repository and the filesystem image store
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Course catalog with modules, lessons, content blocks and exercises
//! - Enrollment ledger with capacity limits, drop and re-enroll
//! - Lesson progress, time tracking and course completion
//! - Exercise submissions graded against the stored solution
//! - Bookmarks and a per-user dashboard
//! - Instructor authoring and image uploads
//!
//! Requests arrive already authenticated: the auth crate's session layer puts
//! a `CurrentUser` into the request extensions and handlers extract it.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


pub use application::config::LearningConfig;
pub use error::{LearningError, LearningResult};
pub use infra::{postgres::PgLearningRepository, uploads::FsImageStore};
pub use presentation::handlers::LearningAppState;
pub use presentation::router::{learning_router, learning_router_generic};

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}
