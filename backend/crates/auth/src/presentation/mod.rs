//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::{AuthAppState, ClientContext};
pub use middleware::{AuthMiddlewareState, resolve_session};
pub use router::{auth_router, auth_router_generic, session_layer_state};
