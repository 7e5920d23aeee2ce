//! Learning Router

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use kernel::principal::{Role, require_role};

use crate::domain::repository::{ImageStore, LearningStore};
use crate::infra::{postgres::PgLearningRepository, uploads::FsImageStore};
use crate::presentation::handlers::{self, LearningAppState};

/// Production wiring: Postgres and the upload directory
pub fn learning_router(state: LearningAppState<PgLearningRepository, FsImageStore>) -> Router {
    learning_router_generic(state)
}

/// Learning routes for any repository and image store.
///
/// Expects the session layer to run first so `CurrentUser` is available.
pub fn learning_router_generic<R, I>(state: LearningAppState<R, I>) -> Router
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let upload_limit = state.config.upload_body_limit();

    let admin = Router::new()
        .route(
            "/courses",
            get(handlers::admin_list_courses::<R, I>).post(handlers::create_course::<R, I>),
        )
        .route(
            "/courses/{id}",
            get(handlers::admin_course_outline::<R, I>)
                .put(handlers::update_course::<R, I>)
                .delete(handlers::delete_course::<R, I>),
        )
        .route("/courses/{id}/publish", post(handlers::publish_course::<R, I>))
        .route("/courses/{id}/unpublish", post(handlers::unpublish_course::<R, I>))
        .route(
            "/courses/{id}/modules",
            get(handlers::list_modules::<R, I>).post(handlers::create_module::<R, I>),
        )
        .route(
            "/modules/{id}",
            put(handlers::update_module::<R, I>).delete(handlers::delete_module::<R, I>),
        )
        .route("/modules/{id}/lessons", get(handlers::list_module_lessons::<R, I>))
        .route("/lessons", post(handlers::create_lesson::<R, I>))
        .route(
            "/lessons/{id}",
            put(handlers::update_lesson::<R, I>).delete(handlers::delete_lesson::<R, I>),
        )
        .route(
            "/lessons/{id}/exercises",
            get(handlers::list_exercises::<R, I>).post(handlers::create_exercise::<R, I>),
        )
        .route(
            "/exercises/{id}",
            put(handlers::update_exercise::<R, I>).delete(handlers::delete_exercise::<R, I>),
        )
        .route(
            "/lessons/{id}/blocks",
            get(handlers::list_blocks::<R, I>).post(handlers::create_block::<R, I>),
        )
        .route(
            "/blocks/{id}",
            put(handlers::update_block::<R, I>).delete(handlers::delete_block::<R, I>),
        )
        .route(
            "/uploads",
            post(handlers::upload_image::<R, I>).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(from_fn_with_state(Role::Instructor, require_role));

    Router::new()
        .route("/courses", get(handlers::list_courses::<R, I>))
        .route("/courses/{slug}", get(handlers::course_detail::<R, I>))
        .route(
            "/courses/{slug}/lessons/{lesson_slug}",
            get(handlers::view_lesson::<R, I>),
        )
        .route("/courses/{slug}/enroll", post(handlers::enroll::<R, I>))
        .route("/courses/{slug}/drop", post(handlers::drop_enrollment::<R, I>))
        .route("/dashboard", get(handlers::dashboard::<R, I>))
        .route("/lessons/{id}/complete", post(handlers::complete_lesson::<R, I>))
        .route("/lessons/{id}/time", post(handlers::track_time::<R, I>))
        .route("/lessons/{id}/bookmark", post(handlers::toggle_bookmark::<R, I>))
        .route("/bookmarks", get(handlers::list_bookmarks::<R, I>))
        .route("/exercises/{id}/submit", post(handlers::submit_exercise::<R, I>))
        .route("/exercises/{id}/submissions", get(handlers::list_submissions::<R, I>))
        .route("/uploads/{file}", get(handlers::serve_upload::<R, I>))
        .nest("/admin", admin)
        .with_state(state)
}
