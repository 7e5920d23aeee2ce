//! Infrastructure Layer
//!
//! PostgreSQL repository and the filesystem image store.

pub mod postgres;
pub mod uploads;

pub use postgres::PgLearningRepository;
pub use uploads::FsImageStore;
