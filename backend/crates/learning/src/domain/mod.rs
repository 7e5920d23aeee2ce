//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Course, Module, Lesson, Enrollment, ...)
//! - Domain value objects (Slug, status vocabularies)
//! - Domain services (progress, navigation, grading, cycle check)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
