//! Value Object Module

pub mod email;
pub mod oauth_provider;
pub mod one_time_token;
pub mod user_name;
pub mod user_password;
