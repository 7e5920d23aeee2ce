//! Success envelope
//!
//! Counterpart of the `AppError` body: every successful JSON action answers
//! `{ "success": true, ...payload }`.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Success<T> {
    success: bool,
    #[serde(flatten)]
    data: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

/// Payload-less acknowledgement with a human readable message
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
}

impl Success<Message> {
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(Message {
            message: message.into(),
        })
    }
}

#[cfg(feature = "axum")]
impl<T: Serialize> axum::response::IntoResponse for Success<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Bookmark {
        bookmarked: bool,
    }

    #[test]
    fn test_payload_is_flattened() {
        let value = serde_json::to_value(Success::new(Bookmark { bookmarked: true })).unwrap();
        assert_eq!(value, serde_json::json!({ "success": true, "bookmarked": true }));
    }

    #[test]
    fn test_message() {
        let value = serde_json::to_value(Success::message("Signed out")).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Signed out");
    }
}
