//! Shared data models.

pub mod post;
pub mod user;

use validator::ValidationError;

/// Longest accepted text field, counted in characters before escaping.
pub const MAX_TEXT_LEN: usize = 255;

/// Upper length bound for text fields. Callers supply the message.
pub(crate) fn within_text_limit(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::new("length"));
    }
    Ok(())
}

// Re-export commonly used types
pub use post::{Post, PostRequest};
pub use user::{
    CreateUserRequest, LoginRequest, LoginResponse, RegisteredUser, UpdateUserRequest, User,
};
