//! User account models.
//!
//! Request bodies carry plaintext passwords; their `Debug` output never
//! includes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use super::within_text_limit;
use crate::auth::SubjectId;
use crate::utils::escape_html;

/// A registered user as returned by the API (no password hash).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// User identifier.
    #[schema(value_type = i64)]
    pub id: SubjectId,
    /// Unique display name.
    pub nickname: String,
    /// Unique email address.
    pub email: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Request body for registering a user.
#[derive(Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    /// Display name.
    #[validate(
        length(min = 1, message = "nickname required"),
        custom(function = "within_text_limit", message = "nickname must be at most 255 characters")
    )]
    pub nickname: String,
    /// Email address.
    #[validate(
        length(min = 1, message = "email required"),
        email(message = "invalid email")
    )]
    pub email: String,
    /// Plaintext password.
    #[validate(length(min = 1, max = 100, message = "password required"))]
    pub password: String,
}

/// Request body for updating a user. All fields are replaced.
#[derive(Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, message = "nickname required"),
        custom(function = "within_text_limit", message = "nickname must be at most 255 characters")
    )]
    pub nickname: String,
    #[validate(
        length(min = 1, message = "email required"),
        email(message = "invalid email")
    )]
    pub email: String,
    /// New plaintext password.
    #[validate(length(min = 1, max = 100, message = "password required"))]
    pub password: String,
}

/// Request body for logging in.
#[derive(Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(
        length(min = 1, message = "email required"),
        email(message = "invalid email")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "password required"))]
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

/// Successful registration: the new user plus a token for it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisteredUser {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl CreateUserRequest {
    /// Trims, validates, then escapes the text fields. The password is left
    /// untouched.
    pub fn prepare(self) -> Result<Self, ValidationErrors> {
        let trimmed = Self {
            nickname: self.nickname.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        };
        trimmed.validate()?;
        Ok(Self {
            nickname: escape_html(&trimmed.nickname),
            email: escape_html(&trimmed.email),
            password: trimmed.password,
        })
    }
}

impl UpdateUserRequest {
    /// Trims, validates, then escapes the text fields. The password is left
    /// untouched.
    pub fn prepare(self) -> Result<Self, ValidationErrors> {
        let trimmed = Self {
            nickname: self.nickname.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        };
        trimmed.validate()?;
        Ok(Self {
            nickname: escape_html(&trimmed.nickname),
            email: escape_html(&trimmed.email),
            password: trimmed.password,
        })
    }
}

impl LoginRequest {
    pub fn prepare(self) -> Result<Self, ValidationErrors> {
        let trimmed = Self {
            email: self.email.trim().to_string(),
            password: self.password,
        };
        trimmed.validate()?;
        Ok(Self {
            email: escape_html(&trimmed.email),
            password: trimmed.password,
        })
    }
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for UpdateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateUserRequest")
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
