//! Post models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use super::user::User;
use super::within_text_limit;
use crate::auth::SubjectId;
use crate::utils::escape_html;

/// A stored post with its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Post {
    /// Post identifier.
    pub id: i64,
    /// Unique title.
    pub title: String,
    pub content: String,
    /// Owner of the post. Set at creation and never changed.
    #[schema(value_type = i64)]
    pub author_id: SubjectId,
    /// The owning user.
    pub author: User,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating or updating a post.
///
/// `author_id` is the owner the client claims for the post. It must be the
/// caller's own id.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PostRequest {
    #[validate(
        length(min = 1, message = "title required"),
        custom(function = "within_text_limit", message = "title must be at most 255 characters")
    )]
    pub title: String,
    #[validate(
        length(min = 1, message = "content required"),
        custom(function = "within_text_limit", message = "content must be at most 255 characters")
    )]
    pub content: String,
    /// Declared owner.
    #[serde(default, alias = "AuthorId")]
    #[schema(value_type = i64)]
    #[validate(custom(function = "validate_author"))]
    pub author_id: SubjectId,
}

fn validate_author(author_id: &SubjectId) -> Result<(), ValidationError> {
    if author_id.get() < 1 {
        return Err(ValidationError::new("author").with_message("author required".into()));
    }
    Ok(())
}

impl PostRequest {
    /// Trims, validates, then escapes the text fields.
    ///
    /// Length limits apply to the text as submitted, not to its escaped form.
    pub fn prepare(self) -> Result<Self, ValidationErrors> {
        let trimmed = Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            author_id: self.author_id,
        };
        trimmed.validate()?;
        Ok(Self {
            title: escape_html(&trimmed.title),
            content: escape_html(&trimmed.content),
            author_id: trimmed.author_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MAX_TEXT_LEN;

    #[test]
    fn test_accepts_both_author_spellings() {
        let snake: PostRequest =
            serde_json::from_str(r#"{"title":"t","content":"c","author_id":4}"#).unwrap();
        let pascal: PostRequest =
            serde_json::from_str(r#"{"title":"t","content":"c","AuthorId":4}"#).unwrap();
        assert_eq!(snake.author_id, SubjectId::new(4));
        assert_eq!(pascal.author_id, SubjectId::new(4));
    }

    #[test]
    fn test_missing_author_fails_validation() {
        let req: PostRequest = serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        let author = &errors.field_errors()["author_id"][0];
        assert_eq!(author.message.as_deref(), Some("author required"));
    }

    #[test]
    fn test_blank_title_and_content_fail_after_prepare() {
        let errors = PostRequest {
            title: "   ".into(),
            content: "\t".into(),
            author_id: SubjectId::new(1),
        }
        .prepare()
        .unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
        assert!(errors.field_errors().contains_key("content"));
    }

    #[test]
    fn test_prepare_escapes_markup() {
        let req = PostRequest {
            title: " <script> ".into(),
            content: "a & b".into(),
            author_id: SubjectId::new(1),
        }
        .prepare()
        .unwrap();
        assert_eq!(req.title, "&lt;script&gt;");
        assert_eq!(req.content, "a &amp; b");
    }

    #[test]
    fn test_length_limit_counts_text_before_escaping() {
        let title = "&".repeat(MAX_TEXT_LEN);
        let req = PostRequest {
            title: title.clone(),
            content: "c".into(),
            author_id: SubjectId::new(1),
        }
        .prepare()
        .unwrap();
        assert_eq!(req.title, "&amp;".repeat(MAX_TEXT_LEN));

        let errors = PostRequest {
            title: format!("{title}x"),
            content: "c".into(),
            author_id: SubjectId::new(1),
        }
        .prepare()
        .unwrap_err();
        let message = errors.field_errors()["title"][0].message.clone();
        assert_eq!(message.as_deref(), Some("title must be at most 255 characters"));
    }
}
