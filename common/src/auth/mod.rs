//! Authentication and resource-ownership authorization.

pub mod hasher;
pub mod identity;
pub mod ownership;
pub mod token;

// Re-export commonly used types
pub use hasher::{CredentialHasher, HashCost, HashingError};
pub use identity::{extract_subject, AuthError, AuthenticatedSubject, SubjectId};
pub use ownership::{authorize, ensure_owner, AuthorizationError, Mutation};
pub use token::{Claims, IssuedToken, TokenCodec, TokenError};
