//! Resource-ownership authorization.
//!
//! Every mutation of an owned resource goes through [`authorize`] before the
//! storage layer is touched. Denial is final for the request.
//!
//! - No IO
//! - No panics
//! - Same rule for every owned resource type

use thiserror::Error;

use super::identity::SubjectId;

/// Subject is not allowed to perform the mutation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationError {
    /// The stored owner of the resource is someone else.
    #[error("subject {subject} does not own the resource (owner {owner})")]
    OwnerMismatch { subject: SubjectId, owner: SubjectId },

    /// The payload names an owner other than the subject.
    #[error("subject {subject} cannot act for declared owner {declared}")]
    DeclaredOwnerMismatch {
        subject: SubjectId,
        declared: SubjectId,
    },
}

impl AuthorizationError {
    /// Short classification for logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthorizationError::OwnerMismatch { .. } => "owner_mismatch",
            AuthorizationError::DeclaredOwnerMismatch { .. } => "declared_owner_mismatch",
        }
    }
}

/// A mutation attempt on an owned resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// New resource; `declared` is the owner named in the payload.
    Create { declared: SubjectId },

    /// Change to an existing resource. `owner` comes from storage, `declared`
    /// from the payload when the resource type carries an owner field.
    Update {
        owner: SubjectId,
        declared: Option<SubjectId>,
    },

    /// Removal of an existing resource owned by `owner`.
    Delete { owner: SubjectId },
}

/// The subject must be the stored owner.
pub fn ensure_owner(subject: SubjectId, owner: SubjectId) -> Result<(), AuthorizationError> {
    if subject == owner {
        Ok(())
    } else {
        Err(AuthorizationError::OwnerMismatch { subject, owner })
    }
}

fn ensure_declared(subject: SubjectId, declared: SubjectId) -> Result<(), AuthorizationError> {
    if subject == declared {
        Ok(())
    } else {
        Err(AuthorizationError::DeclaredOwnerMismatch { subject, declared })
    }
}

/// Decide whether `subject` may perform `mutation`.
///
/// For updates the stored owner is checked first, then the declared owner.
pub fn authorize(subject: SubjectId, mutation: &Mutation) -> Result<(), AuthorizationError> {
    match *mutation {
        Mutation::Create { declared } => ensure_declared(subject, declared),
        Mutation::Update { owner, declared } => {
            ensure_owner(subject, owner)?;
            match declared {
                Some(declared) => ensure_declared(subject, declared),
                None => Ok(()),
            }
        }
        Mutation::Delete { owner } => ensure_owner(subject, owner),
    }
}
