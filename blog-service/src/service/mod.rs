//! 业务服务模块

pub mod posts;
pub mod users;

pub use posts::{PostService, PostServiceTrait};
pub use users::{UserService, UserServiceTrait};

use std::sync::Arc;

use common::auth::{authorize, CredentialHasher, Mutation, SubjectId};
use common::errors::{AppError, AppResult};

/// 所有权校验，拒绝时记录原因
pub(crate) fn check_ownership(subject: SubjectId, mutation: Mutation) -> AppResult<()> {
    authorize(subject, &mutation).map_err(|e| {
        tracing::warn!(subject = %subject, reason = e.reason(), "鉴权拒绝");
        AppError::Forbidden(e)
    })
}

/// 在阻塞线程池中计算密码哈希
pub(crate) async fn hash_password(
    hasher: Arc<CredentialHasher>,
    password: String,
) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

/// 在阻塞线程池中校验密码
pub(crate) async fn verify_password(
    hasher: Arc<CredentialHasher>,
    hashed: String,
    candidate: String,
) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&hashed, &candidate))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(AppError::from)
}
