//! 用户服务模块

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::auth::{CredentialHasher, Mutation, SubjectId, TokenCodec};
use common::errors::{AppError, AppResult};
use common::models::{
    CreateUserRequest, LoginRequest, LoginResponse, RegisteredUser, UpdateUserRequest, User,
};
use common::response::{PageRequest, PaginatedData};
use common::utils::parse_json;

use super::{check_ownership, hash_password, verify_password};
use crate::repository::{NewUser, UserRepository};

/// 用户服务 Trait
#[async_trait]
pub trait UserServiceTrait: Send + Sync {
    /// 注册新用户并签发令牌
    async fn register(&self, req: CreateUserRequest) -> AppResult<RegisteredUser>;

    /// 邮箱密码登录
    async fn login(&self, req: LoginRequest) -> AppResult<LoginResponse>;

    /// 分页列出用户
    async fn list(&self, page: PageRequest) -> AppResult<PaginatedData<User>>;

    /// 根据 ID 获取用户
    async fn get(&self, id: SubjectId) -> AppResult<User>;

    /// 更新用户（只能更新自己），请求体在鉴权通过后才解析
    async fn update(&self, subject: SubjectId, id: SubjectId, body: &[u8]) -> AppResult<User>;

    /// 删除用户（只能删除自己）
    async fn delete(&self, subject: SubjectId, id: SubjectId) -> AppResult<()>;
}

/// 用户管理服务
pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<CredentialHasher>,
    tokens: Arc<TokenCodec>,
    dummy_hash: Arc<str>,
}

impl UserService {
    /// 创建新的用户服务实例
    ///
    /// `dummy_hash` 用同一 `hasher` 生成，邮箱不存在时仍对它校验一次。
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<CredentialHasher>,
        tokens: Arc<TokenCodec>,
        dummy_hash: Arc<str>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            dummy_hash,
        }
    }
}

#[async_trait]
impl UserServiceTrait for UserService {
    async fn register(&self, req: CreateUserRequest) -> AppResult<RegisteredUser> {
        let req = req.prepare()?;

        let password_hash = hash_password(self.hasher.clone(), req.password).await?;
        let user = self
            .users
            .insert_user(NewUser {
                nickname: req.nickname,
                email: req.email,
                password_hash,
            })
            .await?;

        // 令牌签发失败时撤销注册
        let issued = match self.tokens.issue(user.id, Utc::now()) {
            Ok(issued) => issued,
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "令牌签发失败，撤销注册");
                self.users.delete_user(user.id).await?;
                return Err(AppError::Internal(format!("token issue failed: {}", e)));
            }
        };

        tracing::info!(user_id = %user.id, "用户已注册");
        Ok(RegisteredUser {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    async fn login(&self, req: LoginRequest) -> AppResult<LoginResponse> {
        let req = req.prepare()?;

        // 未知邮箱与密码错误返回相同的错误
        let Some(stored) = self.users.find_credentials(&req.email).await? else {
            verify_password(self.hasher.clone(), self.dummy_hash.to_string(), req.password)
                .await?;
            tracing::warn!(reason = "unknown_email", "登录失败");
            return Err(AppError::InvalidLogin);
        };
        if !verify_password(self.hasher.clone(), stored.password_hash, req.password).await? {
            tracing::warn!(user_id = %stored.id, reason = "wrong_password", "登录失败");
            return Err(AppError::InvalidLogin);
        }

        let issued = self
            .tokens
            .issue(stored.id, Utc::now())
            .map_err(|e| AppError::Internal(format!("token issue failed: {}", e)))?;

        tracing::info!(user_id = %stored.id, "登录成功");
        Ok(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    async fn list(&self, page: PageRequest) -> AppResult<PaginatedData<User>> {
        let (items, total) = self.users.list_users(page).await?;
        Ok(PaginatedData::new(items, page, total))
    }

    async fn get(&self, id: SubjectId) -> AppResult<User> {
        self.users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into()))
    }

    async fn update(&self, subject: SubjectId, id: SubjectId, body: &[u8]) -> AppResult<User> {
        check_ownership(
            subject,
            Mutation::Update {
                owner: id,
                declared: None,
            },
        )?;

        let req: UpdateUserRequest = parse_json(body)?;
        let req = req.prepare()?;

        let password_hash = hash_password(self.hasher.clone(), req.password).await?;
        let user = self
            .users
            .update_user(
                id,
                NewUser {
                    nickname: req.nickname,
                    email: req.email,
                    password_hash,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("user".into()))?;

        tracing::info!(user_id = %id, "用户已更新");
        Ok(user)
    }

    async fn delete(&self, subject: SubjectId, id: SubjectId) -> AppResult<()> {
        check_ownership(subject, Mutation::Delete { owner: id })?;

        if self.users.delete_user(id).await? == 0 {
            return Err(AppError::NotFound("user".into()));
        }
        tracing::info!(user_id = %id, "用户已删除");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use common::auth::HashCost;

    use crate::repository::StoredCredentials;

    /// In-memory user table.
    #[derive(Default)]
    struct FakeUsers {
        rows: Mutex<Vec<(User, String)>>,
    }

    impl FakeUsers {
        fn count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl UserRepository for FakeUsers {
        async fn insert_user(&self, new: NewUser) -> AppResult<User> {
            let mut rows = self.rows.lock().unwrap();
            let now = Utc::now();
            let user = User {
                id: SubjectId::new(rows.len() as i64 + 1),
                nickname: new.nickname,
                email: new.email,
                created_at: now,
                updated_at: now,
            };
            rows.push((user.clone(), new.password_hash));
            Ok(user)
        }

        async fn find_user(&self, id: SubjectId) -> AppResult<Option<User>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
        }

        async fn find_credentials(&self, email: &str) -> AppResult<Option<StoredCredentials>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .find(|(u, _)| u.email == email)
                .map(|(u, hash)| StoredCredentials {
                    id: u.id,
                    password_hash: hash.clone(),
                }))
        }

        async fn list_users(&self, _page: PageRequest) -> AppResult<(Vec<User>, u64)> {
            let rows = self.rows.lock().unwrap();
            let users: Vec<User> = rows.iter().map(|(u, _)| u.clone()).collect();
            let total = users.len() as u64;
            Ok((users, total))
        }

        async fn update_user(&self, id: SubjectId, changes: NewUser) -> AppResult<Option<User>> {
            let mut rows = self.rows.lock().unwrap();
            Ok(rows.iter_mut().find(|(u, _)| u.id == id).map(|(u, hash)| {
                u.nickname = changes.nickname;
                u.email = changes.email;
                *hash = changes.password_hash;
                u.clone()
            }))
        }

        async fn delete_user(&self, id: SubjectId) -> AppResult<u64> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|(u, _)| u.id != id);
            Ok((before - rows.len()) as u64)
        }
    }

    fn hasher() -> Arc<CredentialHasher> {
        let cost = HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        Arc::new(CredentialHasher::new(cost).unwrap())
    }

    fn service(repo: Arc<FakeUsers>, ttl: Duration, dummy_hash: &str) -> UserService {
        let tokens = Arc::new(TokenCodec::new(b"unit-secret", ttl));
        UserService::new(repo, hasher(), tokens, Arc::from(dummy_hash))
    }

    fn valid_dummy() -> String {
        hasher().hash("placeholder").unwrap()
    }

    fn registration() -> CreateUserRequest {
        CreateUserRequest {
            nickname: "alice".into(),
            email: "alice@example.com".into(),
            password: "secret".into(),
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_unknown_email_still_runs_the_hasher() {
        // An unreadable dummy hash surfaces as a hashing error only if it is verified.
        let repo = Arc::new(FakeUsers::default());
        let service = service(repo, Duration::from_secs(60), "not-a-phc-string");

        let err = service
            .login(login("nobody@example.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Hashing(_)));
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_fail_alike() {
        let repo = Arc::new(FakeUsers::default());
        let service = service(repo, Duration::from_secs(60), &valid_dummy());
        service.register(registration()).await.unwrap();

        assert!(matches!(
            service.login(login("nobody@example.com", "secret")).await,
            Err(AppError::InvalidLogin)
        ));
        assert!(matches!(
            service.login(login("alice@example.com", "wrong")).await,
            Err(AppError::InvalidLogin)
        ));
        assert!(service.login(login("alice@example.com", "secret")).await.is_ok());
    }

    #[tokio::test]
    async fn test_registration_is_undone_when_token_cannot_be_issued() {
        let repo = Arc::new(FakeUsers::default());
        let service = service(
            repo.clone(),
            Duration::from_secs(10_000_000_000_000),
            &valid_dummy(),
        );

        let err = service.register(registration()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(repo.count(), 0);
    }

    #[tokio::test]
    async fn test_users_change_only_themselves() {
        let repo = Arc::new(FakeUsers::default());
        let service = service(repo.clone(), Duration::from_secs(60), &valid_dummy());
        let alice = service.register(registration()).await.unwrap().user.id;
        let bob = SubjectId::new(alice.get() + 1);

        assert!(matches!(
            service.delete(bob, alice).await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(repo.count(), 1);

        service.delete(alice, alice).await.unwrap();
        assert_eq!(repo.count(), 0);
    }
}
