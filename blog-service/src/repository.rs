//! 持久化接口
//!
//! 服务层只依赖这些 trait，具体实现见 `store` 模块。

use async_trait::async_trait;

use common::auth::SubjectId;
use common::errors::AppResult;
use common::models::{Post, User};
use common::response::PageRequest;

/// 待写入的用户（密码已哈希）
#[derive(Clone)]
pub struct NewUser {
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
}

/// 登录校验所需的凭据
#[derive(Clone)]
pub struct StoredCredentials {
    pub id: SubjectId,
    pub password_hash: String,
}

/// 待写入的文章
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: SubjectId,
}

/// 文章可修改的字段，作者不在其中
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
}

/// 用户存储
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 插入用户，返回新记录
    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    /// 根据 ID 查询用户
    async fn find_user(&self, id: SubjectId) -> AppResult<Option<User>>;

    /// 根据邮箱查询登录凭据
    async fn find_credentials(&self, email: &str) -> AppResult<Option<StoredCredentials>>;

    /// 分页列出用户，同时返回总数
    async fn list_users(&self, page: PageRequest) -> AppResult<(Vec<User>, u64)>;

    /// 整体替换用户字段；用户不存在时返回 `None`
    async fn update_user(&self, id: SubjectId, changes: NewUser) -> AppResult<Option<User>>;

    /// 删除用户及其文章，返回受影响行数
    async fn delete_user(&self, id: SubjectId) -> AppResult<u64>;
}

/// 文章存储
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> AppResult<Post>;

    async fn find_post(&self, id: i64) -> AppResult<Option<Post>>;

    async fn list_posts(&self, page: PageRequest) -> AppResult<(Vec<Post>, u64)>;

    /// 读取文章当前的作者；文章不存在时返回 `NotFound`
    async fn load_owner(&self, id: i64) -> AppResult<SubjectId>;

    /// 仅当 `id` 与 `owner` 同时匹配时更新，不匹配时返回 `None`
    async fn update_if_owned_by(
        &self,
        id: i64,
        owner: SubjectId,
        changes: PostChanges,
    ) -> AppResult<Option<Post>>;

    /// 仅当 `id` 与 `owner` 同时匹配时删除，返回受影响行数
    async fn delete_if_owned_by(&self, id: i64, owner: SubjectId) -> AppResult<u64>;
}
