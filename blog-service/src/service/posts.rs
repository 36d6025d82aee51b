//! 文章服务模块
//!
//! 每个修改操作在触及存储之前都要经过所有权校验；更新与删除在存储层
//! 再以 `id AND author_id` 作为条件执行一次。

use std::sync::Arc;

use async_trait::async_trait;
use common::auth::{Mutation, SubjectId};
use common::errors::{AppError, AppResult};
use common::models::{Post, PostRequest};
use common::response::{PageRequest, PaginatedData};
use common::utils::parse_json;

use super::check_ownership;
use crate::repository::{NewPost, PostChanges, PostRepository};

/// 文章服务 Trait
#[async_trait]
pub trait PostServiceTrait: Send + Sync {
    /// 分页列出文章
    async fn list(&self, page: PageRequest) -> AppResult<PaginatedData<Post>>;

    /// 根据 ID 获取文章
    async fn get(&self, id: i64) -> AppResult<Post>;

    /// 以 `subject` 身份创建文章
    async fn create(&self, subject: SubjectId, req: PostRequest) -> AppResult<Post>;

    /// 更新文章；先校验存储中的作者，再解析请求体
    async fn update(&self, subject: SubjectId, id: i64, body: &[u8]) -> AppResult<Post>;

    /// 删除文章
    async fn delete(&self, subject: SubjectId, id: i64) -> AppResult<()>;
}

/// 文章管理服务
pub struct PostService {
    posts: Arc<dyn PostRepository>,
}

impl PostService {
    /// 创建新的文章服务实例
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }
}

#[async_trait]
impl PostServiceTrait for PostService {
    async fn list(&self, page: PageRequest) -> AppResult<PaginatedData<Post>> {
        let (items, total) = self.posts.list_posts(page).await?;
        Ok(PaginatedData::new(items, page, total))
    }

    async fn get(&self, id: i64) -> AppResult<Post> {
        self.posts
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound("post".into()))
    }

    async fn create(&self, subject: SubjectId, req: PostRequest) -> AppResult<Post> {
        check_ownership(
            subject,
            Mutation::Create {
                declared: req.author_id,
            },
        )?;

        let req = req.prepare()?;

        let post = self
            .posts
            .insert_post(NewPost {
                title: req.title,
                content: req.content,
                author_id: subject,
            })
            .await?;

        tracing::info!(post_id = post.id, author_id = %subject, "文章已创建");
        Ok(post)
    }

    async fn update(&self, subject: SubjectId, id: i64, body: &[u8]) -> AppResult<Post> {
        let owner = self.posts.load_owner(id).await?;
        check_ownership(
            subject,
            Mutation::Update {
                owner,
                declared: None,
            },
        )?;

        let req: PostRequest = parse_json(body)?;
        check_ownership(
            subject,
            Mutation::Update {
                owner,
                declared: Some(req.author_id),
            },
        )?;

        let req = req.prepare()?;

        let post = self
            .posts
            .update_if_owned_by(
                id,
                subject,
                PostChanges {
                    title: req.title,
                    content: req.content,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("post".into()))?;

        tracing::info!(post_id = id, "文章已更新");
        Ok(post)
    }

    async fn delete(&self, subject: SubjectId, id: i64) -> AppResult<()> {
        let owner = self.posts.load_owner(id).await?;
        check_ownership(subject, Mutation::Delete { owner })?;

        if self.posts.delete_if_owned_by(id, subject).await? == 0 {
            return Err(AppError::NotFound("post".into()));
        }
        tracing::info!(post_id = id, "文章已删除");
        Ok(())
    }
}
