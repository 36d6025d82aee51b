//! 文章端点

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};

use common::auth::AuthenticatedSubject;
use common::errors::AppResult;
use common::models::{Post, PostRequest};
use common::response::{ApiResponse, PageRequest, PaginatedData};
use common::utils::parse_json;

use super::{created, deleted, ok, parse_id, Created, Deleted};
use crate::service::PostServiceTrait;
use crate::state::AppState;

/// 分页列出文章
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(PageRequest),
    responses(
        (status = 200, description = "文章列表", body = ApiResponse<PaginatedData<Post>>)
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<Json<ApiResponse<PaginatedData<Post>>>> {
    let data = state.post_service().list(page).await?;
    Ok(ok(data))
}

/// 根据 ID 获取文章
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "文章 ID")
    ),
    responses(
        (status = 200, description = "文章详情", body = ApiResponse<Post>),
        (status = 404, description = "文章未找到")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let id: i64 = parse_id(&id)?;
    let data = state.post_service().get(id).await?;
    Ok(ok(data))
}

/// 创建文章，`author_id` 必须是当前用户
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = PostRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "文章已创建", body = ApiResponse<Post>),
        (status = 401, description = "未认证"),
        (status = 403, description = "不能以其他用户身份创建"),
        (status = 409, description = "标题已被占用"),
        (status = 422, description = "请求参数无效")
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    subject: AuthenticatedSubject,
    body: Bytes,
) -> AppResult<Created<Post>> {
    let req: PostRequest = parse_json(&body)?;
    let data = state.post_service().create(subject.id(), req).await?;
    Ok(created(format!("/api/posts/{}", data.id), data))
}

/// 更新文章，只有作者本人可以修改
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "文章 ID")
    ),
    request_body = PostRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "文章已更新", body = ApiResponse<Post>),
        (status = 401, description = "未认证"),
        (status = 403, description = "不是文章作者"),
        (status = 404, description = "文章未找到"),
        (status = 422, description = "请求参数无效")
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    subject: AuthenticatedSubject,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<ApiResponse<Post>>> {
    let id: i64 = parse_id(&id)?;
    let data = state.post_service().update(subject.id(), id, &body).await?;
    Ok(ok(data))
}

/// 删除文章，只有作者本人可以删除
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "文章 ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "文章已删除"),
        (status = 401, description = "未认证"),
        (status = 403, description = "不是文章作者"),
        (status = 404, description = "文章未找到")
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    subject: AuthenticatedSubject,
    Path(id): Path<String>,
) -> AppResult<Deleted> {
    let id: i64 = parse_id(&id)?;
    state.post_service().delete(subject.id(), id).await?;
    Ok(deleted(id))
}
