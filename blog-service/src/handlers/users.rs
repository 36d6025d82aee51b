//! 用户端点

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};

use common::auth::{AuthenticatedSubject, SubjectId};
use common::errors::AppResult;
use common::models::{CreateUserRequest, RegisteredUser, UpdateUserRequest, User};
use common::response::{ApiResponse, PageRequest, PaginatedData};
use common::utils::parse_json;

use super::{created, deleted, ok, parse_id, Created, Deleted};
use crate::service::UserServiceTrait;
use crate::state::AppState;

/// 注册新用户
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "用户已创建", body = ApiResponse<RegisteredUser>),
        (status = 409, description = "昵称或邮箱已被占用"),
        (status = 422, description = "请求参数无效")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Created<RegisteredUser>> {
    let req: CreateUserRequest = parse_json(&body)?;
    let data = state.user_service().register(req).await?;
    Ok(created(format!("/api/users/{}", data.user.id), data))
}

/// 分页列出用户
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(PageRequest),
    responses(
        (status = 200, description = "用户列表", body = ApiResponse<PaginatedData<User>>)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<Json<ApiResponse<PaginatedData<User>>>> {
    let data = state.user_service().list(page).await?;
    Ok(ok(data))
}

/// 根据 ID 获取用户
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "用户 ID")
    ),
    responses(
        (status = 200, description = "用户详情", body = ApiResponse<User>),
        (status = 404, description = "用户未找到")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<User>>> {
    let id: SubjectId = parse_id(&id)?;
    let data = state.user_service().get(id).await?;
    Ok(ok(data))
}

/// 更新用户，只能更新自己
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "用户 ID")
    ),
    request_body = UpdateUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "用户已更新", body = ApiResponse<User>),
        (status = 401, description = "未认证"),
        (status = 403, description = "不能修改其他用户"),
        (status = 404, description = "用户未找到")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    subject: AuthenticatedSubject,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<ApiResponse<User>>> {
    let id: SubjectId = parse_id(&id)?;
    let data = state.user_service().update(subject.id(), id, &body).await?;
    Ok(ok(data))
}

/// 删除用户及其全部文章，只能删除自己
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "用户 ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "用户已删除"),
        (status = 401, description = "未认证"),
        (status = 403, description = "不能删除其他用户"),
        (status = 404, description = "用户未找到")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    subject: AuthenticatedSubject,
    Path(id): Path<String>,
) -> AppResult<Deleted> {
    let id: SubjectId = parse_id(&id)?;
    state.user_service().delete(subject.id(), id).await?;
    Ok(deleted(id))
}
