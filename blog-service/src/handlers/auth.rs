//! 登录

use axum::{body::Bytes, extract::State, Json};

use common::errors::AppResult;
use common::models::{LoginRequest, LoginResponse};
use common::response::ApiResponse;
use common::utils::parse_json;

use super::ok;
use crate::service::UserServiceTrait;
use crate::state::AppState;

/// 邮箱密码登录，成功后返回 Bearer 令牌
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功", body = ApiResponse<LoginResponse>),
        (status = 401, description = "邮箱或密码错误"),
        (status = 422, description = "请求参数无效")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let req: LoginRequest = parse_json(&body)?;
    let data = state.user_service().login(req).await?;
    Ok(ok(data))
}
