//! Handler模块

pub mod auth;
pub mod health;
pub mod posts;
pub mod users;

use axum::http::{header::LOCATION, HeaderName, StatusCode};
use axum::Json;
use serde::Serialize;

use common::errors::{AppError, AppResult};
use common::response::ApiResponse;

use crate::SERVICE_NAME;

/// 删除成功时返回被删除资源 ID 的响应头
pub const ENTITY_HEADER: HeaderName = HeaderName::from_static("entity");

/// 201 响应：`Location` 头加数据
pub type Created<T> = (StatusCode, [(HeaderName, String); 1], Json<ApiResponse<T>>);

/// 204 响应：`Entity` 头
pub type Deleted = (StatusCode, [(HeaderName, String); 1]);

pub(crate) fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok_with_service(data, SERVICE_NAME))
}

pub(crate) fn created<T: Serialize>(location: String, data: T) -> Created<T> {
    (StatusCode::CREATED, [(LOCATION, location)], ok(data))
}

pub(crate) fn deleted(id: impl ToString) -> Deleted {
    (StatusCode::NO_CONTENT, [(ENTITY_HEADER, id.to_string())])
}

/// 解析路径中的数字 ID
pub(crate) fn parse_id<T: std::str::FromStr>(raw: &str) -> AppResult<T> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {}", raw)))
}
