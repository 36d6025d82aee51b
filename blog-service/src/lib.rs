//! 博客服务
//!
//! 提供用户与文章的增删改查：
//! - 注册、登录（Bearer 令牌）
//! - 文章只能由作者本人修改和删除
//! - OpenAPI 文档

pub mod handlers;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

use axum::{middleware, routing::get, Json, Router};
use common::middleware::request_id_middleware;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use state::AppState;

pub const SERVICE_NAME: &str = "blog-service";

/// 注册 Bearer 令牌认证方案
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "博客服务 API",
        version = "0.1.0",
        description = "用户与文章管理微服务"
    ),
    paths(
        handlers::auth::login,
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::posts::list_posts,
        handlers::posts::get_post,
        handlers::posts::create_post,
        handlers::posts::update_post,
        handlers::posts::delete_post,
        handlers::health::health_check,
    ),
    components(schemas(
        common::models::User,
        common::models::Post,
        common::models::PostRequest,
        common::models::CreateUserRequest,
        common::models::UpdateUserRequest,
        common::models::LoginRequest,
        common::models::LoginResponse,
        common::models::RegisteredUser,
        common::response::ApiError,
        common::response::Pagination,
        handlers::health::HealthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "登录端点"),
        (name = "users", description = "用户管理端点"),
        (name = "posts", description = "文章管理端点"),
        (name = "health", description = "健康检查端点")
    )
)]
pub struct ApiDoc;

/// 组装完整的应用路由
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router(&state))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
