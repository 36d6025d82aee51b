//! 路由模块
//!
//! 读取类端点公开；所有修改类端点挂在认证中间件之后。

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use common::middleware::auth_middleware;

use crate::handlers::{auth, health, posts, users};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let gate = from_fn_with_state(state.token_codec.clone(), auth_middleware);

    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/login", post(auth::login))
        .route(
            "/api/users",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/api/users/{id}",
            get(users::get_user).merge(
                put(users::update_user)
                    .delete(users::delete_user)
                    .route_layer(gate.clone()),
            ),
        )
        .route(
            "/api/posts",
            get(posts::list_posts).merge(post(posts::create_post).route_layer(gate.clone())),
        )
        .route(
            "/api/posts/{id}",
            get(posts::get_post).merge(
                put(posts::update_post)
                    .delete(posts::delete_post)
                    .route_layer(gate),
            ),
        )
}
