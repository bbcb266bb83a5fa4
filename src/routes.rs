// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, comments, prompts},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, prompts, comments).
/// * Applies global middleware (Trace, CORS, rate limiting).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10)
        .burst_size(50)
        .finish()
        .unwrap();
    let governor_conf = Arc::new(governor_conf);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Anonymous requesters may browse prompts and comment threads; writes
    // require a valid bearer token. Comment listing handles the optional
    // token itself (it only drives affordance flags).
    let prompt_routes = Router::new()
        .route("/", get(prompts::list_prompts))
        .route(
            "/",
            post(prompts::create_prompt).route_layer(require_auth.clone()),
        )
        .route("/{id}", get(prompts::get_prompt))
        .route(
            "/{id}",
            put(prompts::update_prompt)
                .delete(prompts::delete_prompt)
                .route_layer(require_auth.clone()),
        )
        .route(
            "/{id}/upvote",
            post(prompts::toggle_upvote).route_layer(require_auth.clone()),
        )
        .route("/{id}/comments", get(comments::list_comments))
        .route(
            "/{id}/comments",
            post(comments::create_comment).route_layer(require_auth.clone()),
        )
        .route(
            "/{id}/comments/{comment_id}",
            put(comments::update_comment)
                .delete(comments::delete_comment)
                .route_layer(require_auth),
        );

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/prompts", prompt_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(GovernorLayer::new(governor_conf))
        .with_state(state)
}
