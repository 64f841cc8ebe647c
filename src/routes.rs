// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, blogs, comments, posts},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, blogs, posts, comments).
/// * Applies global middleware (Trace, CORS).
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

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let blog_routes = Router::new()
        .route("/", get(blogs::list_blogs))
        .route("/{id}", get(blogs::get_blog))
        .route("/{id}/posts", get(blogs::list_blog_posts))
        // Admin routes: Auth first, then Admin check
        .merge(
            Router::new()
                .route("/", post(blogs::create_blog))
                .route(
                    "/{id}",
                    put(blogs::update_blog).delete(blogs::delete_blog),
                )
                .route("/{id}/posts", post(blogs::create_blog_post))
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let post_routes = Router::new()
        .route("/", get(posts::list_posts))
        .route("/{id}", get(posts::get_post))
        .route("/{id}/comments", get(posts::list_post_comments))
        // Protected routes (any logged-in user)
        .merge(
            Router::new()
                .route("/{id}/comments", post(posts::create_comment))
                .route("/{id}/like-status", put(posts::set_post_like_status))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        // Admin routes
        .merge(
            Router::new()
                .route("/", post(posts::create_post))
                .route(
                    "/{id}",
                    put(posts::update_post).delete(posts::delete_post),
                )
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let comment_routes = Router::new()
        .route("/{id}", get(comments::get_comment))
        .merge(
            Router::new()
                .route(
                    "/{id}",
                    put(comments::update_comment).delete(comments::delete_comment),
                )
                .route(
                    "/{id}/like-status",
                    put(comments::set_comment_like_status),
                )
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/blogs", blog_routes)
        .nest("/api/posts", post_routes)
        .nest("/api/comments", comment_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
