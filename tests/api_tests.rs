// tests/api_tests.rs

use blog_backend::{config::Config, routes, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

struct TestApp {
    address: String,
    pool: PgPool,
}

/// Spawns the app on a random port against the database from DATABASE_URL.
/// Returns None (skipping the test) when no database is configured.
async fn spawn_app() -> Option<TestApp> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_login: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
    })
}

fn unique_login() -> String {
    // Login is capped at 10 chars
    format!("u_{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
}

/// Registers a fresh user and returns (login, bearer token).
async fn register_user(app: &TestApp, client: &reqwest::Client) -> (String, String) {
    let login = unique_login();
    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({ "login": login, "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let token = login_user(app, client, &login).await;
    (login, token)
}

async fn login_user(app: &TestApp, client: &reqwest::Client, login: &str) -> String {
    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "login": login, "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

/// Registers a user, promotes it to admin, and logs in again so the token
/// carries the admin role.
async fn register_admin(app: &TestApp, client: &reqwest::Client) -> String {
    let (login, _) = register_user(app, client).await;
    sqlx::query("UPDATE users SET role = 'admin' WHERE login = $1")
        .bind(&login)
        .execute(&app.pool)
        .await
        .expect("Failed to promote user to admin");
    login_user(app, client, &login).await
}

async fn create_blog(app: &TestApp, client: &reqwest::Client, admin_token: &str) -> String {
    let response = client
        .post(format!("{}/api/blogs", app.address))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "name": "testblog",
            "description": "integration test blog",
            "websiteUrl": "https://example.com/blog"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn create_post(
    app: &TestApp,
    client: &reqwest::Client,
    admin_token: &str,
    blog_id: &str,
    title: &str,
) -> String {
    let response = client
        .post(format!("{}/api/blogs/{}/posts", app.address, blog_id))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "title": title,
            "shortDescription": "short description",
            "content": "post content"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn set_like_status(
    app: &TestApp,
    client: &reqwest::Client,
    token: &str,
    path: &str,
    status: &str,
) {
    let response = client
        .put(format!("{}{}/like-status", app.address, path))
        .bearer_auth(token)
        .json(&serde_json::json!({ "likeStatus": status }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 204);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn blog_posts_paginate_with_exact_totals() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let admin_token = register_admin(&app, &client).await;
    let blog_id = create_blog(&app, &client, &admin_token).await;

    for i in 0..15 {
        create_post(&app, &client, &admin_token, &blog_id, &format!("post {:02}", i)).await;
    }

    let response = client
        .get(format!(
            "{}/api/blogs/{}/posts?pageNumber=2&pageSize=10",
            app.address, blog_id
        ))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["pagesCount"], 2);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pageSize"], 10);
    assert_eq!(body["totalCount"], 15);
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn unknown_sort_field_falls_back_to_created_at_desc() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let admin_token = register_admin(&app, &client).await;
    let blog_id = create_blog(&app, &client, &admin_token).await;

    for title in ["first", "second", "third"] {
        create_post(&app, &client, &admin_token, &blog_id, title).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let response = client
        .get(format!(
            "{}/api/blogs/{}/posts?sortBy=foo&sortDirection=bogus",
            app.address, blog_id
        ))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    // Newest first
    assert_eq!(items[0]["title"], "third");
    assert_eq!(items[2]["title"], "first");
}

#[tokio::test]
async fn listing_honors_explicit_title_sort() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let admin_token = register_admin(&app, &client).await;
    let blog_id = create_blog(&app, &client, &admin_token).await;

    for title in ["banana", "apple", "cherry"] {
        create_post(&app, &client, &admin_token, &blog_id, title).await;
    }

    let response = client
        .get(format!(
            "{}/api/blogs/{}/posts?sortBy=title&sortDirection=asc",
            app.address, blog_id
        ))
        .send()
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = response.json().await.unwrap();
    let titles: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["apple", "banana", "cherry"]);
}

#[tokio::test]
async fn post_reactions_aggregate_per_viewer() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let admin_token = register_admin(&app, &client).await;
    let blog_id = create_blog(&app, &client, &admin_token).await;
    let post_id = create_post(&app, &client, &admin_token, &blog_id, "liked post").await;
    let post_path = format!("/api/posts/{}", post_id);

    let (u1_login, u1) = register_user(&app, &client).await;
    let (_, u2) = register_user(&app, &client).await;
    let (_, u3) = register_user(&app, &client).await;

    set_like_status(&app, &client, &u1, &post_path, "Like").await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    set_like_status(&app, &client, &u2, &post_path, "Like").await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    set_like_status(&app, &client, &u3, &post_path, "Dislike").await;

    // Viewer u2 sees its own Like
    let body: serde_json::Value = client
        .get(format!("{}{}", app.address, post_path))
        .bearer_auth(&u2)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let info = &body["extendedLikesInfo"];
    assert_eq!(info["likesCount"], 2);
    assert_eq!(info["dislikesCount"], 1);
    assert_eq!(info["myStatus"], "Like");

    // Anonymous viewer always sees None
    let body: serde_json::Value = client
        .get(format!("{}{}", app.address, post_path))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["extendedLikesInfo"]["myStatus"], "None");

    // newestLikes is newest-first and only contains likes
    let newest = body["extendedLikesInfo"]["newestLikes"].as_array().unwrap();
    assert_eq!(newest.len(), 2);
    assert_eq!(newest[1]["login"], u1_login);

    // A fourth and fifth like cap newestLikes at 3
    let (_, u4) = register_user(&app, &client).await;
    let (u5_login, u5) = register_user(&app, &client).await;
    set_like_status(&app, &client, &u4, &post_path, "Like").await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    set_like_status(&app, &client, &u5, &post_path, "Like").await;

    let body: serde_json::Value = client
        .get(format!("{}{}", app.address, post_path))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let info = &body["extendedLikesInfo"];
    assert_eq!(info["likesCount"], 4);
    let newest = info["newestLikes"].as_array().unwrap();
    assert_eq!(newest.len(), 3);
    assert_eq!(newest[0]["login"], u5_login);
}

#[tokio::test]
async fn like_is_idempotent_and_none_removes_the_row() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let admin_token = register_admin(&app, &client).await;
    let blog_id = create_blog(&app, &client, &admin_token).await;
    let post_id = create_post(&app, &client, &admin_token, &blog_id, "idempotent").await;
    let post_path = format!("/api/posts/{}", post_id);

    let (_, token) = register_user(&app, &client).await;

    // Like twice collapses to one row
    set_like_status(&app, &client, &token, &post_path, "Like").await;
    set_like_status(&app, &client, &token, &post_path, "Like").await;

    let body: serde_json::Value = client
        .get(format!("{}{}", app.address, post_path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["extendedLikesInfo"]["likesCount"], 1);
    assert_eq!(body["extendedLikesInfo"]["myStatus"], "Like");

    // Switching to Dislike updates in place
    set_like_status(&app, &client, &token, &post_path, "Dislike").await;
    let body: serde_json::Value = client
        .get(format!("{}{}", app.address, post_path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["extendedLikesInfo"]["likesCount"], 0);
    assert_eq!(body["extendedLikesInfo"]["dislikesCount"], 1);

    // None deletes the row
    set_like_status(&app, &client, &token, &post_path, "None").await;
    let body: serde_json::Value = client
        .get(format!("{}{}", app.address, post_path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["extendedLikesInfo"]["likesCount"], 0);
    assert_eq!(body["extendedLikesInfo"]["dislikesCount"], 0);
    assert_eq!(body["extendedLikesInfo"]["myStatus"], "None");

    // Junk status is rejected
    let response = client
        .put(format!("{}{}/like-status", app.address, post_path))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "likeStatus": "Superlike" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Anonymous callers may not react
    let response = client
        .put(format!("{}{}/like-status", app.address, post_path))
        .json(&serde_json::json!({ "likeStatus": "Like" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn comment_lifecycle_with_owner_checks() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let admin_token = register_admin(&app, &client).await;
    let blog_id = create_blog(&app, &client, &admin_token).await;
    let post_id = create_post(&app, &client, &admin_token, &blog_id, "commented").await;

    let (author_login, author) = register_user(&app, &client).await;
    let (_, other) = register_user(&app, &client).await;

    // Too-short content fails validation
    let response = client
        .post(format!("{}/api/posts/{}/comments", app.address, post_id))
        .bearer_auth(&author)
        .json(&serde_json::json!({ "content": "too short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(format!("{}/api/posts/{}/comments", app.address, post_id))
        .bearer_auth(&author)
        .json(&serde_json::json!({ "content": "a perfectly reasonable comment" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let comment: serde_json::Value = response.json().await.unwrap();
    let comment_id = comment["id"].as_str().unwrap().to_string();
    assert_eq!(comment["commentatorInfo"]["userLogin"], author_login);
    assert_eq!(comment["likesInfo"]["myStatus"], "None");

    // Reactions on the comment
    set_like_status(
        &app,
        &client,
        &other,
        &format!("/api/comments/{}", comment_id),
        "Like",
    )
    .await;
    let body: serde_json::Value = client
        .get(format!("{}/api/comments/{}", app.address, comment_id))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["likesInfo"]["likesCount"], 1);
    assert_eq!(body["likesInfo"]["myStatus"], "Like");

    // Only the author may edit
    let response = client
        .put(format!("{}/api/comments/{}", app.address, comment_id))
        .bearer_auth(&other)
        .json(&serde_json::json!({ "content": "edited by someone else entirely" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .put(format!("{}/api/comments/{}", app.address, comment_id))
        .bearer_auth(&author)
        .json(&serde_json::json!({ "content": "edited by the original author" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    // Soft delete hides the comment from reads
    let response = client
        .delete(format!("{}/api/comments/{}", app.address, comment_id))
        .bearer_auth(&author)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .get(format!("{}/api/comments/{}", app.address, comment_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let body: serde_json::Value = client
        .get(format!("{}/api/posts/{}/comments", app.address, post_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalCount"], 0);
}

#[tokio::test]
async fn listing_comments_of_unknown_post_is_404() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .get(format!(
            "{}/api/posts/{}/comments",
            app.address,
            uuid::Uuid::new_v4()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn non_admin_cannot_create_blogs() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (_, token) = register_user(&app, &client).await;

    let response = client
        .post(format!("{}/api/blogs", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "name": "nope",
            "description": "not allowed",
            "websiteUrl": "https://example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn blog_search_and_soft_delete() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let admin_token = register_admin(&app, &client).await;

    // Unique searchable name
    let marker = &uuid::Uuid::new_v4().simple().to_string()[..8];
    let response = client
        .post(format!("{}/api/blogs", app.address))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "name": format!("b{}", &marker[..6]),
            "description": "searchable",
            "websiteUrl": "https://example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let blog: serde_json::Value = response.json().await.unwrap();
    let blog_id = blog["id"].as_str().unwrap();

    let body: serde_json::Value = client
        .get(format!(
            "{}/api/blogs?searchNameTerm={}",
            app.address,
            &marker[..6].to_uppercase()
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["items"][0]["id"], *blog_id);

    let response = client
        .delete(format!("{}/api/blogs/{}", app.address, blog_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .get(format!("{}/api/blogs/{}", app.address, blog_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
