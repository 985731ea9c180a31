use crate::helpers::{assert_is_redirect_to, spawn_app, TestApp};

async fn store_posts(app: &TestApp, count: usize) {
    for n in 0..count {
        sqlx::query("INSERT INTO posts (body, timestamp, user_id) VALUES (?, ?, ?)")
            .bind(format!("post number {:03}", n))
            .bind(chrono::Utc::now() + chrono::Duration::seconds(n as i64))
            .bind(app.test_user.user_id)
            .execute(&app.db_pool)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn a_valid_post_is_published() {
    // arrange
    let app = spawn_app().await;
    app.login().await;

    // act 1: publish
    let response = app.post_index("Hello, world!").await;
    assert_is_redirect_to(&response, "/index");

    // act 2: follow the redirect
    let html_page = app.get_index_html().await;
    assert!(html_page.contains("Your post is now live!"));
    assert!(html_page.contains("Hello, world!"));
}

#[tokio::test]
async fn posts_are_escaped_when_rendered() {
    // arrange
    let app = spawn_app().await;
    app.login().await;

    // act
    app.post_index("<b>bold</b>").await;

    // assert
    let html_page = app.get_index_html().await;
    assert!(html_page.contains("&lt;b&gt;bold&lt;/b&gt;"));
    assert!(!html_page.contains("<b>bold</b>"));
}

#[tokio::test]
async fn invalid_posts_are_reported_on_the_form() {
    // arrange
    let app = spawn_app().await;
    app.login().await;
    let test_cases = vec![
        (String::new(), "This field is required."),
        ("   ".to_string(), "This field is required."),
        (
            "x".repeat(141),
            "Field must be between 1 and 140 characters long.",
        ),
    ];

    for (post, message) in test_cases {
        // act
        let response = app.post_index(&post).await;

        // assert
        assert_eq!(response.status().as_u16(), 200);
        assert!(response.text().await.unwrap().contains(message));
    }
    let posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(posts, 0);
}

#[tokio::test]
async fn anonymous_users_cannot_post() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.post_index("Hello, world!").await;

    // assert
    assert_is_redirect_to(&response, "/auth/login?next=%2Findex");
}

#[tokio::test]
async fn the_timeline_is_paginated_newest_first() {
    // arrange
    let app = spawn_app().await;
    app.login().await;
    store_posts(&app, 26).await;

    // act 1: the first page
    let html_page = app.get_index_html().await;
    assert!(html_page.contains("post number 025"));
    assert!(!html_page.contains("post number 000"));
    assert!(html_page.contains(r#"href="/index?page=2""#));
    assert!(!html_page.contains("Newer posts"));

    // act 2: the second page
    let html_page = app.get_html("/index?page=2").await;
    assert!(html_page.contains("post number 000"));
    assert!(!html_page.contains("post number 025"));
    assert!(html_page.contains(r#"href="/index?page=1""#));
    assert!(!html_page.contains("Older posts"));
}

#[tokio::test]
async fn a_profile_lists_the_users_posts() {
    // arrange
    let app = spawn_app().await;
    app.login().await;
    app.post_index("My first post").await;

    // act
    let response = app
        .get(&format!("/user/{}", app.test_user.username))
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains(&format!("User: {}", app.test_user.username)));
    assert!(html_page.contains("My first post"));
}

#[tokio::test]
async fn an_unknown_profile_is_not_found() {
    // arrange
    let app = spawn_app().await;
    app.login().await;

    // act
    let response = app.get("/user/nobody-by-that-name").await;

    // assert
    assert_eq!(response.status().as_u16(), 404);
    assert!(response.text().await.unwrap().contains("File Not Found"));
}

#[tokio::test]
async fn pages_are_translated_for_the_preferred_language() {
    // arrange
    let app = spawn_app().await;
    app.login().await;

    // act
    let response = app
        .api_client
        .get(&format!("{}/index", app.address))
        .header("Accept-Language", "es-MX,es;q=0.9,en;q=0.8")
        .send()
        .await
        .unwrap();

    // assert
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains(&format!("¡Hola, {}!", app.test_user.username)));
    assert!(html_page.contains(r#"<html lang="es">"#));
}
