use crate::helpers::{assert_is_redirect_to, spawn_app};

#[tokio::test]
async fn an_error_flash_message_is_set_on_failure() {
    // arrange
    let app = spawn_app().await;

    // act 1: try to log in
    let login_body = serde_json::json!({
        "username": "random-username",
        "password": "random-password",
    });
    let response = app.post_login(&login_body).await;

    // assert
    assert_is_redirect_to(&response, "/auth/login");

    // act 2: follow the redirect
    let html_page = app.get_login_html().await;
    assert!(html_page.contains("Invalid username or password"));

    // act 3: reload the login page
    let html_page = app.get_login_html().await;
    assert!(!html_page.contains("Invalid username or password"));
}

#[tokio::test]
async fn a_wrong_password_is_rejected_like_an_unknown_user() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app
        .post_login(&serde_json::json!({
            "username": &app.test_user.username,
            "password": "not-the-password",
        }))
        .await;

    // assert
    assert_is_redirect_to(&response, "/auth/login");
    assert!(app
        .get_login_html()
        .await
        .contains("Invalid username or password"));
}

#[tokio::test]
async fn missing_fields_are_reported_on_the_form() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.post_login(&serde_json::json!({})).await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let html_page = response.text().await.unwrap();
    assert_eq!(html_page.matches("This field is required.").count(), 2);
}

#[tokio::test]
async fn redirect_to_index_after_login_success() {
    // arrange
    let app = spawn_app().await;

    // act 1: login
    let response = app.login().await;
    assert_is_redirect_to(&response, "/index");

    // act 2: follow the redirect
    let html_page = app.get_index_html().await;
    assert!(html_page.contains(&format!("Hi, {}!", app.test_user.username)));
}

#[tokio::test]
async fn login_returns_to_the_requested_page() {
    // arrange
    let app = spawn_app().await;
    let target = format!("/user/{}", app.test_user.username);

    // act
    let response = app
        .post_form(
            &format!("/auth/login?next={}", target),
            &serde_json::json!({
                "username": &app.test_user.username,
                "password": &app.test_user.password,
            }),
        )
        .await;

    // assert
    assert_is_redirect_to(&response, &target);
}

#[tokio::test]
async fn login_ignores_next_targets_on_other_sites() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app
        .post_form(
            "/auth/login?next=https%3A%2F%2Fevil.example.com%2F",
            &serde_json::json!({
                "username": &app.test_user.username,
                "password": &app.test_user.password,
            }),
        )
        .await;

    // assert
    assert_is_redirect_to(&response, "/index");
}

#[tokio::test]
async fn anonymous_users_are_sent_to_the_login_page() {
    // arrange
    let app = spawn_app().await;

    // act 1: ask for a protected page
    let response = app.get("/index").await;
    assert_is_redirect_to(&response, "/auth/login?next=%2Findex");

    // act 2: follow the redirect
    let html_page = app.get_html("/auth/login?next=%2Findex").await;
    assert!(html_page.contains("Please log in to access this page."));
    assert!(html_page.contains(r#"action="/auth/login?next=%2Findex""#));
}

#[tokio::test]
async fn logged_in_users_skip_the_login_form() {
    // arrange
    let app = spawn_app().await;
    app.login().await;

    // act
    let response = app.get("/auth/login").await;

    // assert
    assert_is_redirect_to(&response, "/index");
}

#[tokio::test]
async fn logout_clears_session_state() {
    // arrange
    let app = spawn_app().await;

    // act 1: login
    let response = app.login().await;
    assert_is_redirect_to(&response, "/index");

    // act 2: logout
    let response = app.get_logout().await;
    assert_is_redirect_to(&response, "/index");

    // act 3: the index is no longer reachable
    let response = app.get("/index").await;
    assert_is_redirect_to(&response, "/auth/login?next=%2Findex");
}

#[tokio::test]
async fn remember_me_still_issues_a_browser_session_cookie() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app
        .post_login(&serde_json::json!({
            "username": &app.test_user.username,
            "password": &app.test_user.password,
            "remember_me": "y",
        }))
        .await;

    // assert
    assert_is_redirect_to(&response, "/index");
    let session_cookie = response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|cookie| cookie.starts_with("id="))
        .expect("The login did not set a session cookie")
        .to_lowercase();
    assert!(!session_cookie.contains("max-age"));
    assert!(!session_cookie.contains("expires"));
    let html_page = app.get_index_html().await;
    assert!(html_page.contains(&format!("Hi, {}!", app.test_user.username)));
}
