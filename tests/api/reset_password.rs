use crate::helpers::{assert_is_redirect_to, spawn_app, TestApp};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Requests a reset for the test user and returns the path of the link that was mailed.
async fn request_reset_link(app: &TestApp) -> String {
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_reset_password_request(&app.test_user.email).await;
    assert_is_redirect_to(&response, "/auth/login");

    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    app.get_reset_link(email_request).path().to_string()
}

fn new_passwords(password: &str, password2: &str) -> serde_json::Value {
    serde_json::json!({
        "password": password,
        "password2": password2,
    })
}

#[tokio::test]
async fn a_reset_request_for_a_known_email_sends_a_link() {
    // arrange
    let app = spawn_app().await;

    // act
    let link = request_reset_link(&app).await;

    // assert
    assert!(link.starts_with("/auth/reset_password/"));
    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let body: serde_json::Value = serde_json::from_slice(&email_request.body).unwrap();
    assert_eq!(body["To"], app.test_user.email.as_str());
    assert_eq!(body["Subject"], "[Microblog] Reset Your Password");
    assert!(app
        .get_login_html()
        .await
        .contains("Check your email for the instructions to reset your password"));
}

#[tokio::test]
async fn a_reset_request_for_an_unknown_email_sends_nothing() {
    // arrange
    let app = spawn_app().await;
    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    // act
    let response = app.post_reset_password_request("nobody@example.com").await;

    // assert
    assert_is_redirect_to(&response, "/auth/login");
    assert!(app
        .get_login_html()
        .await
        .contains("Check your email for the instructions to reset your password"));
}

#[tokio::test]
async fn an_invalid_email_is_reported_on_the_form() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.post_reset_password_request("not-an-email").await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("Invalid email address."));
}

#[tokio::test]
async fn the_reset_link_replaces_the_password() {
    // arrange
    let app = spawn_app().await;
    let link = request_reset_link(&app).await;
    let new_password = Uuid::new_v4().to_string();

    // act 1: open the link
    let response = app.get(&link).await;
    assert_eq!(response.status().as_u16(), 200);

    // act 2: submit the new password
    let response = app
        .post_form(&link, &new_passwords(&new_password, &new_password))
        .await;
    assert_is_redirect_to(&response, "/auth/login");
    assert!(app
        .get_login_html()
        .await
        .contains("Your password has been reset."));

    // act 3: the old password no longer works
    let response = app.login().await;
    assert_is_redirect_to(&response, "/auth/login");

    // act 4: the new one does
    let response = app
        .post_login(&serde_json::json!({
            "username": &app.test_user.username,
            "password": &new_password,
        }))
        .await;
    assert_is_redirect_to(&response, "/index");
}

#[tokio::test]
async fn a_reset_link_works_only_once() {
    // arrange
    let app = spawn_app().await;
    let link = request_reset_link(&app).await;
    let new_password = Uuid::new_v4().to_string();
    app.post_form(&link, &new_passwords(&new_password, &new_password))
        .await;

    // act
    let response = app.get(&link).await;

    // assert
    assert_is_redirect_to(&response, "/index");
}

#[tokio::test]
async fn mismatched_passwords_are_reported_on_the_form() {
    // arrange
    let app = spawn_app().await;
    let link = request_reset_link(&app).await;

    // act
    let response = app
        .post_form(&link, &new_passwords("one-password", "another-password"))
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("Field must be equal to password."));
    // the link is still usable
    assert_eq!(app.get(&link).await.status().as_u16(), 200);
}

#[tokio::test]
async fn unknown_tokens_are_sent_to_the_index() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.get("/auth/reset_password/not-a-real-token").await;

    // assert
    assert_is_redirect_to(&response, "/index");
}

#[tokio::test]
async fn expired_tokens_are_sent_to_the_index() {
    // arrange
    let app = spawn_app().await;
    sqlx::query("INSERT INTO password_reset_tokens (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind("expired-token")
        .bind(app.test_user.user_id)
        .bind(chrono::Utc::now() - chrono::Duration::seconds(1))
        .execute(&app.db_pool)
        .await
        .unwrap();

    // act
    let response = app.get("/auth/reset_password/expired-token").await;

    // assert
    assert_is_redirect_to(&response, "/index");
}
