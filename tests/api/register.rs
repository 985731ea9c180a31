use crate::helpers::{assert_is_redirect_to, spawn_app};
use uuid::Uuid;

fn registration(username: &str, email: &str, password: &str, password2: &str) -> serde_json::Value {
    serde_json::json!({
        "username": username,
        "email": email,
        "password": password,
        "password2": password2,
    })
}

#[tokio::test]
async fn register_persists_the_new_user() {
    // arrange
    let app = spawn_app().await;
    let password = Uuid::new_v4().to_string();

    // act
    let response = app
        .post_register(&registration(
            "susan",
            "susan@example.com",
            &password,
            &password,
        ))
        .await;

    // assert
    assert_is_redirect_to(&response, "/auth/login");
    let (email, password_hash): (String, String) =
        sqlx::query_as("SELECT email, password_hash FROM users WHERE username = 'susan'")
            .fetch_one(&app.db_pool)
            .await
            .expect("Failed to fetch the new user.");
    assert_eq!(email, "susan@example.com");
    assert!(password_hash.starts_with("$argon2id$"));
    assert!(app
        .get_login_html()
        .await
        .contains("Congratulations, you are now a registered user!"));
}

#[tokio::test]
async fn a_registered_user_can_log_in() {
    // arrange
    let app = spawn_app().await;
    let password = Uuid::new_v4().to_string();
    app.post_register(&registration(
        "susan",
        "susan@example.com",
        &password,
        &password,
    ))
    .await;

    // act
    let response = app
        .post_login(&serde_json::json!({
            "username": "susan",
            "password": &password,
        }))
        .await;

    // assert
    assert_is_redirect_to(&response, "/index");
}

#[tokio::test]
async fn a_taken_username_is_rejected() {
    // arrange
    let app = spawn_app().await;
    let username = app.test_user.username.clone();

    // act
    let response = app
        .post_register(&registration(&username, "new@example.com", "pw", "pw"))
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("Please use a different username."));
    assert!(!html_page.contains("Please use a different email address."));
    assert_eq!(app.user_count().await, 1);
}

#[tokio::test]
async fn a_taken_email_is_rejected() {
    // arrange
    let app = spawn_app().await;
    let email = app.test_user.email.clone();

    // act
    let response = app
        .post_register(&registration("newcomer", &email, "pw", "pw"))
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("Please use a different email address."));
    assert!(!html_page.contains("Please use a different username."));
    assert_eq!(app.user_count().await, 1);
}

#[tokio::test]
async fn register_returns_the_form_with_errors_when_data_is_invalid() {
    // arrange
    let app = spawn_app().await;
    let test_cases = vec![
        (
            registration("susan", "susan@example.com", "pw", "other"),
            "Field must be equal to password.",
            "mismatched passwords",
        ),
        (
            registration("susan", "not-an-email", "pw", "pw"),
            "Invalid email address.",
            "invalid email",
        ),
        (
            registration("", "susan@example.com", "pw", "pw"),
            "This field is required.",
            "missing username",
        ),
        (
            registration("susan", "susan@example.com", "", ""),
            "This field is required.",
            "missing passwords",
        ),
        (
            registration(&"a".repeat(65), "susan@example.com", "pw", "pw"),
            "Field cannot be longer than 64 characters.",
            "username too long",
        ),
    ];

    for (body, message, description) in test_cases {
        // act
        let response = app.post_register(&body).await;

        // assert
        assert_eq!(
            response.status().as_u16(),
            200,
            "The API did not re-render the form when the payload had {}.",
            description
        );
        let html_page = response.text().await.unwrap();
        assert!(
            html_page.contains(message),
            "The form did not report {} for {}.",
            message,
            description
        );
    }
    assert_eq!(app.user_count().await, 1);
}

#[tokio::test]
async fn submitted_values_are_kept_but_passwords_are_not() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app
        .post_register(&registration(
            "susan",
            "susan@example.com",
            "secret-one",
            "secret-two",
        ))
        .await;

    // assert
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains(r#"value="susan""#));
    assert!(html_page.contains(r#"value="susan@example.com""#));
    assert!(!html_page.contains("secret-one"));
}

#[tokio::test]
async fn logged_in_users_cannot_register() {
    // arrange
    let app = spawn_app().await;
    app.login().await;

    // act
    let response = app.get("/auth/register").await;

    // assert
    assert_is_redirect_to(&response, "/index");
}
