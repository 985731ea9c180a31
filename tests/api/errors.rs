use actix_web::{test, web, App, HttpResponse};
use actix_web_lab::middleware::from_fn;
use microblog::configuration::DatabaseSettings;
use microblog::db_session::{commit_request_transaction, DbSession};
use microblog::routes::error_handlers;
use microblog::startup::get_connection_pool;
use sqlx::SqlitePool;

use crate::helpers::spawn_app;

#[tokio::test]
async fn an_unknown_route_renders_the_not_found_page() {
    // arrange
    let app = spawn_app().await;

    for path in ["/no/such/page", "/auth/no-such-page"] {
        // act
        let response = app.get(path).await;

        // assert
        assert_eq!(response.status().as_u16(), 404);
        let html_page = response.text().await.unwrap();
        assert!(html_page.contains("File Not Found"));
        assert!(html_page.contains(r#"href="/index""#));
    }
}

#[tokio::test]
async fn two_apps_do_not_share_state() {
    // arrange
    let first = spawn_app().await;
    let second = spawn_app().await;

    // act
    first.login().await;

    // assert
    assert_ne!(first.port, second.port);
    let found: Option<i64> = sqlx::query_scalar("SELECT user_id FROM users WHERE username = ?")
        .bind(&first.test_user.username)
        .fetch_optional(&second.db_pool)
        .await
        .unwrap();
    assert!(found.is_none());
    // the session cookie of the first app means nothing to the second
    let response = first
        .api_client
        .get(&format!("{}/index", second.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 303);
}

async fn migrated_pool(directory: &tempfile::TempDir) -> SqlitePool {
    let settings = DatabaseSettings {
        path: directory
            .path()
            .join("rollback.db")
            .to_string_lossy()
            .into_owned(),
        create_if_missing: true,
    };
    let pool = get_connection_pool(&settings).await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

async fn insert_ghost(db: &DbSession) -> Result<(), actix_web::Error> {
    let mut transaction = db
        .transaction()
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    sqlx::query(
        "INSERT INTO users (username, email, password_hash) VALUES ('ghost', 'ghost@example.com', 'x')",
    )
    .execute(&mut *transaction)
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(())
}

async fn write_then_fail(db: DbSession) -> Result<HttpResponse, actix_web::Error> {
    insert_ghost(&db).await?;
    Err(actix_web::error::ErrorInternalServerError(
        "failed after writing",
    ))
}

async fn write(db: DbSession) -> Result<HttpResponse, actix_web::Error> {
    insert_ghost(&db).await?;
    Ok(HttpResponse::Ok().finish())
}

async fn ghosts(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = 'ghost'")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[actix_web::test]
async fn a_failed_request_rolls_back_its_writes() {
    // arrange
    let directory = tempfile::tempdir().unwrap();
    let pool = migrated_pool(&directory).await;
    let app = test::init_service(
        App::new()
            .wrap(from_fn(commit_request_transaction))
            .wrap(error_handlers())
            .app_data(web::Data::new(pool.clone()))
            .route("/fail", web::post().to(write_then_fail))
            .route("/write", web::post().to(write)),
    )
    .await;

    // act 1: a request that writes and then fails
    let request = test::TestRequest::post().uri("/fail").to_request();
    let response = test::call_service(&app, request).await;

    // assert
    assert_eq!(response.status().as_u16(), 500);
    let body = test::read_body(response).await;
    assert!(String::from_utf8_lossy(&body).contains("An unexpected error has occurred"));
    assert_eq!(ghosts(&pool).await, 0);

    // act 2: the write lock was released and successful requests commit
    let request = test::TestRequest::post().uri("/write").to_request();
    let response = test::call_service(&app, request).await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(ghosts(&pool).await, 1);
}
