use anyhow::Context;
use secrecy::{ExposeSecret, Secret};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::domain::NewUser;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

#[tracing::instrument(name = "Find user by username", skip(pool))]
pub async fn find_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, username, email
        FROM users
        WHERE username = ?
        LIMIT 1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

#[tracing::instrument(name = "Find user by email", skip(pool))]
pub async fn find_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, username, email
        FROM users
        WHERE email = ?
        LIMIT 1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

#[tracing::instrument(name = "Get username", skip(pool))]
pub async fn get_username(user_id: i64, pool: &SqlitePool) -> Result<String, anyhow::Error> {
    let username: String = sqlx::query_scalar(
        r#"
        SELECT username
        FROM users
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("Failed to perform a query to retrieve a username.")?;
    Ok(username)
}

#[tracing::instrument(
    name = "Saving new user details in the database",
    skip(new_user, password_hash, transaction),
    fields(username = %new_user.username)
)]
pub async fn insert_user(
    transaction: &mut Transaction<'_, Sqlite>,
    new_user: &NewUser,
    password_hash: Secret<String>,
) -> Result<i64, sqlx::Error> {
    let user_id = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(new_user.username.as_ref())
    .bind(new_user.email.as_ref())
    .bind(password_hash.expose_secret())
    .execute(&mut *transaction)
    .await?
    .last_insert_rowid();
    Ok(user_id)
}

#[tracing::instrument(name = "Update a user's password hash", skip(password_hash, transaction))]
pub async fn update_password_hash(
    transaction: &mut Transaction<'_, Sqlite>,
    user_id: i64,
    password_hash: Secret<String>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET password_hash = ?
        WHERE user_id = ?
        "#,
    )
    .bind(password_hash.expose_secret())
    .bind(user_id)
    .execute(&mut *transaction)
    .await?;
    Ok(())
}
