use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Reset links stop working ten minutes after they were issued.
pub const RESET_TOKEN_LIFETIME_SECONDS: i64 = 600;

/// Generate a random 25-character password reset token
pub fn generate_reset_token() -> String {
    let mut rng = thread_rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(25)
        .collect()
}

#[tracing::instrument(name = "Store a password reset token", skip(token, transaction))]
pub async fn store_reset_token(
    transaction: &mut Transaction<'_, Sqlite>,
    user_id: i64,
    token: &str,
) -> Result<(), sqlx::Error> {
    let expires_at = Utc::now() + Duration::seconds(RESET_TOKEN_LIFETIME_SECONDS);
    sqlx::query(
        r#"
        INSERT INTO password_reset_tokens (token, user_id, expires_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(expires_at)
    .execute(&mut *transaction)
    .await?;
    Ok(())
}

/// Returns the owner of `token` if it exists and has not expired.
#[tracing::instrument(name = "Verify a password reset token", skip(token, pool))]
pub async fn find_user_by_reset_token(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT user_id
        FROM password_reset_tokens
        WHERE token = ? AND expires_at > ?
        "#,
    )
    .bind(token)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await
}

/// Removes every outstanding token of the user, so a reset link works once.
#[tracing::instrument(name = "Consume password reset tokens", skip(transaction))]
pub async fn consume_reset_token(
    transaction: &mut Transaction<'_, Sqlite>,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *transaction)
        .await?;
    Ok(())
}
