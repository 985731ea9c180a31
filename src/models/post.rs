use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::domain::PostBody;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TimelinePost {
    pub post_id: i64,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub username: String,
}

/// One page of results. `page` is 1-based.
#[derive(Debug)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub has_next: bool,
}

impl<T> Paginated<T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Fetching one row beyond the page size tells us whether a next page exists.
    fn from_overfetched(mut items: Vec<T>, page: u32, per_page: u32) -> Self {
        let has_next = items.len() > per_page as usize;
        items.truncate(per_page as usize);
        Self {
            items,
            page,
            has_next,
        }
    }
}

#[tracing::instrument(name = "Saving a new post", skip(body, transaction))]
pub async fn insert_post(
    transaction: &mut Transaction<'_, Sqlite>,
    user_id: i64,
    body: &PostBody,
) -> Result<i64, sqlx::Error> {
    let post_id = sqlx::query(
        r#"
        INSERT INTO posts (body, timestamp, user_id)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(body.as_ref())
    .bind(Utc::now())
    .bind(user_id)
    .execute(&mut *transaction)
    .await?
    .last_insert_rowid();
    Ok(post_id)
}

#[tracing::instrument(name = "Get the most recent posts", skip(pool))]
pub async fn recent_posts(
    pool: &SqlitePool,
    page: u32,
    per_page: u32,
) -> Result<Paginated<TimelinePost>, sqlx::Error> {
    let page = page.max(1);
    let posts = sqlx::query_as::<_, TimelinePost>(
        r#"
        SELECT posts.post_id, posts.body, posts.timestamp, users.username
        FROM posts
        JOIN users ON users.user_id = posts.user_id
        ORDER BY posts.timestamp DESC, posts.post_id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(i64::from(per_page) + 1)
    .bind(i64::from(page - 1) * i64::from(per_page))
    .fetch_all(pool)
    .await?;
    Ok(Paginated::from_overfetched(posts, page, per_page))
}

#[tracing::instrument(name = "Get a user's posts", skip(pool))]
pub async fn posts_by_user(
    pool: &SqlitePool,
    user_id: i64,
    page: u32,
    per_page: u32,
) -> Result<Paginated<TimelinePost>, sqlx::Error> {
    let page = page.max(1);
    let posts = sqlx::query_as::<_, TimelinePost>(
        r#"
        SELECT posts.post_id, posts.body, posts.timestamp, users.username
        FROM posts
        JOIN users ON users.user_id = posts.user_id
        WHERE posts.user_id = ?
        ORDER BY posts.timestamp DESC, posts.post_id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(i64::from(per_page) + 1)
    .bind(i64::from(page - 1) * i64::from(per_page))
    .fetch_all(pool)
    .await?;
    Ok(Paginated::from_overfetched(posts, page, per_page))
}
