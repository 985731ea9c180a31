use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;

use super::PageQuery;
use crate::authentication::UserId;
use crate::i18n::{Locale, Message};
use crate::models::{find_user_by_username, get_username, posts_by_user};
use crate::startup::PostsPerPage;
use crate::templates::{escape, html_ok, pagination, post_list, Layout};
use crate::utils::e500;

/// A user's profile with their posts, newest first. Unknown users get the 404 page.
#[tracing::instrument(name = "Show a profile", skip(user_id, query, pool, posts_per_page, locale))]
pub async fn user(
    username: web::Path<String>,
    user_id: web::ReqData<UserId>,
    query: web::Query<PageQuery>,
    pool: web::Data<SqlitePool>,
    posts_per_page: web::Data<PostsPerPage>,
    locale: Locale,
) -> Result<HttpResponse, actix_web::Error> {
    let profile = match find_user_by_username(&pool, &username)
        .await
        .map_err(e500)?
    {
        Some(profile) => profile,
        None => return Ok(HttpResponse::NotFound().finish()),
    };
    let current_user = get_username(**user_id, &pool).await.map_err(e500)?;
    let posts = posts_by_user(&pool, profile.user_id, query.page(), posts_per_page.0)
        .await
        .map_err(e500)?;

    let path = format!("/user/{}", escape(&profile.username));
    let content = format!(
        r#"<h1>{label}: {username}</h1>
    <hr>
    {posts}
    {pagination}"#,
        label = locale.t(Message::User),
        username = escape(&profile.username),
        posts = post_list(&posts.items),
        pagination = pagination(&posts, &path, &locale),
    );
    Ok(html_ok(
        Layout::new(&locale, format!("{}: {}", locale.t(Message::User), profile.username))
            .current_user(&current_user)
            .render(&content),
    ))
}
