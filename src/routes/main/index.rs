use actix_web::{web, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use sqlx::SqlitePool;

use super::PageQuery;
use crate::authentication::UserId;
use crate::db_session::DbSession;
use crate::forms::{FormErrors, PostForm};
use crate::i18n::{Locale, Message};
use crate::models::{get_username, insert_post, recent_posts, Paginated, TimelinePost};
use crate::startup::PostsPerPage;
use crate::templates::{html_ok, pagination, post_list, submit, textarea, Layout};
use crate::utils::{e500, see_other};

fn index_page(
    locale: &Locale,
    username: &str,
    flash_messages: Option<&IncomingFlashMessages>,
    form: Option<&PostForm>,
    errors: &FormErrors,
    posts: &Paginated<TimelinePost>,
) -> String {
    let post = form.map(|form| form.post.as_str()).unwrap_or_default();
    let content = format!(
        r#"<h1>{greeting}</h1>
    <form action="/index" method="post" novalidate>
        {post}
        {submit}
    </form>
    {posts}
    {pagination}"#,
        greeting = crate::templates::escape(&locale.greeting(username)),
        post = textarea("post", locale.t(Message::SaySomething), post, errors, locale),
        submit = submit(locale.t(Message::Submit)),
        posts = post_list(&posts.items),
        pagination = pagination(posts, "/index", locale),
    );
    let mut layout = Layout::new(locale, locale.t(Message::Home)).current_user(username);
    if let Some(flash_messages) = flash_messages {
        layout = layout.flash_messages(flash_messages);
    }
    layout.render(&content)
}

#[tracing::instrument(name = "Show the timeline", skip_all, fields(user_id = %*user_id))]
pub async fn index(
    user_id: web::ReqData<UserId>,
    query: web::Query<PageQuery>,
    flash_messages: IncomingFlashMessages,
    pool: web::Data<SqlitePool>,
    posts_per_page: web::Data<PostsPerPage>,
    locale: Locale,
) -> Result<HttpResponse, actix_web::Error> {
    let user_id = user_id.into_inner();
    let username = get_username(*user_id, &pool).await.map_err(e500)?;
    let posts = recent_posts(&pool, query.page(), posts_per_page.0)
        .await
        .map_err(e500)?;
    Ok(html_ok(index_page(
        &locale,
        &username,
        Some(&flash_messages),
        None,
        &FormErrors::default(),
        &posts,
    )))
}

#[tracing::instrument(name = "Publish a post", skip_all, fields(user_id = %*user_id))]
pub async fn publish_post(
    user_id: web::ReqData<UserId>,
    form: web::Form<PostForm>,
    pool: web::Data<SqlitePool>,
    db: DbSession,
    posts_per_page: web::Data<PostsPerPage>,
    locale: Locale,
) -> Result<HttpResponse, actix_web::Error> {
    let user_id = user_id.into_inner();
    let body = match form.validate() {
        Ok(body) => body,
        Err(errors) => {
            let username = get_username(*user_id, &pool).await.map_err(e500)?;
            let posts = recent_posts(&pool, 1, posts_per_page.0)
                .await
                .map_err(e500)?;
            return Ok(html_ok(index_page(
                &locale,
                &username,
                None,
                Some(&form.0),
                &errors,
                &posts,
            )));
        }
    };

    let mut transaction = db.transaction().await.map_err(e500)?;
    insert_post(&mut transaction, *user_id, &body)
        .await
        .map_err(e500)?;

    FlashMessage::info(locale.t(Message::PostIsLive)).send();
    Ok(see_other("/index"))
}
