mod health_check;
mod index;
mod user;

use actix_web::web;
use actix_web_lab::middleware::from_fn;

use crate::authentication::reject_anonymous_users;

pub use health_check::health_check;
pub use index::{index, publish_post};
pub use user::user;

/// Registers the unprefixed routes. Pages that need a login are guarded one resource at a time so
/// unknown paths still fall through to the 404 page.
pub fn blueprint(cfg: &mut web::ServiceConfig) {
    cfg.route("/health_check", web::get().to(health_check))
        .service(
            web::resource(["/", "/index"])
                .wrap(from_fn(reject_anonymous_users))
                .route(web::get().to(index))
                .route(web::post().to(publish_post)),
        )
        .service(
            web::resource("/user/{username}")
                .wrap(from_fn(reject_anonymous_users))
                .route(web::get().to(user)),
        );
}

/// `?page=` on paginated pages; anything below 1 means the first page.
#[derive(serde::Deserialize)]
pub struct PageQuery {
    page: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}
