mod password_reset;
mod post;
mod user;

pub use password_reset::{
    consume_reset_token, find_user_by_reset_token, generate_reset_token, store_reset_token,
    RESET_TOKEN_LIFETIME_SECONDS,
};
pub use post::{insert_post, posts_by_user, recent_posts, Paginated, TimelinePost};
pub use user::{
    find_user_by_email, find_user_by_username, get_username, insert_user, update_password_hash,
    User,
};
