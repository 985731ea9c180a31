mod new_user;
mod post_body;
mod user_email;
mod username;

pub use new_user::NewUser;
pub use post_body::{PostBody, MAX_POST_LENGTH};
pub use user_email::UserEmail;
pub use username::{Username, MAX_USERNAME_LENGTH};
