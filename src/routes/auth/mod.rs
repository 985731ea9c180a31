mod login;
mod logout;
mod register;
mod reset_password;

use actix_web::{web, Scope};

pub use login::{login, login_form};
pub use logout::log_out;
pub use register::{register, register_form};
pub use reset_password::{
    request_password_reset, reset_password, reset_password_form, reset_password_request_form,
};

pub fn blueprint() -> Scope {
    web::scope("/auth")
        .route("/login", web::get().to(login_form))
        .route("/login", web::post().to(login))
        .route("/logout", web::get().to(log_out))
        .route("/register", web::get().to(register_form))
        .route("/register", web::post().to(register))
        .route(
            "/reset_password_request",
            web::get().to(reset_password_request_form),
        )
        .route(
            "/reset_password_request",
            web::post().to(request_password_reset),
        )
        .route("/reset_password/{token}", web::get().to(reset_password_form))
        .route("/reset_password/{token}", web::post().to(reset_password))
}
