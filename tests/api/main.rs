mod errors;
mod health_check;
mod index;
mod login;
mod register;
mod reset_password;
