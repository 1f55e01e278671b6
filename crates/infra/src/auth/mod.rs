//! Login against the WebAPI auth service

pub mod login;

pub use login::{login_body, session_cookie, WebApiAuthenticator};
