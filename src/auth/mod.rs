use crate::state::AppState;
use axum::Router;

mod claims;
pub mod dto;
pub mod handlers;
pub mod jwt;
mod otp;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub(crate) mod validation;

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/users",
        Router::new()
            .merge(handlers::public_routes())
            .merge(handlers::me_routes()),
    )
}
