mod dto;
pub mod handlers;
pub mod password;
pub mod repo;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route(
            "/profile/:id",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/profiles", get(handlers::list_profiles))
}
