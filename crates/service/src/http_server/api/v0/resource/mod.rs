use axum::routing::post;
use axum::Router;

pub mod info;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router {
    Router::new()
        .route("/info", post(info::handler))
        .with_state(state)
}
