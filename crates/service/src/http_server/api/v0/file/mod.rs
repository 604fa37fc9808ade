use axum::routing::post;
use axum::Router;

pub mod resolve;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router {
    Router::new()
        .route("/resolve", post(resolve::handler))
        .with_state(state)
}
