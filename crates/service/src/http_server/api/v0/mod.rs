use axum::Router;

pub mod client;
mod envelope;
pub mod file;
pub mod resource;
pub mod upload;

pub use envelope::Envelope;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router {
    Router::new()
        .nest("/file", file::router(state.clone()))
        .nest("/upload", upload::router(state.clone()))
        .nest("/client", client::router(state.clone()))
        .nest("/resource", resource::router(state))
}
