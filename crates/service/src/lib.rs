// Service modules (gateway functionality)
pub mod auth;
pub mod cache;
pub mod config;
pub mod http_server;
pub mod locate;
pub mod process;
pub mod registry;
pub mod service_state;
pub mod upload;

// App state (configuration, paths)
pub mod state;

// Re-exports for consumers
pub use config::Config as ServiceConfig;
pub use process::{spawn_service, start_service, ShutdownHandle};
pub use service_state::State as ServiceState;
pub use state::{AppConfig, AppState, StateError};
