//! ModGate Server
//!
//! HTTP-facing moderation service. Wires the pipeline, store, and
//! notification channels together behind an axum router.

pub mod config;
pub mod image;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::create_router;
pub use state::AppState;
