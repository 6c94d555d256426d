//! Herbarium Server
//!
//! HTTP facade over the inference service: an upload page, a multipart
//! prediction route, and the static plant-information lookup.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;
pub mod static_files;

pub use cli::Cli;
pub use config::ServerConfig;
pub use routes::create_router;
pub use state::AppState;
