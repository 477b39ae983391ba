// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - Sits ABOVE the providers and wires them together
// - Resolves host configuration once at startup
// - Shapes errors for callers outside the process

pub mod config;
pub mod error_handling;
pub mod host;

pub use config::HostConfig;
pub use error_handling::{ErrorResponse, ErrorType};
pub use host::{AppHost, Collaborators};
