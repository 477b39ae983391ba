// src/lib.rs
// ytmdesk - main-process kernel of a desktop music companion
//
// Architecture:
// - Event-driven: providers coordinate through the bus and the router
// - Process-scoped providers, wired once by the application host
// - Explicit: every subscription and route is declared, nothing discovered
// - Shell-agnostic: page, views and OS surfaces sit behind traits

// ============================================================================
// CORE
// ============================================================================

pub mod domain;
pub mod error;
pub mod events;

// ============================================================================
// PROVIDERS AND INTEGRATIONS
// ============================================================================

pub mod integrations;
pub mod providers;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;

#[cfg(test)]
mod test_support;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use application::{AppHost, Collaborators, ErrorResponse, ErrorType, HostConfig};

pub use domain::{PlayState, RepeatMode, TrackData, TrackState};

pub use error::{AppError, AppResult};

pub use events::{
    create_event_bus, CommandRouter, EventBus, EventLogEntry, RendererBridge, Route,
    Subscription, ViewId,
};

pub use providers::{
    ApiProvider, LifecyclePhase, MediaControlProvider, PhaseReport, PresenceProvider, Provider,
    ProviderContext, ProviderRegistry, SettingsProvider, StartupProvider, TrackProvider,
    UpdateProvider,
};
