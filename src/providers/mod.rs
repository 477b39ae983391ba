// src/providers/mod.rs
//
// Providers Module - process-scoped singletons and their registry

pub mod api_provider;
pub mod media_control_provider;
pub mod presence_provider;
pub mod provider;
pub mod registry;
pub mod settings_provider;
pub mod startup_provider;
pub mod track_provider;
pub mod update_provider;


use std::future::Future;
use std::sync::Arc;

use crate::events::EventArgs;

pub use api_provider::ApiProvider;
pub use media_control_provider::MediaControlProvider;
pub use presence_provider::PresenceProvider;
pub use provider::{LifecyclePhase, Provider, ProviderContext};
pub use registry::{HookFailure, PhaseReport, ProviderRegistry, ProviderResolver};
pub use settings_provider::SettingsProvider;
pub use startup_provider::StartupProvider;
pub use track_provider::TrackProvider;
pub use update_provider::{UpdateOptions, UpdateProvider};

/// Adapt `handler(provider, args)` into a subscription or route handler.
pub(crate) fn bind<P, F, Fut>(
    provider: &Arc<P>,
    handler: F,
) -> impl Fn(EventArgs) -> Fut + Send + Sync + 'static
where
    P: Send + Sync + 'static,
    F: Fn(Arc<P>, EventArgs) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
{
    let provider = Arc::clone(provider);
    move |args| handler(Arc::clone(&provider), args)
}
