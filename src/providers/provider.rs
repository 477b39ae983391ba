// src/providers/provider.rs
//
// The Provider capability.
//
// A provider is a process-scoped singleton. It declares which lifecycle hooks
// it implements, and hands the registry explicit tables of bus subscriptions
// and command routes at registration time.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::registry::ProviderResolver;
use crate::error::AppResult;
use crate::events::{CommandRouter, EventBus, Route, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    BeforeStart,
    AfterInit,
    OnDestroy,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecyclePhase::BeforeStart => write!(f, "BeforeStart"),
            LifecyclePhase::AfterInit => write!(f, "AfterInit"),
            LifecyclePhase::OnDestroy => write!(f, "OnDestroy"),
        }
    }
}

/// Everything a provider factory may capture.
#[derive(Clone)]
pub struct ProviderContext {
    pub bus: EventBus,
    pub router: CommandRouter,
    pub resolver: ProviderResolver,
}

#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Hooks this provider implements. Only these are run by the registry.
    fn hooks(&self) -> &'static [LifecyclePhase] {
        &[]
    }

    async fn before_start(&self) -> AppResult<()> {
        Ok(())
    }

    async fn after_init(&self) -> AppResult<()> {
        Ok(())
    }

    async fn on_destroy(&self) -> AppResult<()> {
        Ok(())
    }

    /// Bus subscriptions, subscribed once at registration.
    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        Vec::new()
    }

    /// Request/response routes, registered once at registration.
    fn routes(self: Arc<Self>) -> Vec<Route> {
        Vec::new()
    }
}

/// Run the hook for `phase`.
pub(crate) async fn run_hook(provider: &dyn Provider, phase: LifecyclePhase) -> AppResult<()> {
    match phase {
        LifecyclePhase::BeforeStart => provider.before_start().await,
        LifecyclePhase::AfterInit => provider.after_init().await,
        LifecyclePhase::OnDestroy => provider.on_destroy().await,
    }
}
