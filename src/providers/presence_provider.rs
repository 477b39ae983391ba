// src/providers/presence_provider.rs
//
// Rich presence ("discord"). Mirrors the active track into the presence
// client while enabled and connected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::bind;
use super::provider::{LifecyclePhase, Provider, ProviderContext};
use super::registry::ProviderResolver;
use super::settings_provider::SettingsProvider;
use super::track_provider::TrackProvider;
use crate::error::AppResult;
use crate::events::names;
use crate::events::{first_arg_is, Subscription};
use crate::integrations::{PresenceActivity, PresenceClient};

pub struct PresenceProvider {
    resolver: ProviderResolver,
    client: Arc<dyn PresenceClient>,
    enabled: AtomicBool,
    connected: AtomicBool,
}

impl PresenceProvider {
    pub const NAME: &'static str = "discord";

    pub fn new(context: &ProviderContext, client: Arc<dyn PresenceClient>) -> Self {
        Self {
            resolver: context.resolver.clone(),
            client,
            enabled: AtomicBool::new(false),
            connected: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Mark enabled and connect.
    pub async fn enable(&self) -> AppResult<()> {
        self.enabled.store(true, Ordering::SeqCst);
        if self.is_connected() {
            return Ok(());
        }
        self.client.connect().await?;
        self.connected.store(true, Ordering::SeqCst);
        log::info!("[PRESENCE] connected");
        Ok(())
    }

    pub async fn disable(&self) -> AppResult<()> {
        self.enabled.store(false, Ordering::SeqCst);
        if self.connected.swap(false, Ordering::SeqCst) {
            self.client.clear_activity().await?;
            self.client.disconnect().await?;
            log::info!("[PRESENCE] disconnected");
        }
        Ok(())
    }

    /// Push the active track with the given playback position.
    pub async fn update_play_state(&self, playing: bool, progress_seconds: f64) -> AppResult<()> {
        if !self.is_connected() {
            return Ok(());
        }

        let track = self.resolver.get::<TrackProvider>(TrackProvider::NAME)?;
        let Some(data) = track.track_data() else {
            return self.client.clear_activity().await;
        };

        let show_buttons = self
            .resolver
            .get::<SettingsProvider>(SettingsProvider::NAME)
            .map(|settings| settings.get_bool("discord.buttons"))
            .unwrap_or(false);

        let activity = PresenceActivity {
            details: data.title().unwrap_or_default().to_string(),
            state: data.author().unwrap_or_default().to_string(),
            playing,
            progress_seconds,
            duration_seconds: track.track_duration(),
            large_image: data
                .album_thumbnail()
                .or_else(|| data.first_thumbnail_url())
                .map(str::to_string),
            track_id: data.id().map(str::to_string),
            show_buttons,
        };
        self.client.set_activity(activity).await
    }
}

#[async_trait]
impl Provider for PresenceProvider {
    fn hooks(&self) -> &'static [LifecyclePhase] {
        &[LifecyclePhase::AfterInit, LifecyclePhase::OnDestroy]
    }

    async fn after_init(&self) -> AppResult<()> {
        let settings = self
            .resolver
            .get::<SettingsProvider>(SettingsProvider::NAME)?;
        if settings.get_bool("discord.enabled") {
            self.enable().await?;
        }
        Ok(())
    }

    async fn on_destroy(&self) -> AppResult<()> {
        self.disable().await
    }

    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        vec![Subscription::new(
            names::SETTINGS_CHANGE,
            bind(&self, |presence, args| async move {
                if args.get(1).and_then(Value::as_bool).unwrap_or(false) {
                    presence.enable().await
                } else {
                    presence.disable().await
                }
            }),
        )
        .filter(first_arg_is("discord.enabled"))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CommandRouter, EventBus};
    use crate::integrations::presence::MockPresenceClient;
    use crate::providers::ProviderRegistry;
    use serde_json::json;

    fn register(client: MockPresenceClient) -> (Arc<ProviderRegistry>, Arc<PresenceProvider>) {
        let registry = ProviderRegistry::new(EventBus::new(), CommandRouter::new());
        let client: Arc<dyn PresenceClient> = Arc::new(client);
        let presence = registry
            .register(PresenceProvider::NAME, |ctx| {
                Ok(PresenceProvider::new(&ctx, Arc::clone(&client)))
            })
            .unwrap();
        (registry, presence)
    }

    #[tokio::test]
    async fn test_enable_connects_once() {
        let mut client = MockPresenceClient::new();
        client.expect_connect().times(1).returning(|| Ok(()));
        let (_registry, presence) = register(client);

        presence.enable().await.unwrap();
        presence.enable().await.unwrap();
        assert!(presence.is_enabled());
        assert!(presence.is_connected());
    }

    #[tokio::test]
    async fn test_failed_connect_stays_enabled_but_disconnected() {
        let mut client = MockPresenceClient::new();
        client
            .expect_connect()
            .returning(|| Err(crate::error::AppError::Integration("no ipc".into())));
        let (_registry, presence) = register(client);

        assert!(presence.enable().await.is_err());
        assert!(presence.is_enabled());
        assert!(!presence.is_connected());
    }

    #[tokio::test]
    async fn test_settings_change_disables() {
        let mut client = MockPresenceClient::new();
        client.expect_connect().returning(|| Ok(()));
        client.expect_clear_activity().times(1).returning(|| Ok(()));
        client.expect_disconnect().times(1).returning(|| Ok(()));
        let (registry, presence) = register(client);
        presence.enable().await.unwrap();

        registry
            .bus()
            .publish(names::SETTINGS_CHANGE, vec![json!("discord.enabled"), json!(false)])
            .settled()
            .await;

        assert!(!presence.is_enabled());
        assert!(!presence.is_connected());
    }

    #[tokio::test]
    async fn test_update_without_connection_is_noop() {
        let (_registry, presence) = register(MockPresenceClient::new());
        presence.update_play_state(true, 12.0).await.unwrap();
    }
}
