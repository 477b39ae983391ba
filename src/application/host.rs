// src/application/host.rs
//
// Application Host
//
// ARCHITECTURE:
// - Owns the bus, the router and the provider registry
// - Registers every provider in a fixed order, then runs the lifecycle
// - Knows nothing about a particular shell: collaborators are injected

use std::sync::Arc;

use crate::error::AppResult;
use crate::events::{CommandRouter, EventBus, RendererBridge};
use crate::integrations::headless::{
    DetachedPage, HeadlessApiTransport, HeadlessMediaSession, HeadlessPlatform, LoggingBridge,
    NoAccent, OfflinePresence,
};
use crate::integrations::{
    AccentResolver, ApiTransport, MediaSession, PageProbe, PlatformShell, PresenceClient,
    UpdateTransport,
};
use crate::providers::{
    ApiProvider, LifecyclePhase, MediaControlProvider, PhaseReport, PresenceProvider,
    ProviderRegistry, SettingsProvider, StartupProvider, TrackProvider, UpdateProvider,
};

use super::config::HostConfig;

/// Everything the kernel drives but does not own.
pub struct Collaborators {
    pub page: Arc<dyn PageProbe>,
    pub bridge: Arc<dyn RendererBridge>,
    pub media_session: Arc<dyn MediaSession>,
    pub presence: Arc<dyn PresenceClient>,
    pub api_transport: Arc<dyn ApiTransport>,
    pub accent: Arc<dyn AccentResolver>,
    pub update_transport: Arc<dyn UpdateTransport>,
    pub platform: Arc<dyn PlatformShell>,
}

impl Collaborators {
    /// No shell attached. The update transport is still real.
    pub fn headless(update_transport: Arc<dyn UpdateTransport>) -> Self {
        Self {
            page: Arc::new(DetachedPage),
            bridge: Arc::new(LoggingBridge),
            media_session: Arc::new(HeadlessMediaSession::default()),
            presence: Arc::new(OfflinePresence),
            api_transport: Arc::new(HeadlessApiTransport::default()),
            accent: Arc::new(NoAccent),
            update_transport,
            platform: Arc::new(HeadlessPlatform),
        }
    }
}

pub struct AppHost {
    config: HostConfig,
    registry: Arc<ProviderRegistry>,
}

impl AppHost {
    pub fn build(config: HostConfig, collaborators: Collaborators) -> AppResult<Self> {
        let bus = EventBus::new();
        bus.attach_bridge(collaborators.bridge);
        let registry = ProviderRegistry::new(bus, CommandRouter::new());

        let Collaborators {
            page,
            media_session,
            presence,
            api_transport,
            accent,
            update_transport,
            platform,
            ..
        } = collaborators;

        registry.register(SettingsProvider::NAME, |ctx| {
            Ok(SettingsProvider::new(&ctx, &config.config_dir, config.is_development))
        })?;
        registry.register(PresenceProvider::NAME, |ctx| {
            Ok(PresenceProvider::new(&ctx, presence))
        })?;
        registry.register(ApiProvider::NAME, |ctx| {
            Ok(ApiProvider::new(&ctx, api_transport, accent))
        })?;
        registry.register(MediaControlProvider::NAME, |ctx| {
            Ok(MediaControlProvider::new(&ctx, media_session))
        })?;
        registry.register(TrackProvider::NAME, |ctx| Ok(TrackProvider::new(&ctx, page)))?;
        registry.register(UpdateProvider::NAME, |ctx| {
            Ok(UpdateProvider::new(&ctx, update_transport, config.update_options()))
        })?;
        registry.register(StartupProvider::NAME, |ctx| {
            Ok(StartupProvider::new(&ctx, platform, config.executable.clone()))
        })?;

        log::info!(
            "[HOST] {} {} wired with {} providers",
            config.app_name,
            config.app_version,
            registry.names().len()
        );

        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn bus(&self) -> &EventBus {
        self.registry.bus()
    }

    /// BeforeStart, then AfterInit. Hook failures are reported, not fatal.
    pub async fn start(&self) -> Vec<PhaseReport> {
        let mut reports = Vec::with_capacity(2);
        for phase in [LifecyclePhase::BeforeStart, LifecyclePhase::AfterInit] {
            let report = self.registry.run_phase(phase).await;
            if !report.is_clean() {
                log::warn!(
                    "[HOST] {} finished with {} failing hooks",
                    phase,
                    report.failures.len()
                );
            }
            reports.push(report);
        }
        reports
    }

    pub async fn shutdown(&self) -> PhaseReport {
        self.registry.run_phase(LifecyclePhase::OnDestroy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::update_feed::MockUpdateTransport;
    use crate::integrations::UpdateCheck;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> HostConfig {
        HostConfig {
            app_name: "ytmdesk".to_string(),
            app_version: "0.0.0-test".to_string(),
            config_dir: dir.path().to_path_buf(),
            is_development: true,
            update_server: "https://updates.invalid".to_string(),
            update_repository: "owner/repo".to_string(),
            executable: PathBuf::from("/usr/bin/ytmdesk"),
        }
    }

    fn quiet_updates() -> Arc<dyn UpdateTransport> {
        let mut transport = MockUpdateTransport::new();
        transport.expect_set_feed_url().return_const(());
        transport
            .expect_check_for_updates()
            .returning(|| Ok(UpdateCheck::UpToDate));
        Arc::new(transport)
    }

    #[tokio::test]
    async fn test_build_registers_every_provider_in_order() {
        let dir = TempDir::new().unwrap();
        let host = AppHost::build(config(&dir), Collaborators::headless(quiet_updates())).unwrap();

        assert_eq!(
            host.registry().names(),
            vec![
                SettingsProvider::NAME,
                PresenceProvider::NAME,
                ApiProvider::NAME,
                MediaControlProvider::NAME,
                TrackProvider::NAME,
                UpdateProvider::NAME,
                StartupProvider::NAME,
            ]
        );
    }

    #[tokio::test]
    async fn test_lifecycle_runs_and_persists_settings() {
        let dir = TempDir::new().unwrap();
        let host = AppHost::build(config(&dir), Collaborators::headless(quiet_updates())).unwrap();

        let reports = host.start().await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].phase, LifecyclePhase::BeforeStart);
        assert!(reports[0].is_clean());
        assert!(dir.path().join("app-settings.json").exists());

        // Offline presence cannot connect: the failure is reported, not fatal.
        assert_eq!(reports[1].phase, LifecyclePhase::AfterInit);
        assert!(reports[1]
            .failures
            .iter()
            .all(|f| f.provider == PresenceProvider::NAME));

        let api = host.registry().get::<ApiProvider>(ApiProvider::NAME).unwrap();
        assert!(api.is_running());

        let teardown = host.shutdown().await;
        assert_eq!(teardown.phase, LifecyclePhase::OnDestroy);
        assert!(!api.is_running());
    }
}
