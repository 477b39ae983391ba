// src/providers/update_provider.rs
//
// Update Provider
//
// RULES:
// - Development builds never configure a feed or check
// - One check on AfterInit when `app.autoupdate` is set
// - Periodic checks run in a background task while `app.autoupdate` is set
// - Availability is published on the bus; installing is the transport's job

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::bind;
use super::provider::{LifecyclePhase, Provider, ProviderContext};
use super::registry::ProviderResolver;
use super::settings_provider::SettingsProvider;
use crate::error::AppResult;
use crate::events::names;
use crate::events::{first_arg_is, EventBus, Subscription};
use crate::integrations::update_feed::{DEFAULT_UPDATE_REPOSITORY, DEFAULT_UPDATE_SERVER};
use crate::integrations::{feed_url, UpdateCheck, UpdateTransport};

const UPDATE_EVENT_DEBOUNCE_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub is_development: bool,
    pub server: String,
    pub repository: String,
    pub version: String,
    pub platform: String,
    pub arch: String,
    pub check_interval: Duration,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            is_development: false,
            server: DEFAULT_UPDATE_SERVER.to_string(),
            repository: DEFAULT_UPDATE_REPOSITORY.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            check_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl UpdateOptions {
    pub fn feed_url(&self) -> String {
        feed_url(
            &self.server,
            &self.repository,
            &self.platform,
            &self.arch,
            &self.version,
        )
    }
}

#[derive(Debug, Default)]
struct UpdateStatus {
    available: AtomicBool,
    downloaded: AtomicBool,
}

pub struct UpdateProvider {
    bus: EventBus,
    resolver: ProviderResolver,
    transport: Arc<dyn UpdateTransport>,
    options: UpdateOptions,
    status: Arc<UpdateStatus>,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl UpdateProvider {
    pub const NAME: &'static str = "update";

    pub fn new(
        context: &ProviderContext,
        transport: Arc<dyn UpdateTransport>,
        options: UpdateOptions,
    ) -> Self {
        Self {
            bus: context.bus.clone(),
            resolver: context.resolver.clone(),
            transport,
            options,
            status: Arc::new(UpdateStatus::default()),
            task_handle: Mutex::new(None),
        }
    }

    pub fn update_available(&self) -> bool {
        self.status.available.load(Ordering::SeqCst)
    }

    pub fn update_downloaded(&self) -> bool {
        self.status.downloaded.load(Ordering::SeqCst)
    }

    pub fn is_auto_checking(&self) -> bool {
        self.task_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub async fn check_for_updates(&self) -> AppResult<UpdateCheck> {
        run_check(self.transport.as_ref(), &self.bus, &self.status).await
    }

    pub fn install_update(&self) -> AppResult<()> {
        log::info!("[UPDATE] quitting to install");
        self.transport.quit_and_install()
    }

    pub fn start_auto_check(&self) {
        let mut handle = self.task_handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let transport = Arc::clone(&self.transport);
        let bus = self.bus.clone();
        let status = Arc::clone(&self.status);
        let interval = self.options.check_interval;

        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = run_check(transport.as_ref(), &bus, &status).await {
                    log::warn!("[UPDATE] periodic check failed: {}", e);
                }
            }
        }));
        log::debug!("[UPDATE] periodic checks every {:?}", interval);
    }

    pub fn stop_auto_check(&self) {
        let mut handle = self.task_handle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = handle.take() {
            task.abort();
        }
    }

    fn auto_update_enabled(&self) -> AppResult<bool> {
        Ok(self
            .resolver
            .get::<SettingsProvider>(SettingsProvider::NAME)?
            .get_bool("app.autoupdate"))
    }

    async fn on_auto_update_toggled(&self) -> AppResult<()> {
        if self.options.is_development {
            return Ok(());
        }
        if self.auto_update_enabled()? {
            self.start_auto_check();
        } else {
            self.stop_auto_check();
        }
        Ok(())
    }
}

async fn run_check(
    transport: &dyn UpdateTransport,
    bus: &EventBus,
    status: &UpdateStatus,
) -> AppResult<UpdateCheck> {
    let check = transport.check_for_updates().await?;
    match &check {
        UpdateCheck::UpToDate => log::debug!("[UPDATE] up to date"),
        UpdateCheck::Available {
            name, downloaded, ..
        } => {
            log::debug!("[UPDATE] update available: {:?}", name);
            status.available.store(true, Ordering::SeqCst);
            bus.publish(names::APP_UPDATE_AVAILABLE, Vec::new());
            if *downloaded {
                status.downloaded.store(true, Ordering::SeqCst);
                bus.publish(names::APP_UPDATE_DOWNLOADED, Vec::new());
            }
        }
    }
    Ok(check)
}

#[async_trait]
impl Provider for UpdateProvider {
    fn hooks(&self) -> &'static [LifecyclePhase] {
        &[LifecyclePhase::AfterInit, LifecyclePhase::OnDestroy]
    }

    async fn after_init(&self) -> AppResult<()> {
        if self.options.is_development {
            log::debug!("[UPDATE] development build, updates disabled");
            return Ok(());
        }

        let feed = self.options.feed_url();
        log::debug!("[UPDATE] feed {}", feed);
        self.transport.set_feed_url(&feed);

        if self.auto_update_enabled()? {
            self.start_auto_check();
            self.check_for_updates().await?;
        }
        Ok(())
    }

    async fn on_destroy(&self) -> AppResult<()> {
        self.stop_auto_check();
        Ok(())
    }

    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        vec![
            Subscription::new(
                names::APP_CHECK_UPDATE,
                bind(&self, |update, _| async move {
                    update.check_for_updates().await.map(drop)
                }),
            )
            .debounce_ms(UPDATE_EVENT_DEBOUNCE_MS),
            Subscription::new(
                names::APP_INSTALL_UPDATE,
                bind(&self, |update, _| async move { update.install_update() }),
            )
            .debounce_ms(UPDATE_EVENT_DEBOUNCE_MS),
            Subscription::new(
                names::SETTINGS_UPDATE,
                bind(&self, |update, _| async move { update.on_auto_update_toggled().await }),
            )
            .filter(first_arg_is("app.autoupdate"))
            .debounce_ms(UPDATE_EVENT_DEBOUNCE_MS),
        ]
    }
}

impl Drop for UpdateProvider {
    fn drop(&mut self) {
        self.stop_auto_check();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CommandRouter;
    use crate::integrations::update_feed::MockUpdateTransport;
    use crate::providers::ProviderRegistry;
    use crate::test_support::{capture, wait_for};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn available() -> UpdateCheck {
        UpdateCheck::Available {
            name: Some("v2".into()),
            notes: None,
            url: None,
            downloaded: true,
        }
    }

    fn register(
        dir: &TempDir,
        transport: MockUpdateTransport,
        options: UpdateOptions,
    ) -> (Arc<ProviderRegistry>, Arc<SettingsProvider>, Arc<UpdateProvider>) {
        let registry = ProviderRegistry::new(EventBus::new(), CommandRouter::new());
        let settings = registry
            .register(SettingsProvider::NAME, |ctx| {
                Ok(SettingsProvider::new(&ctx, dir.path(), options.is_development))
            })
            .unwrap();
        let transport: Arc<dyn UpdateTransport> = Arc::new(transport);
        let update = registry
            .register(UpdateProvider::NAME, |ctx| {
                Ok(UpdateProvider::new(&ctx, transport, options))
            })
            .unwrap();
        (registry, settings, update)
    }

    #[test]
    fn test_feed_url_from_options() {
        let options = UpdateOptions {
            platform: "win32".into(),
            arch: "x64".into(),
            version: "1.2.3".into(),
            ..UpdateOptions::default()
        };
        assert_eq!(
            options.feed_url(),
            "https://update.electronjs.org/Venipa/ytmdesktop2/win32-x64/1.2.3"
        );
    }

    #[tokio::test]
    async fn test_development_build_never_checks() {
        let dir = TempDir::new().unwrap();
        let mut transport = MockUpdateTransport::new();
        transport.expect_set_feed_url().never();
        transport.expect_check_for_updates().never();
        let options = UpdateOptions {
            is_development: true,
            ..UpdateOptions::default()
        };
        let (_registry, _settings, update) = register(&dir, transport, options);

        update.after_init().await.unwrap();
        assert!(!update.is_auto_checking());
    }

    #[tokio::test]
    async fn test_after_init_checks_and_publishes() {
        let dir = TempDir::new().unwrap();
        let mut transport = MockUpdateTransport::new();
        transport.expect_set_feed_url().times(1).return_const(());
        transport
            .expect_check_for_updates()
            .times(1)
            .returning(|| Ok(available()));
        let (registry, _settings, update) = register(&dir, transport, UpdateOptions::default());
        let available_events = capture(registry.bus(), names::APP_UPDATE_AVAILABLE);
        let downloaded_events = capture(registry.bus(), names::APP_UPDATE_DOWNLOADED);

        update.after_init().await.unwrap();

        assert!(update.update_available());
        assert!(update.update_downloaded());
        assert!(update.is_auto_checking());
        assert!(wait_for(|| downloaded_events.lock().unwrap().len() == 1).await);
        assert_eq!(available_events.lock().unwrap().len(), 1);
        update.on_destroy().await.unwrap();
        assert!(!update.is_auto_checking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggling_autoupdate_controls_periodic_checks() {
        let dir = TempDir::new().unwrap();
        let checks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&checks);
        let mut transport = MockUpdateTransport::new();
        transport.expect_check_for_updates().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(UpdateCheck::UpToDate)
        });
        let options = UpdateOptions {
            check_interval: Duration::from_secs(60),
            ..UpdateOptions::default()
        };
        let (_registry, settings, update) = register(&dir, transport, options);

        settings.update("app.autoupdate", json!(false)).unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!update.is_auto_checking());

        settings.update("app.autoupdate", json!(true)).unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(update.is_auto_checking());

        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(checks.load(Ordering::SeqCst), 2);

        settings.update("app.autoupdate", json!(false)).unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!update.is_auto_checking());
    }
}
