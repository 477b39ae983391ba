// src/providers/startup_provider.rs
//
// Startup/Tray Provider
//
// Keeps the OS login item in line with `app.autostart` and rebuilds the tray
// menu whenever settings change.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::bind;
use super::provider::{LifecyclePhase, Provider, ProviderContext};
use super::registry::ProviderResolver;
use super::settings_provider::SettingsProvider;
use super::track_provider::TrackProvider;
use crate::error::AppResult;
use crate::events::names;
use crate::events::{first_arg_is, EventBus, Subscription};
use crate::integrations::{LoginItemSettings, PlatformShell, TrayAction, TrayItem, TrayMenu};

const TRAY_REFRESH_DEBOUNCE_MS: u64 = 50;
const AUTOSTART_DEBOUNCE_MS: u64 = 1000;

pub const TRAY_TOOLTIP: &str = "YouTube Music for Desktop";

pub struct StartupProvider {
    bus: EventBus,
    resolver: ProviderResolver,
    platform: Arc<dyn PlatformShell>,
    executable: PathBuf,
}

impl StartupProvider {
    pub const NAME: &'static str = "startup";

    pub fn new(
        context: &ProviderContext,
        platform: Arc<dyn PlatformShell>,
        executable: PathBuf,
    ) -> Self {
        Self {
            bus: context.bus.clone(),
            resolver: context.resolver.clone(),
            platform,
            executable,
        }
    }

    fn start_args(&self) -> Vec<String> {
        let name = self
            .executable
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        vec!["--processStart".to_string(), format!("\"{}\"", name)]
    }

    pub fn login_item(&self, open_at_login: bool) -> LoginItemSettings {
        LoginItemSettings {
            open_at_login,
            path: open_at_login.then(|| self.executable.clone()),
            args: self.start_args(),
        }
    }

    pub fn apply_login_item(&self, open_at_login: bool) -> AppResult<()> {
        self.platform.set_login_item(&self.login_item(open_at_login))
    }

    pub fn build_menu(&self) -> AppResult<TrayMenu> {
        let settings = self
            .resolver
            .get::<SettingsProvider>(SettingsProvider::NAME)?;
        let track = self.resolver.get::<TrackProvider>(TrackProvider::NAME).ok();

        let now_playing = track
            .as_ref()
            .and_then(|t| t.track_data())
            .map(|data| {
                format!(
                    "{} - {}",
                    data.author().unwrap_or_default(),
                    data.title().unwrap_or_default()
                )
            })
            .unwrap_or_else(|| "Nothing playing".to_string());
        let playing = track.as_ref().is_some_and(|t| t.is_playing());

        let items = vec![
            TrayItem::action(&now_playing, TrayAction::ShowWindow).disabled(),
            TrayItem::separator(),
            TrayItem::action(if playing { "Pause" } else { "Play" }, TrayAction::TogglePlayback),
            TrayItem::action("Next", TrayAction::Next),
            TrayItem::action("Previous", TrayAction::Previous),
            TrayItem::separator(),
            TrayItem::toggle("Start at login", "app.autostart", settings.get_bool("app.autostart")),
            TrayItem::toggle("Auto update", "app.autoupdate", settings.get_bool("app.autoupdate")),
            TrayItem::toggle(
                "Discord presence",
                "discord.enabled",
                settings.get_bool("discord.enabled"),
            ),
            TrayItem::toggle("Enable API", "api.enabled", settings.get_bool("api.enabled")),
            TrayItem::separator(),
            TrayItem::action("Check for updates", TrayAction::CheckForUpdates),
            TrayItem::action("Show", TrayAction::ShowWindow),
            TrayItem::action("Quit", TrayAction::Quit),
        ];

        Ok(TrayMenu {
            tooltip: TRAY_TOOLTIP.to_string(),
            items,
        })
    }

    pub fn refresh_tray(&self) -> AppResult<()> {
        self.platform.set_tray_menu(&self.build_menu()?)
    }

    /// Tray click from the shell. Window actions stay with the shell.
    pub async fn handle_tray_action(&self, action: &TrayAction) -> AppResult<()> {
        match action {
            TrayAction::TogglePlayback => {
                let track = self.resolver.get::<TrackProvider>(TrackProvider::NAME)?;
                track.toggle_playback().await.map(drop)
            }
            TrayAction::Next => {
                self.resolver
                    .get::<TrackProvider>(TrackProvider::NAME)?
                    .next()
                    .await
            }
            TrayAction::Previous => {
                self.resolver
                    .get::<TrackProvider>(TrackProvider::NAME)?
                    .previous()
                    .await
            }
            TrayAction::ToggleSetting(key) => {
                let settings = self
                    .resolver
                    .get::<SettingsProvider>(SettingsProvider::NAME)?;
                settings.set(key, json!(!settings.get_bool(key)))
            }
            TrayAction::CheckForUpdates => {
                self.bus.publish(names::APP_CHECK_UPDATE, Vec::new());
                Ok(())
            }
            TrayAction::ShowWindow | TrayAction::Quit | TrayAction::Separator => Ok(()),
        }
    }
}

#[async_trait]
impl Provider for StartupProvider {
    fn hooks(&self) -> &'static [LifecyclePhase] {
        &[LifecyclePhase::AfterInit]
    }

    async fn after_init(&self) -> AppResult<()> {
        let autostart = self
            .resolver
            .get::<SettingsProvider>(SettingsProvider::NAME)?
            .get_bool("app.autostart");
        self.apply_login_item(autostart)?;
        self.refresh_tray()
    }

    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        vec![
            Subscription::new(
                names::SETTINGS_CHANGE,
                bind(&self, |startup, _| async move { startup.refresh_tray() }),
            )
            .debounce_ms(TRAY_REFRESH_DEBOUNCE_MS),
            Subscription::new(
                names::SETTINGS_CHANGE,
                bind(&self, |startup, args| async move {
                    let enabled = args.get(1).and_then(Value::as_bool).unwrap_or(false);
                    startup.apply_login_item(enabled)
                }),
            )
            .filter(first_arg_is("app.autostart"))
            .debounce_ms(AUTOSTART_DEBOUNCE_MS),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CommandRouter;
    use crate::integrations::platform::MockPlatformShell;
    use crate::providers::ProviderRegistry;
    use crate::test_support::wait_for;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    fn register(
        dir: &TempDir,
        platform: MockPlatformShell,
    ) -> (Arc<ProviderRegistry>, Arc<SettingsProvider>, Arc<StartupProvider>) {
        let registry = ProviderRegistry::new(EventBus::new(), CommandRouter::new());
        let settings = registry
            .register(SettingsProvider::NAME, |ctx| {
                Ok(SettingsProvider::new(&ctx, dir.path(), false))
            })
            .unwrap();
        let platform: Arc<dyn PlatformShell> = Arc::new(platform);
        let startup = registry
            .register(StartupProvider::NAME, |ctx| {
                Ok(StartupProvider::new(
                    &ctx,
                    platform,
                    PathBuf::from("/opt/ytmdesk/ytmdesk"),
                ))
            })
            .unwrap();
        (registry, settings, startup)
    }

    #[test]
    fn test_login_item_shape() {
        let dir = TempDir::new().unwrap();
        let (_registry, _settings, startup) = register(&dir, MockPlatformShell::new());

        let on = startup.login_item(true);
        assert!(on.open_at_login);
        assert_eq!(on.path, Some(PathBuf::from("/opt/ytmdesk/ytmdesk")));
        assert_eq!(on.args, vec!["--processStart", "\"ytmdesk\""]);

        let off = startup.login_item(false);
        assert!(!off.open_at_login);
        assert_eq!(off.path, None);
        assert_eq!(off.args, on.args);
    }

    #[test]
    fn test_menu_reflects_settings() {
        let dir = TempDir::new().unwrap();
        let (_registry, _settings, startup) = register(&dir, MockPlatformShell::new());

        let menu = startup.build_menu().unwrap();
        assert_eq!(menu.tooltip, TRAY_TOOLTIP);
        assert_eq!(menu.items[0].label, "Nothing playing");
        assert!(!menu.items[0].enabled);
        let autostart = menu
            .items
            .iter()
            .find(|i| i.action == TrayAction::ToggleSetting("app.autostart".into()))
            .unwrap();
        assert_eq!(autostart.checked, Some(true));
    }

    #[tokio::test]
    async fn test_after_init_applies_login_item_and_tray() {
        let dir = TempDir::new().unwrap();
        let mut platform = MockPlatformShell::new();
        platform
            .expect_set_login_item()
            .withf(|item| item.open_at_login)
            .times(1)
            .returning(|_| Ok(()));
        platform.expect_set_tray_menu().times(1).returning(|_| Ok(()));
        let (_registry, _settings, startup) = register(&dir, platform);

        startup.after_init().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_autostart_toggle_reapplies_login_item() {
        let dir = TempDir::new().unwrap();
        let applied: Arc<Mutex<Vec<LoginItemSettings>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&applied);
        let mut platform = MockPlatformShell::new();
        platform.expect_set_login_item().returning(move |item| {
            sink.lock().unwrap().push(item.clone());
            Ok(())
        });
        platform.expect_set_tray_menu().returning(|_| Ok(()));
        let (_registry, settings, startup) = register(&dir, platform);

        startup
            .handle_tray_action(&TrayAction::ToggleSetting("app.autostart".into()))
            .await
            .unwrap();
        assert!(!settings.get_bool("app.autostart"));

        tokio::time::sleep(Duration::from_millis(AUTOSTART_DEBOUNCE_MS / 2)).await;
        assert!(applied.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(AUTOSTART_DEBOUNCE_MS)).await;
        assert!(wait_for(|| !applied.lock().unwrap().is_empty()).await);
        let applied = applied.lock().unwrap();
        assert_eq!(applied.len(), 1);
        assert!(!applied[0].open_at_login);
        assert_eq!(applied[0].path, None);
    }
}
