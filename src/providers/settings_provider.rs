// src/providers/settings_provider.rs
//
// Settings Provider
//
// Owns the settings document. Every write is applied in memory, broadcast as
// `settingsProvider.change`, and persisted later through the debounced
// `settingsProvider.save` subscription.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};

use super::bind;
use super::provider::{LifecyclePhase, Provider, ProviderContext};
use crate::domain::{default_settings, get_path, merge_over_defaults, set_path};
use crate::error::{AppError, AppResult};
use crate::events::names;
use crate::events::{EventBus, Route, Subscription, ViewId};

pub const SETTINGS_FILE: &str = "app-settings.json";

/// Host serving the player page.
pub const PLAYER_HOST: &str = "music.youtube.com";

const SAVE_DEBOUNCE_MS: u64 = 10_000;
const NAVIGATE_DEBOUNCE_MS: u64 = 500;

pub struct SettingsProvider {
    bus: EventBus,
    path: PathBuf,
    defaults: Value,
    store: RwLock<Value>,
}

impl SettingsProvider {
    pub const NAME: &'static str = "settings";

    pub fn new(context: &ProviderContext, config_dir: &Path, is_development: bool) -> Self {
        let defaults = default_settings(is_development);
        Self {
            bus: context.bus.clone(),
            path: config_dir.join(SETTINGS_FILE),
            store: RwLock::new(defaults.clone()),
            defaults,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted document and merge it over the defaults.
    /// A missing or corrupt file leaves the defaults in place.
    pub async fn load(&self) -> AppResult<()> {
        let persisted = match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(document) => Some(document),
                Err(e) => {
                    log::warn!(
                        "[SETTINGS] {} is corrupt, using defaults: {}",
                        self.path.display(),
                        e
                    );
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let document = match persisted {
            Some(persisted) => merge_over_defaults(self.defaults.clone(), persisted),
            None => self.defaults.clone(),
        };
        *self.store.write().unwrap_or_else(PoisonError::into_inner) = document;
        log::debug!("[SETTINGS] loaded {}", self.path.display());
        Ok(())
    }

    /// Write the current document to disk.
    pub async fn save(&self) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(&self.all())?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, bytes).await?;
        log::debug!("[SETTINGS] saved {}", self.path.display());
        Ok(())
    }

    pub fn all(&self) -> Value {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Value at `key`, falling back to the hard-coded default.
    pub fn get(&self, key: &str) -> Option<Value> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        get_path(&store, key)
            .or_else(|| get_path(&self.defaults, key))
            .cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn set(&self, key: &str, value: Value) -> AppResult<()> {
        {
            let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
            set_path(&mut store, key, value.clone())?;
        }
        log::debug!("[SETTINGS] {} = {}", key, value);
        self.bus.publish(names::SETTINGS_CHANGE, vec![json!(key), value]);
        self.bus.publish(names::SETTINGS_SAVE, Vec::new());
        Ok(())
    }

    /// `set`, then announce the update to `settingsProvider.update` listeners.
    pub fn update(&self, key: &str, value: Value) -> AppResult<Value> {
        self.set(key, value.clone())?;
        self.bus
            .publish(names::SETTINGS_UPDATE, vec![json!(key), value.clone()]);
        Ok(value)
    }

    fn on_navigate_in_page(&self, location: &str) {
        let Ok(url) = Url::parse(location) else {
            log::debug!("[SETTINGS] ignoring in-page navigation to {}", location);
            return;
        };
        if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "v") {
            self.bus
                .publish(names::TRACK_SET_ACTIVE, vec![json!(id.into_owned())]);
        }
    }

    fn on_navigate(&self, location: &str) -> AppResult<()> {
        let url = Url::parse(location)
            .map_err(|e| AppError::InvalidArgument(format!("{}: {}", location, e)))?;
        self.set("state.currentUrl", json!(location))?;
        if url.host_str() != Some(PLAYER_HOST) {
            self.bus
                .send_to_view(ViewId::Toolbar, names::TRACK_TITLE, &[Value::Null]);
        }
        Ok(())
    }
}

fn key_arg(args: &[Value]) -> AppResult<String> {
    args.first()
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidArgument("settings key must be a string".to_string()))
}

fn non_null(value: Option<Value>, fallback: Option<&Value>) -> Value {
    match value {
        Some(v) if !v.is_null() => v,
        _ => fallback.cloned().unwrap_or(Value::Null),
    }
}

#[async_trait]
impl Provider for SettingsProvider {
    fn hooks(&self) -> &'static [LifecyclePhase] {
        &[LifecyclePhase::BeforeStart, LifecyclePhase::OnDestroy]
    }

    async fn before_start(&self) -> AppResult<()> {
        self.load().await?;
        self.save().await
    }

    async fn on_destroy(&self) -> AppResult<()> {
        self.save().await
    }

    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        vec![
            Subscription::new(
                names::SETTINGS_SAVE,
                bind(&self, |settings, _| async move { settings.save().await }),
            )
            .debounce_ms(SAVE_DEBOUNCE_MS),
            Subscription::new(
                names::SETTINGS_SET,
                bind(&self, |settings, args| async move {
                    let key = key_arg(&args)?;
                    let value = args.get(1).cloned().unwrap_or(Value::Null);
                    settings.set(&key, value)
                }),
            ),
            Subscription::new(
                names::VIEW_DID_NAVIGATE_IN_PAGE,
                bind(&self, |settings, args| async move {
                    if let Some(location) = args.first().and_then(Value::as_str) {
                        settings.on_navigate_in_page(location);
                    }
                    Ok(())
                }),
            ),
            Subscription::new(
                names::VIEW_DID_NAVIGATE,
                bind(&self, |settings, args| async move {
                    match args.first().and_then(Value::as_str) {
                        Some(location) => settings.on_navigate(location),
                        None => Ok(()),
                    }
                }),
            )
            .debounce_ms(NAVIGATE_DEBOUNCE_MS),
        ]
    }

    fn routes(self: Arc<Self>) -> Vec<Route> {
        vec![
            Route::new(
                names::SETTINGS_GET,
                bind(&self, |settings, args| async move {
                    let key = key_arg(&args)?;
                    Ok(non_null(settings.get(&key), args.get(1)))
                }),
            ),
            Route::new(
                names::SETTINGS_GET_ALL,
                bind(&self, |settings, args| async move {
                    Ok(non_null(Some(settings.all()), args.first()))
                }),
            ),
            Route::new(
                names::SETTINGS_UPDATE,
                bind(&self, |settings, args| async move {
                    let key = key_arg(&args)?;
                    let value = args.get(1).cloned().unwrap_or(Value::Null);
                    settings.update(&key, value)
                }),
            ),
        ]
    }
}
