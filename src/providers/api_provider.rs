// src/providers/api_provider.rs
//
// External API Provider
//
// Runs the HTTP/WebSocket transport while `api.enabled` is set and exposes
// every `api/*` route. Routes resolve the track provider on each call; the
// API provider holds no track state of its own.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use super::bind;
use super::provider::{LifecyclePhase, Provider, ProviderContext};
use super::registry::ProviderResolver;
use super::settings_provider::SettingsProvider;
use super::track_provider::TrackProvider;
use crate::application::error_handling::ErrorResponse;
use crate::domain::RepeatMode;
use crate::error::{AppError, AppResult};
use crate::events::names;
use crate::events::{first_arg_is, CommandRouter, EventArgs, Route, Subscription};
use crate::integrations::{AccentResolver, ApiTransport, SOCKET_CHANNEL};

const API_ENABLED_DEBOUNCE_MS: u64 = 1000;

pub struct ApiProvider {
    router: CommandRouter,
    resolver: ProviderResolver,
    transport: Arc<dyn ApiTransport>,
    accent: Arc<dyn AccentResolver>,
    /// Worker id while the transport is running.
    worker: RwLock<Option<u32>>,
}

impl ApiProvider {
    pub const NAME: &'static str = "api";

    pub fn new(
        context: &ProviderContext,
        transport: Arc<dyn ApiTransport>,
        accent: Arc<dyn AccentResolver>,
    ) -> Self {
        Self {
            router: context.router.clone(),
            resolver: context.resolver.clone(),
            transport,
            accent,
            worker: RwLock::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// (Re)start the transport if the API is enabled.
    pub async fn start(&self) -> AppResult<()> {
        self.stop().await?;

        let settings = self
            .resolver
            .get::<SettingsProvider>(SettingsProvider::NAME)?;
        if !settings.get_bool("api.enabled") {
            return Ok(());
        }

        let worker = self.transport.start(settings.all()).await?;
        *self.worker.write().unwrap_or_else(PoisonError::into_inner) = Some(worker);
        log::debug!("[API] running worker {}", worker);
        Ok(())
    }

    pub async fn stop(&self) -> AppResult<()> {
        let worker = self
            .worker
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            self.transport.stop().await?;
            log::debug!("[API] stopped worker {}", worker);
        }
        Ok(())
    }

    /// Push to connected socket clients. Dropped while the API is off.
    pub fn send_message(&self, event: &str, payload: Value) -> AppResult<()> {
        if !self.is_running() {
            return Ok(());
        }
        self.transport.send(SOCKET_CHANNEL, event, payload)
    }

    /// Entry point for the transport: run a route, shape failures for clients.
    pub async fn dispatch(&self, route: &str, args: EventArgs) -> Result<Value, ErrorResponse> {
        self.router.invoke(route, args).await.map_err(|e| {
            log::warn!("[API] {} failed: {}", route, e);
            ErrorResponse::from_app_error(e)
        })
    }

    /// Route names without their `api/` prefix.
    pub fn route_listing() -> AppResult<Vec<String>> {
        let prefix = Regex::new(r"^/?api/")?;
        Ok(names::API_ROUTES
            .iter()
            .map(|route| prefix.replace(route, "").into_owned())
            .collect())
    }

    async fn track_accent(&self, track: &TrackProvider) -> Value {
        let Some(url) = track
            .track_data()
            .and_then(|t| t.first_thumbnail_url().map(str::to_string))
        else {
            return Value::Null;
        };
        match self.accent.accent_hex(&url).await {
            Ok(Some(hex)) => json!(hex),
            Ok(None) => Value::Null,
            Err(e) => {
                log::error!("[API] accent lookup failed for {}: {}", url, e);
                Value::Null
            }
        }
    }

    /// Route backed by the track provider, resolved per call.
    fn track_route<F, Fut>(self: &Arc<Self>, name: &str, handler: F) -> Route
    where
        F: Fn(Arc<Self>, Arc<TrackProvider>, EventArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Value>> + Send + 'static,
    {
        Route::new(
            name,
            bind(self, move |api, args| {
                let call = api
                    .resolver
                    .get::<TrackProvider>(TrackProvider::NAME)
                    .map(|track| handler(Arc::clone(&api), track, args));
                async move { call?.await }
            }),
        )
    }
}

fn bool_arg(args: &[Value]) -> AppResult<bool> {
    args.first()
        .and_then(Value::as_bool)
        .ok_or_else(|| AppError::InvalidArgument("expected a boolean".to_string()))
}

/// `{ "time": seconds }`; anything else reads as zero.
fn time_arg(args: &[Value]) -> f64 {
    args.first()
        .and_then(|data| data.get("time"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

#[async_trait]
impl Provider for ApiProvider {
    fn hooks(&self) -> &'static [LifecyclePhase] {
        &[LifecyclePhase::AfterInit, LifecyclePhase::OnDestroy]
    }

    async fn after_init(&self) -> AppResult<()> {
        self.start().await
    }

    async fn on_destroy(&self) -> AppResult<()> {
        self.stop().await
    }

    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        vec![Subscription::new(
            names::SETTINGS_CHANGE,
            bind(&self, |api, args| async move {
                if args.get(1).and_then(Value::as_bool).unwrap_or(false) {
                    api.start().await
                } else {
                    api.stop().await
                }
            }),
        )
        .filter(first_arg_is("api.enabled"))
        .debounce_ms(API_ENABLED_DEBOUNCE_MS)]
    }

    fn routes(self: Arc<Self>) -> Vec<Route> {
        vec![
            Route::new(names::API_ROUTES_DISCOVERY, |_| async {
                Ok(json!(ApiProvider::route_listing()?))
            }),
            self.track_route(names::API_TRACK_CURRENT, |_, track, _| async move {
                Ok(track.track_data().map_or(Value::Null, |t| json!(t.as_ref())))
            }),
            self.track_route(names::API_TRACK_STATE, |_, track, _| async move {
                Ok(json!(track.track_state().await?))
            }),
            self.track_route(names::API_TRACK_LIKE, |_, track, args| async move {
                Ok(json!(track.set_liked(bool_arg(&args)?).await?))
            }),
            self.track_route(names::API_TRACK_DISLIKE, |_, track, args| async move {
                Ok(json!(track.set_disliked(bool_arg(&args)?).await?))
            }),
            self.track_route(names::API_TRACK_ACCENT, |api, track, _| async move {
                Ok(api.track_accent(&track).await)
            }),
            self.track_route(names::API_TRACK_MUTE, |_, track, args| async move {
                let desired = args.first().and_then(Value::as_bool);
                Ok(json!(track.set_muted(desired).await?))
            }),
            self.track_route(names::API_TRACK_REPEAT, |_, track, args| async move {
                let desired = args.first().and_then(Value::as_str).and_then(RepeatMode::parse);
                Ok(json!(track.set_repeat(desired).await?))
            }),
            self.track_route(names::API_TRACK_SHUFFLE, |_, track, _| async move {
                track.shuffle().await?;
                Ok(Value::Null)
            }),
            self.track_route(names::API_TRACK_NEXT, |_, track, _| async move {
                track.next().await?;
                Ok(Value::Null)
            }),
            self.track_route(names::API_TRACK_PREV, |_, track, _| async move {
                track.previous().await?;
                Ok(Value::Null)
            }),
            self.track_route(names::API_TRACK_FORWARD, |_, track, args| async move {
                track.forward(time_arg(&args));
                Ok(Value::Null)
            }),
            self.track_route(names::API_TRACK_BACKWARD, |_, track, args| async move {
                track.backward(time_arg(&args));
                Ok(Value::Null)
            }),
            self.track_route(names::API_TRACK_PLAY, |_, track, _| async move {
                Ok(json!(track.play().await?))
            }),
            self.track_route(names::API_TRACK_PAUSE, |_, track, _| async move {
                Ok(json!(track.pause().await?))
            }),
            self.track_route(names::API_TRACK_SEEK, |_, track, args| async move {
                let seconds = args.first().and_then(Value::as_f64).ok_or_else(|| {
                    AppError::InvalidArgument("seek expects a number of seconds".to_string())
                })?;
                track.seek(seconds)?;
                Ok(Value::Null)
            }),
            self.track_route(names::API_TRACK_TOGGLE_PLAY, |_, track, _| async move {
                Ok(json!(track.toggle_playback().await?))
            }),
            self.track_route(names::API_SOCKET, |_, track, _| async move {
                Ok(track.handshake())
            }),
        ]
    }
}
