// src/providers/track_provider.rs
//
// Track Provider - the "now playing" state machine
//
// ARCHITECTURE:
// - Metadata table: every track payload seen this session, keyed by id
// - Active id + play state: driven by page signals
// - Track state: one `Arc<TrackState>`, replaced whole through `commit`
//
// The page is only partially observable. Every read of like/mute/repeat
// state is a best-effort probe with a safe default, and every control
// command writes back what the page reports afterwards.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::api_provider::ApiProvider;
use super::media_control_provider::MediaControlProvider;
use super::presence_provider::PresenceProvider;
use super::provider::{Provider, ProviderContext};
use super::registry::ProviderResolver;
use super::bind;
use crate::domain::{validate_track_state, ControlSample, PlayState, RepeatMode, TrackData, TrackState};
use crate::error::{AppError, AppResult};
use crate::events::names;
use crate::events::{EventArgs, EventBus, Subscription, ViewId};
use crate::integrations::page::{execute_within, probe_or, truthy, PROBE_ALLOWANCE};
use crate::integrations::{PageProbe, PageScript};

const TITLE_CHANGE_DEBOUNCE_MS: u64 = 100;
const SET_ACTIVE_DEBOUNCE_MS: u64 = 1000;
const PLAY_STATE_DEBOUNCE_MS: u64 = 100;

/// Repeat cycles through three modes; more clicks never help.
const MAX_REPEAT_CLICKS: usize = 3;

pub struct TrackProvider {
    bus: EventBus,
    resolver: ProviderResolver,
    page: Arc<dyn PageProbe>,
    tracks: RwLock<HashMap<String, Arc<TrackData>>>,
    active_id: RwLock<Option<String>>,
    play_state: RwLock<Option<PlayState>>,
    state: RwLock<Option<Arc<TrackState>>>,
}

impl TrackProvider {
    pub const NAME: &'static str = "track";

    pub fn new(context: &ProviderContext, page: Arc<dyn PageProbe>) -> Self {
        Self {
            bus: context.bus.clone(),
            resolver: context.resolver.clone(),
            page,
            tracks: RwLock::new(HashMap::new()),
            active_id: RwLock::new(None),
            play_state: RwLock::new(None),
            state: RwLock::new(None),
        }
    }

    // ========================================================================
    // READ ACCESS
    // ========================================================================

    pub fn active_track_id(&self) -> Option<String> {
        self.active_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn play_state(&self) -> Option<PlayState> {
        *self.play_state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_playing(&self) -> bool {
        self.play_state().is_some_and(|s| s.is_playing())
    }

    pub fn metadata(&self, id: &str) -> Option<Arc<TrackData>> {
        self.tracks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn has_metadata(&self, id: &str) -> bool {
        self.tracks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Metadata of the active track.
    pub fn track_data(&self) -> Option<Arc<TrackData>> {
        self.active_track_id().and_then(|id| self.metadata(&id))
    }

    /// Whole seconds of the active track, if its metadata says.
    pub fn track_duration(&self) -> Option<f64> {
        self.track_data()
            .and_then(|track| track.duration_seconds())
            .map(f64::trunc)
    }

    pub fn current_state(&self) -> Option<Arc<TrackState>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Payload handed to API socket clients on connect.
    pub fn handshake(&self) -> Value {
        json!({
            "track": self.track_data().map(|t| json!(t.as_ref())),
            "state": self.current_state().map(|s| json!(s.as_ref())),
        })
    }

    // ========================================================================
    // STATE REPLACEMENT
    // ========================================================================

    /// Replace the track state and broadcast it to every view.
    pub fn set_track_state(&self, next: TrackState) -> AppResult<Arc<TrackState>> {
        self.commit(|_| Some(next))?
            .ok_or_else(|| AppError::Other("track state not committed".to_string()))
    }

    /// Derive the next state from the current one. No-op without a state.
    pub fn update_track_state<F>(&self, apply: F) -> AppResult<Option<Arc<TrackState>>>
    where
        F: FnOnce(&mut TrackState),
    {
        self.commit(|current| {
            current.map(|current| {
                let mut next = current.clone();
                apply(&mut next);
                next
            })
        })
    }

    /// The only place track state is written. `derive` runs under the state
    /// lock and must not read `self.state`.
    fn commit<F>(&self, derive: F) -> AppResult<Option<Arc<TrackState>>>
    where
        F: FnOnce(Option<&TrackState>) -> Option<TrackState>,
    {
        let committed = {
            let mut slot = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let Some(next) = derive(slot.as_deref()) else {
                return Ok(None);
            };
            validate_track_state(&next, |id| self.has_metadata(id))?;
            let next = Arc::new(next);
            *slot = Some(Arc::clone(&next));
            next
        };

        match serde_json::to_value(committed.as_ref()) {
            Ok(snapshot) => self
                .bus
                .send_to_all_views(names::TRACK_PLAY_STATE, &[snapshot]),
            Err(e) => log::error!("[TRACK] failed to serialize track state: {}", e),
        }
        Ok(Some(committed))
    }

    // ========================================================================
    // PAGE PROBES
    // ========================================================================

    /// `(liked, disliked)`
    pub async fn like_state(&self) -> (bool, bool) {
        probe_or(self.page.as_ref(), PageScript::LikeState, (false, false), |value| {
            let pair = value.as_array()?;
            Some((truthy(pair.first()?)?, truthy(pair.get(1)?)?))
        })
        .await
    }

    pub async fn muted_state(&self) -> bool {
        probe_or(self.page.as_ref(), PageScript::MutedState, false, |v| truthy(&v)).await
    }

    pub async fn repeat_state(&self) -> RepeatMode {
        probe_or(self.page.as_ref(), PageScript::RepeatLabel, RepeatMode::Off, |v| {
            v.as_str().and_then(RepeatMode::parse)
        })
        .await
    }

    /// Track id the page currently shows.
    pub async fn page_active_track_id(&self) -> Option<String> {
        probe_or(self.page.as_ref(), PageScript::ActiveTrackId, None, |v| match v {
            Value::String(id) if !id.is_empty() => Some(Some(id)),
            Value::String(_) | Value::Null => Some(None),
            _ => None,
        })
        .await
    }

    async fn control_sample(&self) -> ControlSample {
        let (liked, disliked) = self.like_state().await;
        let muted = self.muted_state().await;
        let repeat = self.repeat_state().await;
        ControlSample {
            liked,
            disliked,
            muted,
            repeat,
        }
    }

    async fn click(&self, script: PageScript) -> AppResult<()> {
        execute_within(self.page.as_ref(), script, PROBE_ALLOWANCE).await?;
        Ok(())
    }

    /// Click where the outcome is re-read from the page anyway.
    async fn click_best_effort(&self, script: PageScript) {
        if let Err(e) = self.click(script).await {
            log::warn!("[TRACK] {:?} failed: {}", script, e);
        }
    }

    // ========================================================================
    // PAGE SIGNALS
    // ========================================================================

    pub(crate) async fn on_track_info(&self, args: EventArgs) -> AppResult<()> {
        let Some(payload) = args.into_iter().next() else {
            return Ok(());
        };
        let track: TrackData = serde_json::from_value(payload)?;
        let Some(id) = track.id().map(str::to_string) else {
            return Ok(());
        };
        let track = Arc::new(track);
        self.tracks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::clone(&track));

        let already_active = self.active_track_id().as_deref() == Some(id.as_str());
        if !already_active && self.page_active_track_id().await.as_deref() != Some(id.as_str()) {
            return Ok(());
        }

        *self.active_id.write().unwrap_or_else(PoisonError::into_inner) = Some(id.clone());

        let state_is_current =
            self.current_state().and_then(|s| s.id.clone()).as_deref() == Some(id.as_str());
        if state_is_current {
            self.push_track_to_views(&track);
            return Ok(());
        }
        self.activate(id, track).await
    }

    pub(crate) async fn on_title_change(&self, args: EventArgs) -> AppResult<()> {
        match args.first().and_then(Value::as_str) {
            Some(id) if !id.is_empty() => self.select_track(id).await,
            _ => Ok(()),
        }
    }

    /// Make `id` the active track. Without cached metadata the id is recorded
    /// but no state is produced until `track:info-req` delivers it.
    pub async fn select_track(&self, id: &str) -> AppResult<()> {
        if self.active_track_id().as_deref() == Some(id) {
            return Ok(());
        }

        log::debug!("[TRACK] active track: {}", id);
        *self.active_id.write().unwrap_or_else(PoisonError::into_inner) = Some(id.to_string());

        match self.metadata(id) {
            Some(track) => self.activate(id.to_string(), track).await,
            None => {
                log::debug!("[TRACK] no metadata for {} yet", id);
                Ok(())
            }
        }
    }

    async fn activate(&self, id: String, track: Arc<TrackData>) -> AppResult<()> {
        let controls = self.control_sample().await;

        if self.active_track_id().as_deref() != Some(id.as_str()) {
            log::debug!("[TRACK] {} was superseded while probing", id);
            return Ok(());
        }

        self.push_track_to_views(&track);
        let duration = track.duration_seconds().map(f64::trunc).unwrap_or(0.0);
        self.set_track_state(TrackState::activated(id, self.is_playing(), duration, controls))?;
        Ok(())
    }

    /// Args: `(isPlaying, progressSeconds = 0, [uiProgress, uiDuration]?)`
    pub(crate) async fn on_play_state(&self, args: EventArgs) -> AppResult<()> {
        let playing = args.first().and_then(truthy).unwrap_or(false);
        let progress = args.get(1).and_then(Value::as_f64).unwrap_or(0.0);
        let ui = args.get(2).and_then(ui_time_info);

        *self.play_state.write().unwrap_or_else(PoisonError::into_inner) =
            Some(PlayState::from_playing(playing));

        self.sync_presence(playing, reported_progress(progress, ui)).await;

        let controls = self.control_sample().await;
        let fallback_id = self.active_track_id().filter(|id| self.has_metadata(id));
        let fallback_duration = self.track_duration().unwrap_or(0.0);

        self.commit(|current| {
            let base = match current {
                Some(current) => current.clone(),
                None => TrackState {
                    id: fallback_id,
                    duration: fallback_duration,
                    ..TrackState::default()
                },
            };
            let (ui_progress, duration) = ui.unwrap_or((base.ui_progress, base.duration));
            Some(
                TrackState {
                    playing,
                    progress,
                    ui_progress,
                    duration,
                    ..base
                }
                .with_controls(controls),
            )
        })?;
        Ok(())
    }

    async fn sync_presence(&self, playing: bool, progress: f64) {
        let presence = match self.resolver.get::<PresenceProvider>(PresenceProvider::NAME) {
            Ok(presence) => presence,
            Err(e) => {
                log::debug!("[TRACK] presence unavailable: {}", e);
                return;
            }
        };

        if playing && !presence.is_connected() && presence.is_enabled() {
            if let Err(e) = presence.enable().await {
                log::warn!("[TRACK] failed to re-enable presence: {}", e);
            }
        }
        if let Err(e) = presence.update_play_state(playing, progress).await {
            log::warn!("[TRACK] presence update failed: {}", e);
        }
    }

    /// Title to the toolbar, id to the player view, payload to every view,
    /// the API socket and the OS media session.
    pub fn push_track_to_views(&self, track: &TrackData) {
        let title = track.title().map_or(Value::Null, |t| json!(t));
        self.bus
            .send_to_view(ViewId::Toolbar, names::TRACK_TITLE, &[title]);
        if let Some(id) = track.id() {
            self.bus
                .send_to_view(ViewId::Player, names::TRACK_CHANGE_VIEW, &[json!(id)]);
        }

        let payload = match serde_json::to_value(track) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("[TRACK] failed to serialize track: {}", e);
                return;
            }
        };
        self.bus
            .send_to_all_views(names::TRACK_CHANGE, &[payload.clone()]);

        match self.resolver.get::<ApiProvider>(ApiProvider::NAME) {
            Ok(api) => {
                if let Err(e) = api.send_message(names::TRACK_CHANGE, payload) {
                    log::warn!("[TRACK] API push failed: {}", e);
                }
            }
            Err(e) => log::debug!("[TRACK] API provider unavailable: {}", e),
        }
        match self
            .resolver
            .get::<MediaControlProvider>(MediaControlProvider::NAME)
        {
            Ok(media) => media.handle_track_change(track),
            Err(e) => log::debug!("[TRACK] media controller unavailable: {}", e),
        }
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Current state with mute and repeat re-read from the page.
    pub async fn track_state(&self) -> AppResult<TrackState> {
        let muted = self.muted_state().await;
        let repeat = self.repeat_state().await;
        let committed = self.update_track_state(|state| {
            state.muted = muted;
            state.repeat = repeat;
        })?;
        Ok(match committed {
            Some(state) => state.as_ref().clone(),
            None => TrackState {
                muted,
                repeat,
                ..TrackState::default()
            },
        })
    }

    pub async fn set_liked(&self, desired: bool) -> AppResult<bool> {
        let (liked, _) = self.like_state().await;
        if liked == desired {
            return Ok(liked);
        }
        self.click_best_effort(PageScript::ClickLike).await;
        let (liked, _) = self.like_state().await;
        self.update_track_state(|state| state.liked = liked)?;
        Ok(liked)
    }

    pub async fn set_disliked(&self, desired: bool) -> AppResult<bool> {
        let (_, disliked) = self.like_state().await;
        if disliked == desired {
            return Ok(disliked);
        }
        self.click_best_effort(PageScript::ClickDislike).await;
        let (_, disliked) = self.like_state().await;
        self.update_track_state(|state| state.disliked = disliked)?;
        Ok(disliked)
    }

    /// `None` toggles.
    pub async fn set_muted(&self, desired: Option<bool>) -> AppResult<bool> {
        if let Some(desired) = desired {
            if self.muted_state().await == desired {
                return Ok(desired);
            }
        }
        self.click_best_effort(PageScript::ClickMute).await;
        let muted = self.muted_state().await;
        self.update_track_state(|state| state.muted = muted)?;
        Ok(muted)
    }

    /// `None` advances one step; `Some(mode)` clicks until the page shows it.
    pub async fn set_repeat(&self, desired: Option<RepeatMode>) -> AppResult<RepeatMode> {
        let mut observed = self.repeat_state().await;
        match desired {
            None => {
                self.click_best_effort(PageScript::ClickRepeat).await;
                observed = self.repeat_state().await;
            }
            Some(target) => {
                for _ in 0..MAX_REPEAT_CLICKS {
                    if observed == target {
                        break;
                    }
                    self.click_best_effort(PageScript::ClickRepeat).await;
                    observed = self.repeat_state().await;
                }
            }
        }
        self.update_track_state(|state| state.repeat = observed)?;
        Ok(observed)
    }

    pub async fn shuffle(&self) -> AppResult<()> {
        self.click(PageScript::ClickShuffle).await
    }

    pub async fn next(&self) -> AppResult<()> {
        self.click(PageScript::ClickNext).await
    }

    pub async fn previous(&self) -> AppResult<()> {
        self.click(PageScript::ClickPrevious).await
    }

    /// Jump to `seconds` from the start.
    pub fn seek(&self, seconds: f64) -> AppResult<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(AppError::InvalidArgument(format!(
                "seek position must be a non-negative number, got {}",
                seconds
            )));
        }
        self.bus.send_to_view(
            ViewId::Player,
            names::TRACK_SEEK,
            &[json!({ "time": seconds, "absolute": true })],
        );
        Ok(())
    }

    /// Relative seek; zero is ignored.
    pub fn forward(&self, seconds: f64) {
        if seconds.is_finite() && seconds != 0.0 {
            self.bus
                .send_to_view(ViewId::Player, names::TRACK_SEEK, &[json!({ "time": seconds })]);
        }
    }

    pub fn backward(&self, seconds: f64) {
        self.forward(-seconds);
    }

    /// Returns the observed playing flag.
    pub async fn play(&self) -> AppResult<bool> {
        if self.play_state() != Some(PlayState::Paused) {
            return Ok(self.is_playing());
        }
        self.click(PageScript::ClickPlayPause).await?;
        self.observe_playing(true).await
    }

    pub async fn pause(&self) -> AppResult<bool> {
        if self.play_state() != Some(PlayState::Playing) {
            return Ok(self.is_playing());
        }
        self.click(PageScript::ClickPlayPause).await?;
        self.observe_playing(false).await
    }

    /// `None` while the play state is still unknown.
    pub async fn toggle_playback(&self) -> AppResult<Option<bool>> {
        match self.play_state() {
            Some(PlayState::Playing) => self.pause().await.map(Some),
            Some(PlayState::Paused) => self.play().await.map(Some),
            None => Ok(None),
        }
    }

    async fn observe_playing(&self, expected: bool) -> AppResult<bool> {
        let playing = probe_or(self.page.as_ref(), PageScript::IsPlaying, expected, |v| {
            truthy(&v)
        })
        .await;
        *self.play_state.write().unwrap_or_else(PoisonError::into_inner) =
            Some(PlayState::from_playing(playing));
        self.update_track_state(|state| state.playing = playing)?;
        Ok(playing)
    }
}

/// `[uiProgress, uiDuration]`
fn ui_time_info(value: &Value) -> Option<(f64, f64)> {
    let pair = value.as_array()?;
    Some((pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
}

/// Position reported to presence. The UI pair wins only when the raw
/// progress is past the UI *duration*; otherwise raw progress is used.
// This compares a position with a duration. Kept as the player bridge
// behaves; see DESIGN.md.
pub(crate) fn reported_progress(progress: f64, ui: Option<(f64, f64)>) -> f64 {
    match ui {
        Some((ui_progress, ui_duration)) if ui_duration != 0.0 && progress > ui_duration => {
            ui_progress
        }
        _ => progress,
    }
}

#[async_trait]
impl Provider for TrackProvider {
    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        vec![
            Subscription::new(
                names::TRACK_INFO_REQ,
                bind(&self, |track, args| async move { track.on_track_info(args).await }),
            ),
            Subscription::new(
                names::TRACK_TITLE_CHANGE,
                bind(&self, |track, args| async move { track.on_title_change(args).await }),
            )
            .debounce_ms(TITLE_CHANGE_DEBOUNCE_MS),
            Subscription::new(
                names::TRACK_SET_ACTIVE,
                bind(&self, |track, args| async move { track.on_title_change(args).await }),
            )
            .debounce_ms(SET_ACTIVE_DEBOUNCE_MS),
            Subscription::new(
                names::TRACK_PLAY_STATE,
                bind(&self, |track, args| async move { track.on_play_state(args).await }),
            )
            .debounce_ms(PLAY_STATE_DEBOUNCE_MS),
        ]
    }
}
