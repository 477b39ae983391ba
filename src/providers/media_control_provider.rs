// src/providers/media_control_provider.rs
//
// Media-OS Provider ("mediaController")
//
// Maps track state onto the OS media session and routes OS button presses
// back to track commands.
//
//   category Video | Music | Image  -> media type (default Video)
//   playing / paused                -> Playing / Paused, play/pause toggled
//   no track                        -> Stopped, play enabled, pause disabled

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::bind;
use super::provider::{LifecyclePhase, Provider, ProviderContext};
use super::registry::ProviderResolver;
use super::track_provider::TrackProvider;
use crate::domain::TrackData;
use crate::error::{AppError, AppResult};
use crate::events::names;
use crate::events::{EventArgs, Subscription};
use crate::integrations::page::truthy;
use crate::integrations::{
    MediaButton, MediaButtons, MediaMetadata, MediaSession, MediaType, PlaybackStatus,
};

const PLAY_STATE_DEBOUNCE_MS: u64 = 100;

pub struct MediaControlProvider {
    resolver: ProviderResolver,
    session: Arc<dyn MediaSession>,
}

impl MediaControlProvider {
    pub const NAME: &'static str = "mediaController";

    pub fn new(context: &ProviderContext, session: Arc<dyn MediaSession>) -> Self {
        Self {
            resolver: context.resolver.clone(),
            session,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.session.is_enabled()
    }

    /// Copy track metadata into the session. Ignored while disabled.
    pub fn handle_track_change(&self, track: &TrackData) {
        if !self.is_enabled() {
            return;
        }
        let Some(metadata) = media_metadata(track) else {
            return;
        };

        log::debug!(
            "[MEDIA] {}, {:?}, {}",
            metadata.title,
            metadata.media_type,
            metadata.track_id
        );
        let buttons = MediaButtons {
            play: false,
            pause: true,
            previous: true,
            next: true,
        };
        if let Err(e) = self
            .session
            .set_metadata(&metadata)
            .and_then(|_| self.session.set_playback(PlaybackStatus::Playing, buttons))
        {
            log::error!("[MEDIA] failed to update media session: {}", e);
        }
    }

    pub fn handle_play_state(&self, playing: bool) -> AppResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let has_track = self
            .resolver
            .get::<TrackProvider>(TrackProvider::NAME)?
            .track_data()
            .is_some();
        let (status, buttons) = playback_mapping(has_track, playing);
        self.session.set_playback(status, buttons)
    }

    async fn on_button(&self, args: EventArgs) -> AppResult<()> {
        let name = args.first().and_then(Value::as_str).unwrap_or_default();
        let button = MediaButton::parse(name)
            .ok_or_else(|| AppError::InvalidArgument(format!("unknown media button {}", name)))?;
        log::debug!("[MEDIA] button press: {:?}", button);

        let track = self.resolver.get::<TrackProvider>(TrackProvider::NAME)?;
        match button {
            MediaButton::Play => track.play().await.map(drop),
            MediaButton::Pause => track.pause().await.map(drop),
            MediaButton::PlayPause => track.toggle_playback().await.map(drop),
            MediaButton::Next => track.next().await,
            MediaButton::Previous => track.previous().await,
        }
    }
}

fn media_metadata(track: &TrackData) -> Option<MediaMetadata> {
    let video = track.video.as_ref()?;
    Some(MediaMetadata {
        media_type: MediaType::from_category(track.category()),
        title: video.title.clone(),
        artist: video.author.clone(),
        album_artist: video.author.clone(),
        album_title: track.album().unwrap_or_default().to_string(),
        track_id: video.video_id.clone(),
        thumbnail: track.album_thumbnail().map(str::to_string),
    })
}

fn playback_mapping(has_track: bool, playing: bool) -> (PlaybackStatus, MediaButtons) {
    if !has_track {
        return (
            PlaybackStatus::Stopped,
            MediaButtons {
                play: true,
                pause: false,
                ..MediaButtons::default()
            },
        );
    }
    let status = if playing {
        PlaybackStatus::Playing
    } else {
        PlaybackStatus::Paused
    };
    (
        status,
        MediaButtons {
            play: !playing,
            pause: playing,
            previous: true,
            next: true,
        },
    )
}

#[async_trait]
impl Provider for MediaControlProvider {
    fn hooks(&self) -> &'static [LifecyclePhase] {
        &[LifecyclePhase::AfterInit, LifecyclePhase::OnDestroy]
    }

    async fn after_init(&self) -> AppResult<()> {
        if let Err(e) = self.session.set_enabled(true) {
            log::warn!("[MEDIA] media session could not be enabled: {}", e);
        }
        if !self.is_enabled() {
            log::warn!("[MEDIA] media session is disabled");
        }
        Ok(())
    }

    async fn on_destroy(&self) -> AppResult<()> {
        self.session.set_enabled(false)
    }

    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        vec![
            Subscription::new(
                names::TRACK_PLAY_STATE,
                bind(&self, |media, args| async move {
                    let playing = args.first().and_then(truthy).unwrap_or(false);
                    media.handle_play_state(playing)
                }),
            )
            .debounce_ms(PLAY_STATE_DEBOUNCE_MS),
            Subscription::new(
                names::MEDIA_CONTROL_BUTTON,
                bind(&self, |media, args| async move { media.on_button(args).await }),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::media_session::MockMediaSession;
    use serde_json::json;

    fn track(category: &str) -> TrackData {
        serde_json::from_value(json!({
            "video": { "videoId": "abc", "title": "Song", "author": "Artist" },
            "context": { "category": category, "pageOwnerDetails": { "name": "Album" } },
            "meta": { "thumbnail": "https://img/album.jpg" }
        }))
        .unwrap()
    }

    #[test]
    fn test_metadata_mapping() {
        let metadata = media_metadata(&track("Music")).unwrap();
        assert_eq!(metadata.media_type, MediaType::Music);
        assert_eq!(metadata.album_title, "Album");
        assert_eq!(metadata.artist, "Artist");
        assert_eq!(metadata.thumbnail.as_deref(), Some("https://img/album.jpg"));

        assert_eq!(
            media_metadata(&track("Podcast")).unwrap().media_type,
            MediaType::Video
        );
        assert!(media_metadata(&TrackData::default()).is_none());
    }

    #[test]
    fn test_playback_mapping() {
        let (status, buttons) = playback_mapping(false, true);
        assert_eq!(status, PlaybackStatus::Stopped);
        assert!(buttons.play && !buttons.pause);

        let (status, buttons) = playback_mapping(true, true);
        assert_eq!(status, PlaybackStatus::Playing);
        assert!(!buttons.play && buttons.pause);

        let (status, buttons) = playback_mapping(true, false);
        assert_eq!(status, PlaybackStatus::Paused);
        assert!(buttons.play && !buttons.pause && buttons.next);
    }

    #[test]
    fn test_track_change_skipped_while_disabled() {
        let mut session = MockMediaSession::new();
        session.expect_is_enabled().return_const(false);
        session.expect_set_metadata().never();
        let context = ProviderContext {
            bus: crate::events::EventBus::new(),
            router: crate::events::CommandRouter::new(),
            resolver: ProviderResolver::detached(),
        };
        let media = MediaControlProvider::new(&context, Arc::new(session));
        media.handle_track_change(&track("Music"));
    }

    #[test]
    fn test_track_change_updates_session() {
        let mut session = MockMediaSession::new();
        session.expect_is_enabled().return_const(true);
        session
            .expect_set_metadata()
            .withf(|m| m.track_id == "abc" && m.media_type == MediaType::Music)
            .times(1)
            .returning(|_| Ok(()));
        session
            .expect_set_playback()
            .withf(|status, buttons| *status == PlaybackStatus::Playing && buttons.next)
            .times(1)
            .returning(|_, _| Ok(()));
        let context = ProviderContext {
            bus: crate::events::EventBus::new(),
            router: crate::events::CommandRouter::new(),
            resolver: ProviderResolver::detached(),
        };
        let media = MediaControlProvider::new(&context, Arc::new(session));
        media.handle_track_change(&track("Music"));
    }
}
