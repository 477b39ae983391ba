// src/integrations/media_session.rs
//
// OS media-session surface (SMTC / MPRIS style).
//
// The binding itself lives in the host shell; the media-control provider only
// maps track state onto these plain values.

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Music,
    Video,
    Image,
}

impl MediaType {
    /// Category reported by the page; anything unknown is a video.
    pub fn from_category(category: Option<&str>) -> Self {
        match category {
            Some("Music") => MediaType::Music,
            Some("Image") => MediaType::Image,
            _ => MediaType::Video,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

/// Which transport buttons the OS overlay should enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaButtons {
    pub play: bool,
    pub pause: bool,
    pub previous: bool,
    pub next: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaMetadata {
    pub media_type: MediaType,
    pub title: String,
    pub artist: String,
    pub album_artist: String,
    pub album_title: String,
    pub track_id: String,
    pub thumbnail: Option<String>,
}

/// Button pressed on the OS overlay or a media key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaButton {
    Play,
    Pause,
    PlayPause,
    Next,
    Previous,
}

impl MediaButton {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "play" => Some(MediaButton::Play),
            "pause" => Some(MediaButton::Pause),
            "playpause" | "play-pause" => Some(MediaButton::PlayPause),
            "next" => Some(MediaButton::Next),
            "previous" => Some(MediaButton::Previous),
            _ => None,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait MediaSession: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn set_enabled(&self, enabled: bool) -> AppResult<()>;
    fn set_metadata(&self, metadata: &MediaMetadata) -> AppResult<()>;
    fn set_playback(&self, status: PlaybackStatus, buttons: MediaButtons) -> AppResult<()>;
}
