use std::fmt;

use serde::{Deserialize, Serialize};

/// Repeat button state of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

impl RepeatMode {
    /// Parse the label the player shows on its repeat button.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Repeat off" => Some(RepeatMode::Off),
            "Repeat one" => Some(RepeatMode::One),
            "Repeat all" => Some(RepeatMode::All),
            _ => None,
        }
    }

    /// Accepts either a button label or the serialized form ("off", ...).
    pub fn parse(raw: &str) -> Option<Self> {
        Self::from_label(raw).or(match raw {
            "off" => Some(RepeatMode::Off),
            "one" => Some(RepeatMode::One),
            "all" => Some(RepeatMode::All),
            _ => None,
        })
    }

    /// Mode after one press of the repeat button.
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::One => "one",
            RepeatMode::All => "all",
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    Playing,
    Paused,
}

impl PlayState {
    pub fn from_playing(playing: bool) -> Self {
        if playing {
            PlayState::Playing
        } else {
            PlayState::Paused
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlayState::Playing)
    }
}

/// "Now playing" snapshot pushed to every view.
///
/// Replaced as a whole, never patched in place: readers hold an `Arc` to one
/// version and never observe a half-applied update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackState {
    pub id: Option<String>,
    pub playing: bool,
    /// Seconds, as reported by the player.
    pub progress: f64,
    /// Seconds, as shown by the player UI.
    pub ui_progress: f64,
    pub duration: f64,
    pub liked: bool,
    pub disliked: bool,
    pub muted: bool,
    pub repeat: RepeatMode,
}

/// Like/dislike/mute/repeat as sampled from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlSample {
    pub liked: bool,
    pub disliked: bool,
    pub muted: bool,
    pub repeat: RepeatMode,
}

impl TrackState {
    /// Fresh state for a newly activated track: progress starts at 0.
    pub fn activated(id: String, playing: bool, duration: f64, controls: ControlSample) -> Self {
        Self {
            id: Some(id),
            playing,
            progress: 0.0,
            ui_progress: 0.0,
            duration,
            liked: controls.liked,
            disliked: controls.disliked,
            muted: controls.muted,
            repeat: controls.repeat,
        }
    }

    pub fn with_controls(mut self, controls: ControlSample) -> Self {
        self.liked = controls.liked;
        self.disliked = controls.disliked;
        self.muted = controls.muted;
        self.repeat = controls.repeat;
        self
    }
}
