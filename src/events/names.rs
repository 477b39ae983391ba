// src/events/names.rs
//
// Event and route names shared with the embedded page, the renderer views
// and the external API surface. These strings are wire contracts: never
// rename them.

// ============================================================================
// TRACK EVENTS
// ============================================================================

pub const TRACK_INFO_REQ: &str = "track:info-req";
pub const TRACK_TITLE_CHANGE: &str = "track:title-change";
pub const TRACK_SET_ACTIVE: &str = "track:set-active";
pub const TRACK_PLAY_STATE: &str = "track:play-state";
pub const TRACK_SEEK: &str = "track:seek";
pub const TRACK_TITLE: &str = "track:title";
pub const TRACK_CHANGE: &str = "track:change";
/// Sent to the player view only (dot-separated, unlike `track:change`).
pub const TRACK_CHANGE_VIEW: &str = "track.change";

// ============================================================================
// SETTINGS EVENTS / ROUTES
// ============================================================================

pub const SETTINGS_CHANGE: &str = "settingsProvider.change";
pub const SETTINGS_SAVE: &str = "settingsProvider.save";
pub const SETTINGS_GET: &str = "settingsProvider.get";
pub const SETTINGS_GET_ALL: &str = "settingsProvider.getAll";
pub const SETTINGS_SET: &str = "settingsProvider.set";
pub const SETTINGS_UPDATE: &str = "settingsProvider.update";

// ============================================================================
// APP UPDATE EVENTS
// ============================================================================

pub const APP_UPDATE_AVAILABLE: &str = "app.updateAvailable";
pub const APP_UPDATE_DOWNLOADED: &str = "app.updateDownloaded";
pub const APP_INSTALL_UPDATE: &str = "app.installUpdate";
pub const APP_CHECK_UPDATE: &str = "app.checkUpdate";

// ============================================================================
// HOST-SHELL EVENTS
// ============================================================================

pub const VIEW_DID_NAVIGATE: &str = "view.didNavigate";
pub const VIEW_DID_NAVIGATE_IN_PAGE: &str = "view.didNavigateInPage";
pub const MEDIA_CONTROL_BUTTON: &str = "mediaControl.buttonPressed";

// ============================================================================
// EXTERNAL API ROUTES
// ============================================================================

pub const API_ROUTES_DISCOVERY: &str = "api/routes";

pub const API_TRACK_CURRENT: &str = "api/track";
pub const API_TRACK_STATE: &str = "api/track/state";
pub const API_TRACK_LIKE: &str = "api/track/like";
pub const API_TRACK_DISLIKE: &str = "api/track/dislike";
pub const API_TRACK_ACCENT: &str = "api/track/accent";
pub const API_TRACK_MUTE: &str = "api/track/mute";
pub const API_TRACK_REPEAT: &str = "api/track/repeat";
pub const API_TRACK_SHUFFLE: &str = "api/track/shuffle";
pub const API_TRACK_NEXT: &str = "api/track/next";
pub const API_TRACK_PREV: &str = "api/track/prev";
pub const API_TRACK_FORWARD: &str = "api/track/forward";
pub const API_TRACK_BACKWARD: &str = "api/track/backward";
pub const API_TRACK_PLAY: &str = "api/track/play";
pub const API_TRACK_PAUSE: &str = "api/track/pause";
pub const API_TRACK_SEEK: &str = "api/track/seek";
pub const API_TRACK_TOGGLE_PLAY: &str = "api/track/toggle-play-state";
pub const API_SOCKET: &str = "api/socket";

/// Every external API route, in declaration order.
pub const API_ROUTES: &[&str] = &[
    API_TRACK_CURRENT,
    API_TRACK_STATE,
    API_TRACK_LIKE,
    API_TRACK_DISLIKE,
    API_TRACK_ACCENT,
    API_TRACK_MUTE,
    API_TRACK_REPEAT,
    API_TRACK_SHUFFLE,
    API_TRACK_NEXT,
    API_TRACK_PREV,
    API_TRACK_FORWARD,
    API_TRACK_BACKWARD,
    API_TRACK_PLAY,
    API_TRACK_SEEK,
    API_TRACK_PAUSE,
    API_TRACK_TOGGLE_PLAY,
    API_SOCKET,
];
