// src/integrations/headless.rs
//
// Collaborators used when no desktop shell is attached.
//
// The binary runs the provider kernel on its own; every outward surface
// either logs what it would have done or reports itself unavailable.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::accent::AccentResolver;
use super::api_transport::ApiTransport;
use super::media_session::{MediaButtons, MediaMetadata, MediaSession, PlaybackStatus};
use super::page::PageProbe;
use super::platform::{LoginItemSettings, PlatformShell, TrayMenu};
use super::presence::{PresenceActivity, PresenceClient};
use crate::error::{AppError, AppResult, ProbeError};
use crate::events::{RendererBridge, ViewId};

/// No browser view: every probe fails and callers fall back to defaults.
#[derive(Debug, Default)]
pub struct DetachedPage;

#[async_trait]
impl PageProbe for DetachedPage {
    async fn execute(&self, _script: &str) -> Result<Value, ProbeError> {
        Err(ProbeError::Unavailable)
    }
}

/// Renderer bridge that only logs outgoing messages.
#[derive(Debug, Default)]
pub struct LoggingBridge;

impl RendererBridge for LoggingBridge {
    fn send(&self, view: ViewId, event: &str, args: &[Value]) -> AppResult<()> {
        log::trace!("[VIEW:{}] {} ({} args)", view, event, args.len());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HeadlessMediaSession {
    enabled: AtomicBool,
}

impl MediaSession for HeadlessMediaSession {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) -> AppResult<()> {
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn set_metadata(&self, metadata: &MediaMetadata) -> AppResult<()> {
        log::debug!(
            "[MEDIA] now playing: {} - {} ({:?})",
            metadata.artist,
            metadata.title,
            metadata.media_type
        );
        Ok(())
    }

    fn set_playback(&self, status: PlaybackStatus, _buttons: MediaButtons) -> AppResult<()> {
        log::debug!("[MEDIA] status: {:?}", status);
        Ok(())
    }
}

/// Presence client without an IPC socket. Connecting always fails.
#[derive(Debug, Default)]
pub struct OfflinePresence;

#[async_trait]
impl PresenceClient for OfflinePresence {
    async fn connect(&self) -> AppResult<()> {
        Err(AppError::Integration("presence IPC not available".to_string()))
    }

    async fn disconnect(&self) -> AppResult<()> {
        Ok(())
    }

    async fn set_activity(&self, _activity: PresenceActivity) -> AppResult<()> {
        Err(AppError::Integration("presence IPC not available".to_string()))
    }

    async fn clear_activity(&self) -> AppResult<()> {
        Ok(())
    }
}

/// API transport that accepts no connections.
#[derive(Debug, Default)]
pub struct HeadlessApiTransport {
    running: AtomicBool,
}

#[async_trait]
impl ApiTransport for HeadlessApiTransport {
    async fn start(&self, settings: Value) -> AppResult<u32> {
        self.running.store(true, Ordering::SeqCst);
        log::info!(
            "[API] headless transport started (port {})",
            settings["api"]["port"]
        );
        Ok(std::process::id())
    }

    async fn stop(&self) -> AppResult<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn send(&self, channel: &str, event: &str, _payload: Value) -> AppResult<()> {
        if self.running.load(Ordering::SeqCst) {
            log::trace!("[API] {} <- {}", channel, event);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HeadlessPlatform;

impl PlatformShell for HeadlessPlatform {
    fn set_login_item(&self, settings: &LoginItemSettings) -> AppResult<()> {
        log::info!("[PLATFORM] open at login: {}", settings.open_at_login);
        Ok(())
    }

    fn set_tray_menu(&self, menu: &TrayMenu) -> AppResult<()> {
        log::debug!("[PLATFORM] tray menu: {} items", menu.items.len());
        Ok(())
    }
}

/// No image pipeline: artwork has no accent.
#[derive(Debug, Default)]
pub struct NoAccent;

#[async_trait]
impl AccentResolver for NoAccent {
    async fn accent_hex(&self, _image_url: &str) -> AppResult<Option<String>> {
        Ok(None)
    }
}
