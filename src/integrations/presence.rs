// src/integrations/presence.rs
//
// Rich-presence client (Discord IPC). The presence provider owns connection
// state; this trait is only the wire.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenceActivity {
    pub details: String,
    pub state: String,
    pub playing: bool,
    pub progress_seconds: f64,
    pub duration_seconds: Option<f64>,
    pub large_image: Option<String>,
    pub track_id: Option<String>,
    pub show_buttons: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceClient: Send + Sync {
    async fn connect(&self) -> AppResult<()>;
    async fn disconnect(&self) -> AppResult<()>;
    async fn set_activity(&self, activity: PresenceActivity) -> AppResult<()>;
    async fn clear_activity(&self) -> AppResult<()>;
}
