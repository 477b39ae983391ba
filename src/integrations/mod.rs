// src/integrations/mod.rs
//
// External Integrations Module
//
// One capability trait per collaborator the kernel drives but does not own.
// Real bindings live in the desktop shell; `headless` provides stand-ins.

pub mod accent;
pub mod api_transport;
pub mod headless;
pub mod media_session;
pub mod page;
pub mod platform;
pub mod presence;
pub mod update_feed;

pub use accent::AccentResolver;
pub use api_transport::{ApiTransport, SOCKET_CHANNEL};
pub use media_session::{
    MediaButton, MediaButtons, MediaMetadata, MediaSession, MediaType, PlaybackStatus,
};
pub use page::{PageProbe, PageScript};
pub use platform::{LoginItemSettings, PlatformShell, TrayAction, TrayItem, TrayMenu};
pub use presence::{PresenceActivity, PresenceClient};
pub use update_feed::{feed_url, HttpUpdateFeed, UpdateCheck, UpdateTransport};
