// src/events/bridge.rs
//
// Renderer boundary.
//
// The main process never owns renderer objects: it hands event name + JSON
// arguments to a bridge supplied by the host shell, which forwards them to
// the renderer surface. Only `serde_json::Value` crosses this line, so
// nothing that cannot survive a structured clone can leak through.

use std::fmt;

use serde_json::Value;

use crate::error::AppResult;

/// Renderer surfaces hosted by the main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    /// The embedded player page.
    Player,
    /// Title bar / toolbar surface.
    Toolbar,
    /// Settings surface.
    Settings,
}

impl ViewId {
    pub const ALL: [ViewId; 3] = [ViewId::Player, ViewId::Toolbar, ViewId::Settings];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewId::Player => "player",
            ViewId::Toolbar => "toolbar",
            ViewId::Settings => "settings",
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a publish came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    Main,
    Renderer(ViewId),
}

impl fmt::Display for EventOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventOrigin::Main => f.write_str("main"),
            EventOrigin::Renderer(view) => write!(f, "renderer:{}", view),
        }
    }
}

/// Transport from the main process into renderer views.
pub trait RendererBridge: Send + Sync {
    /// Deliver one message to one view. Must not block.
    fn send(&self, view: ViewId, event: &str, args: &[Value]) -> AppResult<()>;

    /// Views currently alive.
    fn views(&self) -> Vec<ViewId> {
        ViewId::ALL.to_vec()
    }
}
