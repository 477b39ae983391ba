// src/events/mod.rs
//
// Event System - Public API
//
// Bus (fire-and-forget, debounced/filtered), router (request/response) and
// the renderer bridge boundary. Handler type aliases stay internal.

pub mod bridge;
pub mod bus;
pub mod names;
pub mod router;

pub use bridge::{EventOrigin, RendererBridge, ViewId};
pub use bus::{
    first_arg_is, EventArgs, EventBus, EventLogEntry, PublishReceipt, Subscription,
    SubscriptionId,
};
pub use router::{CommandRouter, Route};

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
