// src/events/bus/mod.rs

mod event_bus;
mod subscription;

pub use event_bus::{EventBus, EventLogEntry, PublishReceipt, SubscriptionId};
pub use subscription::{first_arg_is, EventArgs, HandlerFuture, SubscribeOptions, Subscription};
