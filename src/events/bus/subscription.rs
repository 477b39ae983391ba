// src/events/bus/subscription.rs
//
// Subscription records.
//
// Providers build these at construction time and hand them to the registry,
// which subscribes them on the bus. Nothing is discovered by reflection: the
// table a provider returns is the complete list of what it listens to.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::AppResult;

/// Arguments of one publish, in wire order.
pub type EventArgs = Vec<Value>;

pub type HandlerFuture = Pin<Box<dyn Future<Output = AppResult<()>> + Send + 'static>>;

/// Type-erased handler. Called synchronously; the returned future is spawned.
pub(crate) type EventHandler = Arc<dyn Fn(EventArgs) -> HandlerFuture + Send + Sync>;

pub(crate) type EventFilter = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct SubscribeOptions {
    pub debounce: Option<Duration>,
    pub(crate) filter: Option<EventFilter>,
}

/// `(event name, handler, options)` as declared by a provider.
pub struct Subscription {
    event: String,
    handler: EventHandler,
    options: SubscribeOptions,
}

impl Subscription {
    pub fn new<F, Fut>(event: &str, handler: F) -> Self
    where
        F: Fn(EventArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        let handler: EventHandler = Arc::new(move |args| Box::pin(handler(args)));
        Self {
            event: event.to_string(),
            handler,
            options: SubscribeOptions::default(),
        }
    }

    /// Deliver only after `ms` milliseconds without another accepted publish.
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.options.debounce = Some(Duration::from_millis(ms));
        self
    }

    /// Skip the handler entirely when `predicate` rejects the arguments.
    pub fn filter<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        self.options.filter = Some(Arc::new(predicate));
        self
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub(crate) fn into_parts(self) -> (String, EventHandler, SubscribeOptions) {
        (self.event, self.handler, self.options)
    }
}

/// Filter accepting publishes whose first argument is the string `expected`.
/// Settings change events carry the changed key path first.
pub fn first_arg_is(expected: &'static str) -> impl Fn(&[Value]) -> bool + Send + Sync + 'static {
    move |args: &[Value]| args.first().and_then(Value::as_str) == Some(expected)
}
