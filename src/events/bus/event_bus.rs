// src/events/bus/event_bus.rs
//
// Core event bus implementation.
//
// DESIGN PRINCIPLES:
// 1. Named events - subscriptions are keyed by the wire event name
// 2. Ordered - handlers are invoked in subscription order
// 3. Isolated - a failing or panicking handler never reaches the publisher
// 4. Observable - every publish is logged
// 5. Two address spaces - main-origin publishes are mirrored to renderers

use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::task::{JoinError, JoinHandle};
use uuid::Uuid;

use super::subscription::{EventArgs, EventFilter, EventHandler, HandlerFuture, Subscription};
use crate::error::AppResult;
use crate::events::bridge::{EventOrigin, RendererBridge, ViewId};

const EVENT_LOG_CAPACITY: usize = 512;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

struct SubscriptionEntry {
    id: SubscriptionId,
    event: String,
    handler: EventHandler,
    filter: Option<EventFilter>,
    debounce: Option<Duration>,
    /// Timer task of the pending debounced delivery, if any.
    pending: Mutex<Option<JoinHandle<()>>>,
    removed: AtomicBool,
}

impl SubscriptionEntry {
    fn accepts(&self, args: &[Value]) -> bool {
        let Some(filter) = &self.filter else {
            return true;
        };
        match catch_unwind(AssertUnwindSafe(|| filter(args))) {
            Ok(passed) => passed,
            Err(_) => {
                log::error!("[BUS] filter for {} panicked, skipping delivery", self.event);
                false
            }
        }
    }

    fn cancel_pending(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = pending.take() {
            timer.abort();
        }
    }
}

/// A logged publish for debugging and tracing
#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub event: String,
    pub origin: EventOrigin,
    /// Subscriptions whose filter accepted the publish.
    pub delivered: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Outcome of one publish.
///
/// Dropping it is fine: deliveries run regardless. Await [`settled`] to wait
/// for the immediate (non-debounced) handlers of that publish to finish.
///
/// [`settled`]: PublishReceipt::settled
#[derive(Debug)]
pub struct PublishReceipt {
    event: String,
    delivered: usize,
    handles: Vec<JoinHandle<()>>,
}

impl PublishReceipt {
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub async fn settled(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    log::error!("[BUS] delivery of {} panicked", self.event);
                }
            }
        }
    }
}

/// The Event Bus
///
/// Process-wide publish/subscribe channel. Providers declare subscriptions
/// (optionally filtered and/or debounced) and publish by event name; payloads
/// are JSON values so they can be mirrored into renderer views unchanged.
///
/// Handlers run as tokio tasks, so every method that delivers must be called
/// from within a tokio runtime. The immediate handlers of one publish run
/// sequentially in subscription order; debounced handlers run when their
/// own timer fires.
pub struct EventBus {
    /// Map from event name to subscriptions, in subscription order
    subscriptions: Arc<RwLock<HashMap<String, Vec<Arc<SubscriptionEntry>>>>>,

    bridge: Arc<RwLock<Option<Arc<dyn RendererBridge>>>>,

    /// Bounded publish log (for debugging)
    event_log: Arc<RwLock<VecDeque<EventLogEntry>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            bridge: Arc::new(RwLock::new(None)),
            event_log: Arc::new(RwLock::new(VecDeque::with_capacity(EVENT_LOG_CAPACITY))),
        }
    }

    /// Attach the renderer bridge. Replaces any previous bridge.
    pub fn attach_bridge(&self, bridge: Arc<dyn RendererBridge>) {
        *self.bridge.write().unwrap_or_else(PoisonError::into_inner) = Some(bridge);
    }

    /// Register a subscription. Handlers for the same event are invoked in
    /// the order they were subscribed.
    pub fn subscribe(&self, subscription: Subscription) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        let (event, handler, options) = subscription.into_parts();

        log::debug!(
            "[BUS] subscribe {} (debounce: {:?}, filtered: {})",
            event,
            options.debounce,
            options.filter.is_some()
        );

        let entry = Arc::new(SubscriptionEntry {
            id,
            event: event.clone(),
            handler,
            filter: options.filter,
            debounce: options.debounce,
            pending: Mutex::new(None),
            removed: AtomicBool::new(false),
        });

        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subscriptions.entry(event).or_default().push(entry);
        id
    }

    /// Remove a live subscription. Its pending debounced delivery is dropped.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for entries in subscriptions.values_mut() {
            if let Some(pos) = entries.iter().position(|e| e.id == id) {
                let entry = entries.remove(pos);
                entry.removed.store(true, Ordering::SeqCst);
                entry.cancel_pending();
                return true;
            }
        }
        false
    }

    /// Publish from the main process: local subscribers + every renderer view.
    pub fn publish(&self, event: &str, args: EventArgs) -> PublishReceipt {
        self.publish_with_origin(event, args, EventOrigin::Main)
    }

    /// Publish a message received from a renderer view. Delivered to main
    /// process subscribers only; the renderer side has already seen it.
    pub fn publish_from_renderer(
        &self,
        view: ViewId,
        event: &str,
        args: EventArgs,
    ) -> PublishReceipt {
        self.publish_with_origin(event, args, EventOrigin::Renderer(view))
    }

    fn publish_with_origin(
        &self,
        event: &str,
        args: EventArgs,
        origin: EventOrigin,
    ) -> PublishReceipt {
        let entries: Vec<Arc<SubscriptionEntry>> = {
            let subscriptions = self
                .subscriptions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            subscriptions.get(event).cloned().unwrap_or_default()
        };

        let mut delivered = 0;
        let mut immediate = Vec::new();

        for entry in &entries {
            // A rejected publish neither starts nor resets a debounce timer.
            if !entry.accepts(&args) {
                continue;
            }
            delivered += 1;

            match entry.debounce {
                None => {
                    if let Some(future) = Self::start(entry, args.clone()) {
                        immediate.push(future);
                    }
                }
                Some(window) => Self::schedule_debounced(entry, window, args.clone()),
            }
        }

        let handles = if immediate.is_empty() {
            Vec::new()
        } else {
            vec![Self::deliver_in_order(event.to_string(), immediate)]
        };

        self.record(event, origin, delivered);

        if origin == EventOrigin::Main {
            self.send_to_all_views(event, &args);
        }

        PublishReceipt {
            event: event.to_string(),
            delivered,
            handles,
        }
    }

    /// Send to one renderer view without local delivery.
    pub fn send_to_view(&self, view: ViewId, event: &str, args: &[Value]) {
        let Some(bridge) = self.current_bridge() else {
            return;
        };
        if let Err(e) = bridge.send(view, event, args) {
            log::warn!("[BUS] failed to send {} to {}: {}", event, view, e);
        }
    }

    /// Send to every renderer view without local delivery.
    pub fn send_to_all_views(&self, event: &str, args: &[Value]) {
        let Some(bridge) = self.current_bridge() else {
            return;
        };
        for view in bridge.views() {
            if let Err(e) = bridge.send(view, event, args) {
                log::warn!("[BUS] failed to send {} to {}: {}", event, view, e);
            }
        }
    }

    fn current_bridge(&self) -> Option<Arc<dyn RendererBridge>> {
        self.bridge
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Call the handler. Its future has not been polled yet.
    fn start(entry: &SubscriptionEntry, args: EventArgs) -> Option<HandlerFuture> {
        if entry.removed.load(Ordering::SeqCst) {
            return None;
        }
        let handler = Arc::clone(&entry.handler);
        match catch_unwind(AssertUnwindSafe(|| handler(args))) {
            Ok(future) => Some(future),
            Err(_) => {
                log::error!("[BUS] handler for {} panicked", entry.event);
                None
            }
        }
    }

    /// Run the handlers of one publish one after another, each on its own
    /// task so a panic stays contained. Order holds on any runtime flavor.
    fn deliver_in_order(event: String, deliveries: Vec<HandlerFuture>) -> JoinHandle<()> {
        tokio::spawn(async move {
            for future in deliveries {
                Self::report(&event, tokio::spawn(future).await);
            }
        })
    }

    fn invoke(entry: &SubscriptionEntry, args: EventArgs) {
        let Some(future) = Self::start(entry, args) else {
            return;
        };
        let event = entry.event.clone();
        tokio::spawn(async move {
            Self::report(&event, tokio::spawn(future).await);
        });
    }

    fn report(event: &str, outcome: Result<AppResult<()>, JoinError>) {
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::error!("[BUS] handler for {} failed: {}", event, e),
            Err(e) if e.is_panic() => log::error!("[BUS] handler for {} panicked", event),
            Err(_) => {}
        }
    }

    fn schedule_debounced(entry: &Arc<SubscriptionEntry>, window: Duration, args: EventArgs) {
        let mut pending = entry.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let weak = Arc::downgrade(entry);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(entry) = weak.upgrade() {
                // Detached so that a later reset cannot abort a running handler.
                Self::invoke(&entry, args);
            }
        }));
    }

    fn record(&self, event: &str, origin: EventOrigin, delivered: usize) {
        log::trace!("[EVENT] {} from {} | {} deliveries", event, origin, delivered);

        let mut log = self.event_log.write().unwrap_or_else(PoisonError::into_inner);
        if log.len() == EVENT_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(EventLogEntry {
            event: event.to_string(),
            origin,
            delivered,
            occurred_at: Utc::now(),
        });
    }

    /// Get the event log (for debugging)
    pub fn get_event_log(&self) -> Vec<EventLogEntry> {
        self.event_log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Clear the event log
    pub fn clear_event_log(&self) {
        self.event_log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Get the number of live subscriptions for an event name
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// Make EventBus cloneable (shared reference)
impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            subscriptions: Arc::clone(&self.subscriptions),
            bridge: Arc::clone(&self.bridge),
            event_log: Arc::clone(&self.event_log),
        }
    }
}
