//! Host event bus seam.
//!
//! The host owns the bus; the forwarder only subscribes to it. [`HostBus`] is
//! an in-process bus for hosts that have none of their own.

use beacon_protocol::BeaconPayload;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Callback invoked synchronously each time a subscribed event fires.
pub type BeaconHandler = Arc<dyn Fn(&BeaconPayload) + Send + Sync>;

/// Identity a handler is bound to when it is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberContext {
    pub name: String,
}

impl SubscriberContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Event bus provided by the host.
pub trait EventBus: Send + Sync {
    /// Register `handler` for `event`.
    ///
    /// `state` is passed through untouched for the host's bookkeeping.
    fn subscribe(
        &self,
        event: &str,
        handler: BeaconHandler,
        state: Option<serde_json::Value>,
        context: SubscriberContext,
    );
}

#[derive(Clone)]
struct Subscription {
    handler: BeaconHandler,
    state: Option<serde_json::Value>,
    context: SubscriberContext,
}

/// In-process event bus. Handlers run on the firing thread, in
/// registration order.
#[derive(Default)]
pub struct HostBus {
    subscriptions: Mutex<HashMap<String, Vec<Subscription>>>,
}

impl HostBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `event`, returning the number of handlers invoked.
    pub fn fire(&self, event: &str, payload: &BeaconPayload) -> usize {
        // Snapshot so handlers may subscribe without deadlocking
        let subscribers = {
            let subscriptions = self
                .subscriptions
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            subscriptions.get(event).cloned().unwrap_or_default()
        };

        for subscription in &subscribers {
            trace!(
                event,
                subscriber = %subscription.context.name,
                has_state = subscription.state.is_some(),
                "Dispatching host event"
            );
            (subscription.handler)(payload);
        }
        subscribers.len()
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(event)
            .map_or(0, Vec::len)
    }
}

impl EventBus for HostBus {
    fn subscribe(
        &self,
        event: &str,
        handler: BeaconHandler,
        state: Option<serde_json::Value>,
        context: SubscriberContext,
    ) {
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(event.to_string())
            .or_default()
            .push(Subscription {
                handler,
                state,
                context,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_fire_reaches_subscribers_in_order() {
        let bus = HostBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(
                "beacon",
                Arc::new(move |_payload: &BeaconPayload| seen.lock().unwrap().push(name)),
                None,
                SubscriberContext::new(name),
            );
        }

        assert_eq!(bus.fire("beacon", &BeaconPayload::new()), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_fire_other_event_is_ignored() {
        let bus = HostBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        bus.subscribe(
            "beacon",
            Arc::new(move |_payload: &BeaconPayload| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            None,
            SubscriberContext::new("test"),
        );

        assert_eq!(bus.fire("page_ready", &BeaconPayload::new()), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count("beacon"), 1);
        assert_eq!(bus.subscriber_count("page_ready"), 0);
    }
}
