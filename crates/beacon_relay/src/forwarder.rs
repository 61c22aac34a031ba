//! Beacon forwarder.
//!
//! The forwarder subscribes to the host's `beacon` event. Its handler only
//! captures the payload and queues it; the [`ForwardLoop`] picks queued
//! payloads up afterwards, one at a time and in order, and fires the
//! repeated beacon. Nothing on the host's beacon path waits on the relay.
//!
//! On a current-thread runtime the loop cannot pick up a payload until the
//! task that fired the event yields. On a multi-thread runtime it may start
//! while the handler is still returning.

use crate::bus::{BeaconHandler, EventBus, SubscriberContext};
use crate::registry::{PluginRegistry, RegistryError};
use crate::transport::TransportFactory;
use beacon_protocol::defaults::{BEACON_EVENT, PLUGIN_NAME};
use beacon_protocol::{
    build_query_string, full_url, BeaconPayload, JsonUrlSerializer, RelayConfig,
    TransportUnavailable, UrlSerializer,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Snapshot of relay counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Beacons handed to the forwarder by the host.
    pub received: u64,
    /// Repeated beacons fired.
    pub forwarded: u64,
    /// Beacons dropped because no transport was available.
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct RelayCounters {
    received: AtomicU64,
    forwarded: AtomicU64,
    dropped: AtomicU64,
}

impl RelayCounters {
    fn snapshot(&self) -> RelayStats {
        RelayStats {
            received: self.received.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Result of relaying one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Forwarded { url: String },
    Dropped(TransportUnavailable),
}

/// Repeats host beacons to a second collection endpoint.
pub struct BeaconForwarder {
    bus: Arc<dyn EventBus>,
    queue: mpsc::UnboundedSender<BeaconPayload>,
    initialized: AtomicBool,
    counters: Arc<RelayCounters>,
}

impl BeaconForwarder {
    /// Create a forwarder and the loop that drains its queue.
    ///
    /// Nothing is subscribed until [`BeaconForwarder::initialize`] runs.
    pub fn new(
        bus: Arc<dyn EventBus>,
        config: RelayConfig,
        transports: Arc<dyn TransportFactory>,
    ) -> (Self, ForwardLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(RelayCounters::default());

        let forwarder = Self {
            bus,
            queue: tx,
            initialized: AtomicBool::new(false),
            counters: Arc::clone(&counters),
        };
        let relay_loop = ForwardLoop {
            queue: rx,
            config,
            transports,
            serializer: Arc::new(JsonUrlSerializer),
            counters,
        };
        (forwarder, relay_loop)
    }

    /// Publish a forwarder in `registry` under the plugin name.
    ///
    /// When a forwarder is already installed, it is returned with no loop and
    /// nothing else happens.
    pub fn install(
        registry: &PluginRegistry,
        bus: Arc<dyn EventBus>,
        config: RelayConfig,
        transports: Arc<dyn TransportFactory>,
    ) -> Result<(Arc<Self>, Option<ForwardLoop>), RegistryError> {
        let mut relay_loop = None;
        let (forwarder, created) = registry.install(PLUGIN_NAME, || {
            let (forwarder, pending) = Self::new(bus, config, transports);
            relay_loop = Some(pending);
            forwarder
        })?;
        if !created {
            debug!("{} already installed, skipping", PLUGIN_NAME);
        }
        Ok((forwarder, relay_loop))
    }

    /// Subscribe to the host's beacon event. Only the first call has an effect.
    pub fn initialize(&self) -> &Self {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return self;
        }

        let queue = self.queue.clone();
        let counters = Arc::clone(&self.counters);
        let handler: BeaconHandler = Arc::new(move |payload: &BeaconPayload| {
            counters.received.fetch_add(1, Ordering::Relaxed);
            if queue.send(payload.clone()).is_err() {
                debug!("Relay loop stopped, not repeating beacon");
            }
        });

        self.bus.subscribe(
            BEACON_EVENT,
            handler,
            None,
            SubscriberContext::new(PLUGIN_NAME),
        );
        info!("{} subscribed to '{}'", PLUGIN_NAME, BEACON_EVENT);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// The forwarder has no asynchronous readiness phase.
    pub fn is_complete(&self) -> bool {
        true
    }

    pub fn stats(&self) -> RelayStats {
        self.counters.snapshot()
    }
}

/// Drains queued beacons and fires the repeated requests.
pub struct ForwardLoop {
    queue: mpsc::UnboundedReceiver<BeaconPayload>,
    config: RelayConfig,
    transports: Arc<dyn TransportFactory>,
    serializer: Arc<dyn UrlSerializer>,
    counters: Arc<RelayCounters>,
}

impl ForwardLoop {
    /// Replace the serializer used for structured values.
    pub fn with_serializer(mut self, serializer: Arc<dyn UrlSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Relay beacons until the forwarder and every subscribed handler are gone.
    pub async fn run(mut self) -> RelayStats {
        while let Some(payload) = self.queue.recv().await {
            self.relay(&payload);
        }
        let stats = self.counters.snapshot();
        debug!(
            received = stats.received,
            forwarded = stats.forwarded,
            dropped = stats.dropped,
            "Relay loop finished"
        );
        stats
    }

    /// Relay everything queued so far without waiting for more.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(payload) = self.queue.try_recv() {
            self.relay(&payload);
            processed += 1;
        }
        processed
    }

    /// Build and fire the repeated beacon for one payload.
    pub fn relay(&self, payload: &BeaconPayload) -> RelayOutcome {
        let query = build_query_string(
            payload,
            self.config.allow_list.as_ref(),
            self.serializer.as_ref(),
        );
        let url = full_url(&self.config.target, &query);

        let transport = match self.transports.create() {
            Ok(transport) => transport,
            Err(err) => {
                debug!("{}, not sending a beacon", err);
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                return RelayOutcome::Dropped(err);
            }
        };

        transport.fire(&url);
        self.counters.forwarded.fetch_add(1, Ordering::Relaxed);
        RelayOutcome::Forwarded { url }
    }

    pub fn stats(&self) -> RelayStats {
        self.counters.snapshot()
    }
}
