//! Beacon Relay
//!
//! Repeats beacons emitted by a page-instrumentation host to a second
//! collection endpoint as a one-pixel GET request.
//!
//! ```no_run
//! use beacon_relay::{BeaconForwarder, HostBus, PixelTransportFactory};
//! use beacon_protocol::RelayConfig;
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let bus = Arc::new(HostBus::new());
//! let (forwarder, relay_loop) = BeaconForwarder::new(
//!     bus.clone(),
//!     RelayConfig::default(),
//!     Arc::new(PixelTransportFactory::new()),
//! );
//! forwarder.initialize();
//! tokio::spawn(relay_loop.run());
//! # }
//! ```

pub mod bus;
pub mod forwarder;
pub mod registry;
pub mod replay;
pub mod transport;

pub use bus::{BeaconHandler, EventBus, HostBus, SubscriberContext};
pub use forwarder::{BeaconForwarder, ForwardLoop, RelayOutcome, RelayStats};
pub use registry::{PluginRegistry, RegistryError};
pub use replay::{replay_lines, ReplaySummary};
pub use transport::{PixelTransport, PixelTransportFactory, Transport, TransportFactory};
