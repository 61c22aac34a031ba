//! Beacon Relay protocol: payload model, configuration and encoding.
//!
//! A repeated beacon is a single GET request:
//! ```text
//! <forward-target>?<key>=<value>&<key>=<value>...
//! ```
//!
//! - Keys and values are percent-encoded URI components
//! - Pairs appear in the order the host put them on the beacon
//! - With an allow-list, fields outside it are dropped

pub mod config;
pub mod defaults;
pub mod encoding;
pub mod error;
pub mod payload;

pub use config::{FieldAllowList, ForwardTarget, RelayConfig};
pub use encoding::{
    build_query_string, encode_pair, full_url, percent_encode, stringify, JsonUrlSerializer,
    UrlSerializer,
};
pub use error::{ConfigError, TransportUnavailable};
pub use payload::{BeaconPayload, BeaconValue};
