//! Relay configuration.
//!
//! Both values are fixed for the life of the process. [`RelayConfig::default`]
//! carries the literal constants from [`crate::defaults`]; the builder methods
//! exist for hosts that embed the relay and for tests.

use crate::defaults::{DEFAULT_ALLOW_LIST, DEFAULT_FORWARD_TARGET};
use crate::error::{ConfigError, Result};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Immutable set of field names eligible for forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAllowList {
    fields: HashSet<String>,
}

impl FieldAllowList {
    /// The allow-list shipped with the relay.
    pub fn reference() -> Self {
        DEFAULT_ALLOW_LIST.iter().copied().collect()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FieldAllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Base URL of the secondary collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget(String);

impl ForwardTarget {
    pub fn new(target: impl Into<String>) -> Self {
        Self(target.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the target is an absolute http(s) URL without a query or
    /// fragment.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ConfigError::InvalidTarget {
            target: self.0.clone(),
            reason,
        };

        let url = Url::parse(&self.0).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(invalid(format!("unsupported scheme '{}'", other))),
        }
        if url.query().is_some() {
            return Err(invalid("target must not carry a query string".to_string()));
        }
        if url.fragment().is_some() {
            return Err(invalid("target must not carry a fragment".to_string()));
        }
        Ok(())
    }
}

impl Default for ForwardTarget {
    fn default() -> Self {
        Self::new(DEFAULT_FORWARD_TARGET)
    }
}

impl fmt::Display for ForwardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration of a beacon forwarder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub target: ForwardTarget,
    /// `None` forwards every field.
    pub allow_list: Option<FieldAllowList>,
}

impl RelayConfig {
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = ForwardTarget::new(target);
        self
    }

    pub fn with_allow_list(mut self, allow_list: FieldAllowList) -> Self {
        self.allow_list = Some(allow_list);
        self
    }

    /// Forward every field of every beacon.
    pub fn unfiltered(mut self) -> Self {
        self.allow_list = None;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.target.validate()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            target: ForwardTarget::default(),
            allow_list: Some(FieldAllowList::reference()),
        }
    }
}
