//! Engine Configuration
//!
//! `TreeEngineConfig` holds the few knobs the engine exposes. It is built with
//! `Default`, deserialized from the host's settings, or read from the environment,
//! and is validated before a [`TreeService`](crate::services::TreeService) accepts it.
//!
//! # Environment Variables
//!
//! - `CATALOG_ROUTE_PREFIX`: prefix of breadcrumb route names (default: `app`)
//! - `CATALOG_EVENT_CHANNEL_CAPACITY`: domain event buffer size (default: 128)

use serde::{Deserialize, Serialize};
use std::env;

/// Default prefix for breadcrumb route names (`app_collection_show`, ...)
pub const DEFAULT_ROUTE_PREFIX: &str = "app";

/// Default broadcast buffer for domain events
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

pub const ROUTE_PREFIX_ENV: &str = "CATALOG_ROUTE_PREFIX";
pub const EVENT_CHANNEL_CAPACITY_ENV: &str = "CATALOG_EVENT_CHANNEL_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeEngineConfig {
    /// Prefix of breadcrumb route names
    pub route_prefix: String,

    /// Number of domain events buffered for slow subscribers
    pub event_channel_capacity: usize,
}

impl Default for TreeEngineConfig {
    fn default() -> Self {
        Self {
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl TreeEngineConfig {
    /// Build a config from environment variables, falling back to defaults for
    /// unset or unparsable values
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let route_prefix = env::var(ROUTE_PREFIX_ENV)
            .ok()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.route_prefix);

        let event_channel_capacity = match env::var(EVENT_CHANNEL_CAPACITY_ENV) {
            Ok(raw) => raw.trim().parse::<usize>().unwrap_or_else(|_| {
                tracing::warn!(
                    "Ignoring invalid {}='{}', using {}",
                    EVENT_CHANNEL_CAPACITY_ENV,
                    raw,
                    defaults.event_channel_capacity
                );
                defaults.event_channel_capacity
            }),
            Err(_) => defaults.event_channel_capacity,
        };

        Self {
            route_prefix,
            event_channel_capacity,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.route_prefix.trim().is_empty() {
            return Err("route_prefix cannot be empty".to_string());
        }

        if self
            .route_prefix
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '_'))
        {
            return Err(format!(
                "route_prefix '{}' may only contain ASCII letters, digits and '_'",
                self.route_prefix
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err("event_channel_capacity must be greater than 0".to_string());
        }

        Ok(())
    }
}
