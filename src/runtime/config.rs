//! Tracker configuration.
//!
//! Values come from an optional file and then from `RIDE_TRACKER__*`
//! environment variables, e.g. `RIDE_TRACKER__AVERAGE_SPEED_KPH=25`. Every
//! field has a default, so an empty configuration is a valid one.

use crate::model::PickupKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const ENV_PREFIX: &str = "RIDE_TRACKER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Channel names are `<channel_prefix>.<identity>`.
    pub channel_prefix: String,
    pub immediate_pickup_window_secs: u64,
    pub scheduled_pickup_window_secs: u64,
    pub average_speed_kph: f64,
    /// Polyline scale factor; 1e5 is five decimal places.
    pub polyline_precision: f64,
    /// Bounded mailbox size of the tracking actor.
    pub mailbox_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            channel_prefix: "private-customer".to_string(),
            immediate_pickup_window_secs: 60,
            scheduled_pickup_window_secs: 900,
            average_speed_kph: 30.0,
            polyline_precision: 1e5,
            mailbox_capacity: 32,
        }
    }
}

impl TrackerConfig {
    /// Loads from `path` (any format the `config` crate recognizes, optional)
    /// and the environment, then validates.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        Self::from_builder(builder)
    }

    pub(crate) fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });

        if self.channel_prefix.trim().is_empty() {
            return invalid("channel_prefix", "must not be empty");
        }
        if self.immediate_pickup_window_secs == 0 {
            return invalid("immediate_pickup_window_secs", "must be positive");
        }
        if self.scheduled_pickup_window_secs == 0 {
            return invalid("scheduled_pickup_window_secs", "must be positive");
        }
        if !(self.average_speed_kph.is_finite() && self.average_speed_kph > 0.0) {
            return invalid("average_speed_kph", "must be a positive number");
        }
        if !(self.polyline_precision.is_finite() && self.polyline_precision > 0.0) {
            return invalid("polyline_precision", "must be a positive number");
        }
        if self.mailbox_capacity == 0 {
            return invalid("mailbox_capacity", "must be positive");
        }
        Ok(())
    }

    /// The "driver not found" window for a pickup kind.
    pub fn watchdog_window(&self, kind: PickupKind) -> Duration {
        let secs = match kind {
            PickupKind::Immediate => self.immediate_pickup_window_secs,
            PickupKind::Scheduled => self.scheduled_pickup_window_secs,
        };
        Duration::from_secs(secs)
    }
}
