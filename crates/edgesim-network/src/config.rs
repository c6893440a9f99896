//! Network configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Parameters of the shared LAN and WAN links.
///
/// Sizes are measured in kilobits, bandwidths in kilobits per second and times in seconds.
/// Absent fields of a YAML config take the default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Total capacity of a local link, shared by all transfers colocated at the same access point.
    pub lan_bandwidth: f64,
    /// Total capacity of the wide-area link.
    pub wan_bandwidth: f64,
    /// Interval between progress updates.
    pub update_interval: f64,
    /// One-way propagation delay added to completions of transfers that crossed the WAN.
    pub wan_propagation_delay: f64,
    /// Upper bound of the reported WAN utilization, in percent.
    pub wan_utilization_ceiling: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            lan_bandwidth: 100_000.,
            wan_bandwidth: 20_000.,
            update_interval: 1.,
            wan_propagation_delay: 0.2,
            wan_utilization_ceiling: 100.,
        }
    }
}

impl NetworkConfig {
    /// Parses config from a YAML string and validates it.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: NetworkConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads config from a YAML file and validates it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Checks that all parameters are within their allowed ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("lan_bandwidth", self.lan_bandwidth)?;
        positive("wan_bandwidth", self.wan_bandwidth)?;
        positive("update_interval", self.update_interval)?;
        positive("wan_utilization_ceiling", self.wan_utilization_ceiling)?;
        if !self.wan_propagation_delay.is_finite() || self.wan_propagation_delay < 0. {
            return Err(ConfigError::InvalidParameter {
                param: "wan_propagation_delay",
                value: self.wan_propagation_delay,
                reason: "must be non-negative",
            });
        }
        Ok(())
    }
}

fn positive(param: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            param,
            value,
            reason: "must be positive",
        })
    }
}
