use serde::{Deserialize, Serialize};

use edgesim_network::NetworkConfig;

/// Scenario of the demo, read from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Time after which no new tasks are generated.
    pub duration: f64,
    pub devices: usize,
    pub edge_datacenters: usize,
    /// Mean interval between tasks of a single device.
    pub task_interval: f64,
    /// Probability of offloading a task to the cloud instead of the nearest edge datacenter.
    pub cloud_share: f64,
    pub request_size: f64,
    pub input_size: f64,
    pub container_size: f64,
    pub result_size: f64,
    pub execution_time: f64,
    /// Interval between device moves, zero disables mobility.
    pub mobility_interval: f64,
    /// Time when the first device fails, if any.
    pub device_failure_time: Option<f64>,
    pub network: NetworkConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            duration: 100.,
            devices: 10,
            edge_datacenters: 2,
            task_interval: 10.,
            cloud_share: 0.3,
            request_size: 8.,
            input_size: 4000.,
            container_size: 20000.,
            result_size: 800.,
            execution_time: 2.,
            mobility_interval: 5.,
            device_failure_time: None,
            network: NetworkConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_file(file_name: &str) -> Self {
        let config: ScenarioConfig = serde_yaml::from_str(
            &std::fs::read_to_string(file_name).unwrap_or_else(|_| panic!("Can't read file {}", file_name)),
        )
        .unwrap_or_else(|err| panic!("Can't parse YAML from file {}: {}", file_name, err));
        assert!(config.devices > 0, "At least one device is required");
        assert!(config.edge_datacenters > 0, "At least one edge datacenter is required");
        assert!(config.task_interval > 0., "Task interval must be positive");
        config
    }
}
