#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod allocator;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod locality;
pub mod location;
pub mod node;
pub mod progress;
pub mod stats;
pub mod transfer;

pub use allocator::{Allocation, BandwidthAllocator};
pub use config::NetworkConfig;
pub use dispatcher::{CompletionDispatcher, RequestDelivered, ResultDelivered, TaskReady};
pub use engine::{NetworkEngine, NodeFailed, ProgressTick, SchedulerState, StopNetwork};
pub use error::ConfigError;
pub use locality::{LocalityClassifier, Scope};
pub use location::{AccessPointMap, LocationModel, StaticLocation};
pub use node::{Node, NodeId, NodeTable, NodeTier};
pub use progress::{Progress, ProgressEngine};
pub use stats::NetworkStats;
pub use transfer::{
    Completion, CompletionAction, Party, Propagation, TaskRef, Transfer, TransferId, TransferKind, TransferReport,
    TransferState,
};
