//! Transfer records.

use serde::Serialize;

use edgesim_core::Id;

use crate::node::NodeId;

/// Unique transfer id.
pub type TransferId = u64;

/// The task a transfer belongs to, as seen by the network.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskRef {
    /// Task id assigned by the task generator.
    pub task_id: u64,
    /// Device that created the task.
    pub origin: NodeId,
    /// Node that makes the placement decision for the task.
    pub orchestrator: NodeId,
    /// Node the task was offloaded to.
    pub destination: NodeId,
    /// Registry the task container is pulled from, if any.
    pub registry: Option<NodeId>,
    /// Simulation component that receives the completion events.
    pub notify: Id,
}

impl TaskRef {
    /// Returns the node playing the given role for this task.
    pub fn party(&self, party: Party) -> NodeId {
        match party {
            Party::Origin => self.origin,
            Party::Orchestrator => self.orchestrator,
            Party::Destination => self.destination,
        }
    }

    /// Returns the parties relevant for local link sharing: origin, orchestrator and destination.
    pub fn parties(&self) -> [NodeId; 3] {
        [self.origin, self.orchestrator, self.destination]
    }

    /// Returns true if the node takes part in the task, including as its container registry.
    pub fn involves(&self, node: NodeId) -> bool {
        self.parties().contains(&node) || self.registry == Some(node)
    }
}

/// Role of a node with respect to a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Party {
    /// Device that created the task.
    Origin,
    /// Orchestrating node.
    Orchestrator,
    /// Offloading destination.
    Destination,
}

/// What a transfer carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TransferKind {
    /// Task input sent to the offloading destination.
    OutboundTask,
    /// Task container pulled by the destination from a registry.
    ContainerFetch,
    /// Execution result returned to the origin device.
    ResultToDevice,
    /// Execution result returned to the orchestrator.
    ResultToOrchestrator,
    /// Offloading request sent from the device to the orchestrator.
    ControlRequest,
}

/// Downstream event produced when a transfer completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CompletionAction {
    /// The task can be executed at the receiver.
    TaskReady,
    /// The result reached the receiver.
    ResultDelivered,
    /// The request reached the orchestrator.
    RequestDelivered,
}

/// Whether the completion event is delayed by the WAN propagation delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Propagation {
    /// Delayed if the transfer used the WAN in its last update.
    WideAreaIfUsed,
    /// Delivered immediately.
    Immediate,
}

/// Completion behaviour of a transfer kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    /// Produced event.
    pub action: CompletionAction,
    /// The party receiving the data.
    pub receiver: Party,
    /// Delay policy.
    pub propagation: Propagation,
}

impl TransferKind {
    /// All transfer kinds.
    pub const ALL: [TransferKind; 5] = [
        TransferKind::OutboundTask,
        TransferKind::ContainerFetch,
        TransferKind::ResultToDevice,
        TransferKind::ResultToOrchestrator,
        TransferKind::ControlRequest,
    ];

    /// Returns the completion behaviour of the kind.
    pub const fn completion(self) -> Completion {
        use CompletionAction::*;
        use Party::*;
        use Propagation::*;
        let (action, receiver, propagation) = match self {
            TransferKind::OutboundTask => (TaskReady, Destination, WideAreaIfUsed),
            TransferKind::ContainerFetch => (TaskReady, Destination, WideAreaIfUsed),
            TransferKind::ResultToDevice => (ResultDelivered, Origin, WideAreaIfUsed),
            TransferKind::ResultToOrchestrator => (ResultDelivered, Orchestrator, WideAreaIfUsed),
            // TODO: revisit once remote orchestrators are modelled, requests to the cloud skip the WAN delay now
            TransferKind::ControlRequest => (RequestDelivered, Orchestrator, Immediate),
        };
        Completion {
            action,
            receiver,
            propagation,
        }
    }
}

/// Lifecycle state of a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TransferState {
    /// Submitted, waiting for the next progress update.
    Pending,
    /// Taking part in bandwidth allocation.
    Active,
    /// All data was moved.
    Completed,
    /// Removed before completion, e.g. because one of its nodes failed.
    Abandoned,
}

/// State of one in-flight data movement.
#[derive(Clone, Debug)]
pub struct Transfer {
    id: TransferId,
    task: TaskRef,
    kind: TransferKind,
    size: f64,
    remaining_size: f64,
    lan_bandwidth: f64,
    wan_bandwidth: f64,
    uses_wan: bool,
    lan_usage_time: f64,
    wan_usage_time: f64,
    bandwidth_sum: f64,
    bandwidth_samples: u64,
    state: TransferState,
    submit_time: f64,
    finish_time: Option<f64>,
}

impl Transfer {
    pub(crate) fn new(id: TransferId, task: TaskRef, size: f64, kind: TransferKind, submit_time: f64) -> Self {
        Self {
            id,
            task,
            kind,
            size,
            remaining_size: size,
            lan_bandwidth: 0.,
            wan_bandwidth: 0.,
            uses_wan: false,
            lan_usage_time: 0.,
            wan_usage_time: 0.,
            bandwidth_sum: 0.,
            bandwidth_samples: 0,
            state: TransferState::Pending,
            submit_time,
            finish_time: None,
        }
    }

    /// Transfer id.
    pub fn id(&self) -> TransferId {
        self.id
    }

    /// Task the transfer belongs to.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Transfer kind.
    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    /// Total size.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Size left to move.
    pub fn remaining_size(&self) -> f64 {
        self.remaining_size
    }

    /// LAN capacity assigned in the last update.
    pub fn lan_bandwidth(&self) -> f64 {
        self.lan_bandwidth
    }

    /// WAN capacity assigned in the last update, zero if the WAN was not used.
    pub fn wan_bandwidth(&self) -> f64 {
        self.wan_bandwidth
    }

    /// Whether the transfer crossed the WAN in the last update.
    pub fn uses_wan(&self) -> bool {
        self.uses_wan
    }

    /// Capacity the transfer progressed with in the last update.
    pub fn effective_bandwidth(&self) -> f64 {
        if self.uses_wan {
            self.lan_bandwidth.min(self.wan_bandwidth)
        } else {
            self.lan_bandwidth
        }
    }

    /// Total time the LAN was engaged by the transfer.
    pub fn lan_usage_time(&self) -> f64 {
        self.lan_usage_time
    }

    /// Total time the WAN was engaged by the transfer.
    pub fn wan_usage_time(&self) -> f64 {
        self.wan_usage_time
    }

    /// Mean of effective capacities over all updates, zero before the first one.
    pub fn average_bandwidth(&self) -> f64 {
        if self.bandwidth_samples == 0 {
            0.
        } else {
            self.bandwidth_sum / self.bandwidth_samples as f64
        }
    }

    /// Lifecycle state.
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Time of submission.
    pub fn submit_time(&self) -> f64 {
        self.submit_time
    }

    /// Time of completion or abandonment.
    pub fn finish_time(&self) -> Option<f64> {
        self.finish_time
    }

    /// Returns true if the transfer still takes part in bandwidth allocation.
    pub fn is_active(&self) -> bool {
        matches!(self.state, TransferState::Pending | TransferState::Active)
    }

    pub(crate) fn activate(&mut self) {
        if self.state == TransferState::Pending {
            self.state = TransferState::Active;
        }
    }

    pub(crate) fn assign(&mut self, lan_bandwidth: f64, wan_bandwidth: f64, uses_wan: bool) {
        self.lan_bandwidth = lan_bandwidth;
        self.wan_bandwidth = wan_bandwidth;
        self.uses_wan = uses_wan;
    }

    /// Moves `moved` units of data which took `usage_time` at capacity `bandwidth`.
    pub(crate) fn record_progress(&mut self, moved: f64, usage_time: f64, bandwidth: f64) {
        self.remaining_size = (self.remaining_size - moved).max(0.);
        self.lan_usage_time += usage_time;
        if self.uses_wan {
            self.wan_usage_time += usage_time;
        }
        self.bandwidth_sum += bandwidth;
        self.bandwidth_samples += 1;
    }

    pub(crate) fn finish(&mut self, state: TransferState, time: f64) {
        self.state = state;
        self.finish_time = Some(time);
        if state == TransferState::Completed {
            self.remaining_size = 0.;
        }
    }

    /// Copies the statistics of the transfer for reporting.
    pub fn report(&self) -> TransferReport {
        TransferReport {
            id: self.id,
            task: self.task.clone(),
            kind: self.kind,
            size: self.size,
            moved: self.size - self.remaining_size,
            used_wan: self.uses_wan,
            lan_usage_time: self.lan_usage_time,
            wan_usage_time: self.wan_usage_time,
            average_bandwidth: self.average_bandwidth(),
            state: self.state,
            submit_time: self.submit_time,
            finish_time: self.finish_time,
        }
    }
}

/// Statistics of a transfer kept after it leaves the engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransferReport {
    /// Transfer id.
    pub id: TransferId,
    /// Task the transfer belonged to.
    pub task: TaskRef,
    /// Transfer kind.
    pub kind: TransferKind,
    /// Total size.
    pub size: f64,
    /// Amount of data actually moved.
    pub moved: f64,
    /// Whether the WAN was used in the last update.
    pub used_wan: bool,
    /// Total LAN usage time.
    pub lan_usage_time: f64,
    /// Total WAN usage time.
    pub wan_usage_time: f64,
    /// Mean effective capacity.
    pub average_bandwidth: f64,
    /// Final state.
    pub state: TransferState,
    /// Time of submission.
    pub submit_time: f64,
    /// Time of completion or abandonment.
    pub finish_time: Option<f64>,
}

impl TransferReport {
    /// Node that received the data, according to the transfer kind.
    pub fn receiver(&self) -> NodeId {
        self.task.party(self.kind.completion().receiver)
    }
}
