//! Classification of transfers by the links they occupy.

use crate::location::LocationModel;
use crate::node::{NodeId, NodeTable};
use crate::transfer::{TaskRef, Transfer, TransferKind};

/// Links occupied by a transfer during one progress update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scope {
    /// Access points of the origin, orchestrator and destination.
    pub attachments: [NodeId; 3],
    /// Whether the transfer also crosses the WAN.
    pub uses_wan: bool,
}

impl Scope {
    /// Returns true if both transfers go through the same local link.
    pub fn shares_local_link(&self, other: &Scope) -> bool {
        self.attachments.iter().any(|ap| other.attachments.contains(ap))
    }
}

/// Decides which transfers contend for the same links.
///
/// Built for a single progress update: it sees node attachments as of that moment.
pub struct LocalityClassifier<'a> {
    nodes: &'a NodeTable,
    location: &'a dyn LocationModel,
    time: f64,
}

impl<'a> LocalityClassifier<'a> {
    /// Creates a classifier for the given time.
    pub fn new(nodes: &'a NodeTable, location: &'a dyn LocationModel, time: f64) -> Self {
        Self { nodes, location, time }
    }

    /// Returns the links used by the transfer.
    pub fn classify(&self, transfer: &Transfer) -> Scope {
        let task = transfer.task();
        Scope {
            attachments: task.parties().map(|node| self.location.attachment(node, self.time)),
            uses_wan: self.uses_wide_area(task, transfer.kind()),
        }
    }

    /// Returns true if the two transfers go through the same local link.
    pub fn shares_local_link(&self, a: &Transfer, b: &Transfer) -> bool {
        self.classify(a).shares_local_link(&self.classify(b))
    }

    /// Returns true if a transfer of the given kind for the task crosses the WAN.
    ///
    /// This is the case when the destination or the orchestrator is remote, and for container fetches
    /// also when the registry is remote or not specified.
    pub fn uses_wide_area(&self, task: &TaskRef, kind: TransferKind) -> bool {
        let remote_registry = kind == TransferKind::ContainerFetch
            && task.registry.map_or(true, |registry| self.nodes.is_remote(registry));
        self.nodes.is_remote(task.destination) || remote_registry || self.nodes.is_remote(task.orchestrator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{AccessPointMap, StaticLocation};
    use crate::node::NodeTier;

    struct Setup {
        nodes: NodeTable,
        dev1: NodeId,
        dev2: NodeId,
        dev3: NodeId,
        edge: NodeId,
        cloud: NodeId,
    }

    fn setup() -> Setup {
        let mut nodes = NodeTable::new();
        let dev1 = nodes.add("dev1", NodeTier::Device);
        let dev2 = nodes.add("dev2", NodeTier::Device);
        let dev3 = nodes.add("dev3", NodeTier::Device);
        let edge = nodes.add("edge", NodeTier::Edge);
        let cloud = nodes.add("cloud", NodeTier::Cloud);
        Setup {
            nodes,
            dev1,
            dev2,
            dev3,
            edge,
            cloud,
        }
    }

    fn transfer(id: u64, origin: NodeId, orchestrator: NodeId, destination: NodeId, kind: TransferKind) -> Transfer {
        let task = TaskRef {
            task_id: id,
            origin,
            orchestrator,
            destination,
            registry: None,
            notify: 0,
        };
        Transfer::new(id, task, 10., kind, 0.)
    }

    #[test]
    fn common_party_means_shared_link() {
        let s = setup();
        let a = transfer(0, s.dev1, s.dev1, s.edge, TransferKind::OutboundTask);
        let b = transfer(1, s.dev2, s.dev2, s.edge, TransferKind::OutboundTask);
        let c = transfer(2, s.dev3, s.dev3, s.dev3, TransferKind::OutboundTask);
        let classifier = LocalityClassifier::new(&s.nodes, &StaticLocation, 0.);
        assert!(classifier.shares_local_link(&a, &b));
        assert!(classifier.shares_local_link(&b, &a));
        assert!(classifier.shares_local_link(&a, &a));
        assert!(!classifier.shares_local_link(&a, &c));
    }

    #[test]
    fn attachment_to_same_access_point_means_shared_link() {
        let s = setup();
        let a = transfer(0, s.dev1, s.dev1, s.dev1, TransferKind::OutboundTask);
        let b = transfer(1, s.dev2, s.dev2, s.cloud, TransferKind::OutboundTask);
        let mut location = AccessPointMap::new();
        assert!(!LocalityClassifier::new(&s.nodes, &location, 0.).shares_local_link(&a, &b));
        location.attach(s.dev1, s.edge);
        location.attach(s.dev2, s.edge);
        assert!(LocalityClassifier::new(&s.nodes, &location, 1.).shares_local_link(&a, &b));
        location.detach(s.dev2);
        assert!(!LocalityClassifier::new(&s.nodes, &location, 2.).shares_local_link(&a, &b));
    }

    #[test]
    fn wide_area_usage() {
        let s = setup();
        let classifier = LocalityClassifier::new(&s.nodes, &StaticLocation, 0.);
        let local = transfer(0, s.dev1, s.dev1, s.edge, TransferKind::OutboundTask);
        let to_cloud = transfer(1, s.dev1, s.dev1, s.cloud, TransferKind::OutboundTask);
        let cloud_orchestrated = transfer(2, s.dev1, s.cloud, s.edge, TransferKind::ControlRequest);
        assert!(!classifier.classify(&local).uses_wan);
        assert!(classifier.classify(&to_cloud).uses_wan);
        assert!(classifier.classify(&cloud_orchestrated).uses_wan);
    }

    #[test]
    fn container_fetch_without_local_registry_uses_wide_area() {
        let s = setup();
        let classifier = LocalityClassifier::new(&s.nodes, &StaticLocation, 0.);
        let mut task = TaskRef {
            task_id: 0,
            origin: s.dev1,
            orchestrator: s.edge,
            destination: s.edge,
            registry: None,
            notify: 0,
        };
        assert!(classifier.uses_wide_area(&task, TransferKind::ContainerFetch));
        assert!(!classifier.uses_wide_area(&task, TransferKind::OutboundTask));
        task.registry = Some(s.cloud);
        assert!(classifier.uses_wide_area(&task, TransferKind::ContainerFetch));
        task.registry = Some(s.edge);
        assert!(!classifier.uses_wide_area(&task, TransferKind::ContainerFetch));
    }
}
