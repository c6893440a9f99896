//! Current attachment of nodes to access points.
//!
//! Two transfers compete for the same local link when some of their parties are attached to the same
//! access point. Mobile devices change their attachment over time, so the engine asks the location model
//! anew on every progress update instead of remembering the groups.

use rustc_hash::FxHashMap;

use crate::node::NodeId;

/// Source of current node attachments.
pub trait LocationModel {
    /// Returns the access point the node is attached to at the given time.
    ///
    /// Access points are identified by node ids. A node that is not attached anywhere is its own access point.
    fn attachment(&self, node: NodeId, time: f64) -> NodeId;
}

/// Location model where nodes never move and every node is its own access point.
///
/// With this model two transfers share a local link only if they have a party in common.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticLocation;

impl LocationModel for StaticLocation {
    fn attachment(&self, node: NodeId, _time: f64) -> NodeId {
        node
    }
}

/// Explicit mapping of nodes to access points, updated by a mobility model between progress updates.
#[derive(Clone, Debug, Default)]
pub struct AccessPointMap {
    attachments: FxHashMap<NodeId, NodeId>,
}

impl AccessPointMap {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the node to the access point, replacing the previous attachment.
    pub fn attach(&mut self, node: NodeId, access_point: NodeId) {
        self.attachments.insert(node, access_point);
    }

    /// Detaches the node, after which it is its own access point again.
    pub fn detach(&mut self, node: NodeId) {
        self.attachments.remove(&node);
    }

    /// Returns the access point the node is explicitly attached to.
    pub fn get(&self, node: NodeId) -> Option<NodeId> {
        self.attachments.get(&node).copied()
    }
}

impl LocationModel for AccessPointMap {
    fn attachment(&self, node: NodeId, _time: f64) -> NodeId {
        self.get(node).unwrap_or(node)
    }
}
