//! Network parties: devices, datacenters and container registries.

use serde::{Deserialize, Serialize};

/// Unique node id.
pub type NodeId = usize;

/// Placement tier of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeTier {
    /// End-user (possibly mobile) device.
    Device,
    /// Edge datacenter next to an access point.
    Edge,
    /// Fog datacenter reachable over the local network.
    Fog,
    /// Remote cloud datacenter, reachable only over the WAN.
    Cloud,
}

impl NodeTier {
    /// Returns true if reaching a node of this tier requires the wide-area link.
    pub fn is_remote(&self) -> bool {
        matches!(self, NodeTier::Cloud)
    }
}

/// A node known to the network engine.
#[derive(Clone, Debug, Serialize)]
pub struct Node {
    /// Node id.
    pub id: NodeId,
    /// Node name.
    pub name: String,
    /// Node tier.
    pub tier: NodeTier,
    /// False once the node has failed.
    pub alive: bool,
}

/// Registry of nodes, indexed by [`NodeId`].
#[derive(Default)]
pub struct NodeTable {
    nodes: Vec<Node>,
}

impl NodeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new alive node and returns its id.
    pub fn add(&mut self, name: &str, tier: NodeTier) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            name: name.to_owned(),
            tier,
            alive: true,
        });
        id
    }

    /// Returns the node with the given id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Returns true if the node exists and is remote. Unknown nodes are treated as local.
    pub fn is_remote(&self, id: NodeId) -> bool {
        self.nodes.get(id).map_or(false, |node| node.tier.is_remote())
    }

    /// Returns true if the node exists and has not failed.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.get(id).map_or(false, |node| node.alive)
    }

    /// Marks the node as failed. Returns false if it was unknown or already failed.
    pub fn mark_failed(&mut self, id: NodeId) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) if node.alive => {
                node.alive = false;
                true
            }
            _ => false,
        }
    }

    /// Returns all nodes.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no nodes were added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
