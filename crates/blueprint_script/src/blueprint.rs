// SPDX-License-Identifier: MIT OR Apache-2.0
//! Blueprint container holding nodes and links.

use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId, NodeKind};
use crate::pin::{Pin, PinDirection, PinId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A blueprint: nodes, links and the id allocator they share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    /// Blueprint name
    pub name: String,
    /// Last id handed out; nodes, pins and links share one id space
    last_id: u32,
    /// Nodes in the blueprint
    nodes: IndexMap<NodeId, Node>,
    /// Links between pins
    links: IndexMap<LinkId, Link>,
}

impl Blueprint {
    /// Create a new empty blueprint
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_id: 0,
            nodes: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    fn make_id(&mut self) -> u32 {
        self.last_id += 1;
        self.last_id
    }

    /// Create a node of the given kind and add it to the blueprint
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let node = Node::new(kind, || self.make_id());
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and its links
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        self.links.retain(|_, l| !l.involves_node(node_id));
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Find a pin on any node
    pub fn pin(&self, pin_id: PinId) -> Option<&Pin> {
        self.nodes.values().find_map(|n| n.pin(pin_id))
    }

    /// Entry nodes, where execution can start
    pub fn entry_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.kind == NodeKind::Entry)
    }

    /// Check whether two pins could be linked, in either order.
    ///
    /// Returns the pins ordered output first.
    pub fn check_link(&self, a: PinId, b: PinId) -> Result<(&Pin, &Pin), LinkError> {
        let pin_a = self.pin(a).ok_or(LinkError::PinNotFound(a))?;
        let pin_b = self.pin(b).ok_or(LinkError::PinNotFound(b))?;

        if pin_a.node == pin_b.node {
            return Err(LinkError::SelfLoop);
        }

        if pin_a.direction == pin_b.direction {
            return Err(LinkError::SameDirection);
        }

        if !pin_a.can_connect(pin_b) {
            return Err(LinkError::IncompatibleTypes);
        }

        let (from, to) = match pin_a.direction {
            PinDirection::Output => (pin_a, pin_b),
            PinDirection::Input => (pin_b, pin_a),
        };

        for pin in [from, to] {
            if pin.is_exclusive() && self.is_linked(pin.id) {
                return Err(LinkError::PinAlreadyLinked(pin.id));
            }
        }

        // Flow may loop back; data is pulled and must not
        if !from.is_flow() && self.reads_from(from.node, to.node) {
            return Err(LinkError::Cycle);
        }

        Ok((from, to))
    }

    /// Whether `node` pulls data from `source`, directly or through other nodes
    fn reads_from(&self, node: NodeId, source: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![node];

        while let Some(current) = pending.pop() {
            if current == source {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            pending.extend(
                self.links
                    .values()
                    .filter(|l| l.to_node == current)
                    .filter(|l| !self.pin(l.to_pin).is_some_and(Pin::is_flow))
                    .map(|l| l.from_node),
            );
        }
        false
    }

    /// Link two pins.
    ///
    /// The pins may be given in either order; the link always runs from
    /// the output to the input.
    pub fn connect(&mut self, a: PinId, b: PinId) -> Result<LinkId, LinkError> {
        let (from, to) = self.check_link(a, b)?;
        let (from_node, from_pin, to_node, to_pin) = (from.node, from.id, to.node, to.id);
        Ok(self.insert_link(from_node, from_pin, to_node, to_pin))
    }

    fn insert_link(&mut self, from_node: NodeId, from_pin: PinId, to_node: NodeId, to_pin: PinId) -> LinkId {
        let id = LinkId(self.make_id());
        self.links.insert(
            id,
            Link {
                id,
                from_node,
                from_pin,
                to_node,
                to_pin,
            },
        );
        tracing::debug!("Linked {:?} -> {:?} as {:?}", from_pin, to_pin, id);
        id
    }

    /// Link two pins with no checks, as a hand-edited file could
    #[cfg(test)]
    pub(crate) fn link_unchecked(&mut self, from_pin: PinId, to_pin: PinId) -> LinkId {
        let from_node = self.pin(from_pin).map_or(NodeId(0), |p| p.node);
        let to_node = self.pin(to_pin).map_or(NodeId(0), |p| p.node);
        self.insert_link(from_node, from_pin, to_node, to_pin)
    }

    /// Remove a link
    pub fn disconnect(&mut self, link_id: LinkId) -> Option<Link> {
        self.links.shift_remove(&link_id)
    }

    /// Get a link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Get links leaving an output pin
    pub fn links_from(&self, pin_id: PinId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.from_pin == pin_id)
    }

    /// Get the link feeding an input pin
    pub fn link_to(&self, pin_id: PinId) -> Option<&Link> {
        self.links.values().find(|l| l.to_pin == pin_id)
    }

    /// Check whether any link touches a pin
    pub fn is_linked(&self, pin_id: PinId) -> bool {
        self.links.values().any(|l| l.involves_pin(pin_id))
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Deserialize from RON
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

impl Default for Blueprint {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when linking pins
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// Pin not found
    #[error("Pin not found: {0:?}")]
    PinNotFound(PinId),

    /// Both pins are inputs or both are outputs
    #[error("Pins have the same direction")]
    SameDirection,

    /// Incompatible pin types
    #[error("Incompatible pin types")]
    IncompatibleTypes,

    /// Pin only accepts a single link and already has one
    #[error("Pin already linked: {0:?}")]
    PinAlreadyLinked(PinId),

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// The link would make a node read its own output
    #[error("Link would create a data cycle")]
    Cycle,
}
