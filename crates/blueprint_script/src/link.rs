// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for blueprints.

use crate::node::NodeId;
use crate::pin::PinId;
use serde::{Deserialize, Serialize};

/// Unique identifier for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub u32);

/// A link from an output pin to an input pin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Unique link ID
    pub id: LinkId,
    /// Source node ID
    pub from_node: NodeId,
    /// Source (output) pin ID
    pub from_pin: PinId,
    /// Target node ID
    pub to_node: NodeId,
    /// Target (input) pin ID
    pub to_pin: PinId,
}

impl Link {
    /// Check if this link involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }

    /// Check if this link involves a specific pin
    pub fn involves_pin(&self, pin_id: PinId) -> bool {
        self.from_pin == pin_id || self.to_pin == pin_id
    }
}
