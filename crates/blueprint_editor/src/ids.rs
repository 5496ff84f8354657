// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas identities for nodes, pins and links.
//!
//! Zero is reserved as the invalid id, matching the "no node" state of a
//! builder between nodes.

use serde::{Deserialize, Serialize};

macro_rules! canvas_id {
    ($(#[$meta:meta])* $name:ident, $script:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// The reserved invalid id
            pub const INVALID: Self = Self(0);

            /// Whether this is a real id
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl From<$script> for $name {
            fn from(id: $script) -> Self {
                Self(u64::from(id.0))
            }
        }
    };
}

canvas_id!(
    /// Canvas identity of a node
    NodeId,
    blueprint_script::NodeId
);

canvas_id!(
    /// Canvas identity of a pin
    PinId,
    blueprint_script::PinId
);

canvas_id!(
    /// Canvas identity of a link
    LinkId,
    blueprint_script::LinkId
);

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for PinId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
