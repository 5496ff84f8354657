// SPDX-License-Identifier: MIT OR Apache-2.0
//! Create and delete query guards.
//!
//! [`ItemBuilder`] and [`ItemDeleter`] open the canvas create/delete session
//! for the current frame and close it when dropped. Each pending item is
//! handed out as a record that must be resolved with exactly one call to
//! `accept` or `reject`. A record dropped without either is left to the
//! canvas, which keeps the item pending.

use crate::canvas::NodeCanvas;
use crate::ids::{LinkId, NodeId, PinId};

/// Pending-creation query for one frame
pub struct ItemBuilder<'c, C: NodeCanvas + ?Sized> {
    canvas: &'c mut C,
    active: bool,
}

impl<'c, C: NodeCanvas + ?Sized> ItemBuilder<'c, C> {
    /// Open the create session on `canvas`
    pub fn new(canvas: &'c mut C) -> Self {
        let active = canvas.begin_create();
        Self { canvas, active }
    }

    /// Whether the user is creating something this frame
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// A link dragged from a pin and dropped on empty canvas
    pub fn query_new_node(&mut self) -> Option<NewNodeBuilder<'_, C>> {
        if !self.active {
            return None;
        }
        let pin = self.canvas.query_new_node()?;
        Some(NewNodeBuilder {
            canvas: &mut *self.canvas,
            pin,
            resolved: false,
        })
    }

    /// A link dragged between two pins
    pub fn query_new_link(&mut self) -> Option<NewLinkBuilder<'_, C>> {
        if !self.active {
            return None;
        }
        let (start, end) = self.canvas.query_new_link()?;
        Some(NewLinkBuilder {
            canvas: &mut *self.canvas,
            start,
            end,
            resolved: false,
        })
    }
}

impl<C: NodeCanvas + ?Sized> Drop for ItemBuilder<'_, C> {
    fn drop(&mut self) {
        self.canvas.end_create();
    }
}

/// A request to create a node from the link dragged out of `pin`
pub struct NewNodeBuilder<'b, C: NodeCanvas + ?Sized> {
    canvas: &'b mut C,
    /// Pin the link was dragged from
    pub pin: PinId,
    resolved: bool,
}

impl<C: NodeCanvas + ?Sized> NewNodeBuilder<'_, C> {
    /// Accept; returns true once the user released the drag
    pub fn accept(mut self) -> bool {
        self.resolved = true;
        self.canvas.accept_new_item()
    }

    /// Reject the request
    pub fn reject(mut self) {
        self.resolved = true;
        self.canvas.reject_new_item();
    }
}

impl<C: NodeCanvas + ?Sized> Drop for NewNodeBuilder<'_, C> {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::trace!(pin = ?self.pin, "new node request left unresolved");
        }
    }
}

/// A request to link `start` to `end`
pub struct NewLinkBuilder<'b, C: NodeCanvas + ?Sized> {
    canvas: &'b mut C,
    /// Pin the drag started at
    pub start: PinId,
    /// Pin under the cursor
    pub end: PinId,
    resolved: bool,
}

impl<C: NodeCanvas + ?Sized> NewLinkBuilder<'_, C> {
    /// Accept; returns true once the user released the drag
    pub fn accept(mut self) -> bool {
        self.resolved = true;
        self.canvas.accept_new_item()
    }

    /// Reject, typically because the pins cannot be linked
    pub fn reject(mut self) {
        self.resolved = true;
        self.canvas.reject_new_item();
    }
}

impl<C: NodeCanvas + ?Sized> Drop for NewLinkBuilder<'_, C> {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::trace!(start = ?self.start, end = ?self.end, "new link request left unresolved");
        }
    }
}

/// Pending-deletion query for one frame
pub struct ItemDeleter<'c, C: NodeCanvas + ?Sized> {
    canvas: &'c mut C,
    active: bool,
}

impl<'c, C: NodeCanvas + ?Sized> ItemDeleter<'c, C> {
    /// Open the delete session on `canvas`
    pub fn new(canvas: &'c mut C) -> Self {
        let active = canvas.begin_delete();
        Self { canvas, active }
    }

    /// Whether the user is deleting something this frame
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Next node pending deletion
    pub fn query_deleted_node(&mut self) -> Option<NodeDeleter<'_, C>> {
        if !self.active {
            return None;
        }
        let node = self.canvas.query_deleted_node()?;
        Some(NodeDeleter {
            canvas: &mut *self.canvas,
            node,
            resolved: false,
        })
    }

    /// Next link pending deletion
    pub fn query_deleted_link(&mut self) -> Option<LinkDeleter<'_, C>> {
        if !self.active {
            return None;
        }
        let deleted = self.canvas.query_deleted_link()?;
        Some(LinkDeleter {
            canvas: &mut *self.canvas,
            link: deleted.link,
            start: deleted.start,
            end: deleted.end,
            resolved: false,
        })
    }
}

impl<C: NodeCanvas + ?Sized> Drop for ItemDeleter<'_, C> {
    fn drop(&mut self) {
        self.canvas.end_delete();
    }
}

/// A node the user asked to delete
pub struct NodeDeleter<'b, C: NodeCanvas + ?Sized> {
    canvas: &'b mut C,
    /// The node
    pub node: NodeId,
    resolved: bool,
}

impl<C: NodeCanvas + ?Sized> NodeDeleter<'_, C> {
    /// Accept, also deleting every link attached to the node
    pub fn accept(self) -> bool {
        self.accept_with(true)
    }

    /// Accept; `delete_links` controls whether attached links go too
    pub fn accept_with(mut self, delete_links: bool) -> bool {
        self.resolved = true;
        self.canvas.accept_deleted_item(delete_links)
    }

    /// Keep the node
    pub fn reject(mut self) {
        self.resolved = true;
        self.canvas.reject_deleted_item();
    }
}

impl<C: NodeCanvas + ?Sized> Drop for NodeDeleter<'_, C> {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::trace!(node = ?self.node, "node deletion left unresolved");
        }
    }
}

/// A link the user asked to delete
pub struct LinkDeleter<'b, C: NodeCanvas + ?Sized> {
    canvas: &'b mut C,
    /// The link
    pub link: LinkId,
    /// Pin the link starts at
    pub start: PinId,
    /// Pin the link ends at
    pub end: PinId,
    resolved: bool,
}

impl<C: NodeCanvas + ?Sized> LinkDeleter<'_, C> {
    /// Accept the deletion
    pub fn accept(mut self) -> bool {
        self.resolved = true;
        self.canvas.accept_deleted_item(false)
    }

    /// Keep the link
    pub fn reject(mut self) {
        self.resolved = true;
        self.canvas.reject_deleted_item();
    }
}

impl<C: NodeCanvas + ?Sized> Drop for LinkDeleter<'_, C> {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::trace!(link = ?self.link, "link deletion left unresolved");
        }
    }
}
