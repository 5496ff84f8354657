// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node canvas seam.
//!
//! The canvas owns node, pin and link identities across frames. Widgets open
//! node and pin regions on it while laying out, and read the interactions
//! the user started on it (link drags, deletions) once per frame.

use crate::draw::DrawList;
use crate::ids::{LinkId, NodeId, PinId};
use crate::layout::LayoutContext;
use crate::pin::PinKind;
use egui::{Color32, Margin, Vec2};
use serde::{Deserialize, Serialize};

/// Visual style of nodes on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasStyle {
    /// Space between a node's border and its content
    pub node_padding: Margin,
    /// Corner radius of node boxes
    pub node_rounding: f32,
    /// Width of the node border
    pub node_border_width: f32,
    /// Node body fill
    pub node_background: Color32,
    /// Node border color
    pub node_border: Color32,
    /// Width of link curves
    pub link_thickness: f32,
}

impl Default for CanvasStyle {
    fn default() -> Self {
        Self {
            node_padding: Margin::same(8.0),
            node_rounding: 12.0,
            node_border_width: 1.5,
            node_background: Color32::from_rgba_unmultiplied(32, 32, 32, 200),
            node_border: Color32::from_rgba_unmultiplied(255, 255, 255, 96),
            link_thickness: 3.0,
        }
    }
}

/// A temporary style override
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleVar {
    /// Override [`CanvasStyle::node_padding`]
    NodePadding(Margin),
    /// Override [`CanvasStyle::node_rounding`]
    NodeRounding(f32),
    /// Override [`CanvasStyle::node_border_width`]
    NodeBorderWidth(f32),
}

impl StyleVar {
    /// Apply the override to `style`
    pub fn apply(self, style: &mut CanvasStyle) {
        match self {
            Self::NodePadding(padding) => style.node_padding = padding,
            Self::NodeRounding(rounding) => style.node_rounding = rounding,
            Self::NodeBorderWidth(width) => style.node_border_width = width,
        }
    }
}

/// A link the user asked to delete, with its end pins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedLink {
    /// The link
    pub link: LinkId,
    /// Pin the link starts at
    pub start: PinId,
    /// Pin the link ends at
    pub end: PinId,
}

/// Spatial node/pin/link service the widgets draw into.
///
/// Create and delete queries follow the same protocol: `begin_*` opens the
/// frame's session and says whether anything is pending, the `query_*`
/// methods fetch a candidate, `accept_*`/`reject_*` resolve the last one
/// fetched, and `end_*` closes the session. A create session has at most one
/// candidate per frame; each delete query moves on to the next candidate.
pub trait NodeCanvas {
    /// Push a style override; it stays until popped
    fn push_style_var(&mut self, var: StyleVar);

    /// Pop the last `count` style overrides
    fn pop_style_var(&mut self, count: usize);

    /// Effective style with every pushed override applied
    fn style(&self) -> &CanvasStyle;

    /// Open the region of node `id`; layout that follows is its content
    fn begin_node(&mut self, layout: &mut dyn LayoutContext, id: NodeId);

    /// Close the open node region
    fn end_node(&mut self, layout: &mut dyn LayoutContext);

    /// Open the interactive region of pin `id`. `pivot` is the anchor as a
    /// fraction of the pin's rectangle.
    fn begin_pin(&mut self, layout: &mut dyn LayoutContext, id: PinId, kind: PinKind, pivot: Vec2);

    /// Close the open pin region
    fn end_pin(&mut self, layout: &mut dyn LayoutContext);

    /// Draw list rendered behind the content of node `id`
    fn node_background_draw_list(&mut self, id: NodeId) -> &mut DrawList;

    /// Open the create session; true if the user is creating something
    fn begin_create(&mut self) -> bool;

    /// Pins of a link being dragged between two pins
    fn query_new_link(&mut self) -> Option<(PinId, PinId)>;

    /// Pin a link was dragged from onto empty canvas
    fn query_new_node(&mut self) -> Option<PinId>;

    /// Accept the current create candidate
    fn accept_new_item(&mut self) -> bool;

    /// Reject the current create candidate
    fn reject_new_item(&mut self);

    /// Close the create session
    fn end_create(&mut self);

    /// Open the delete session; true if the user is deleting something
    fn begin_delete(&mut self) -> bool;

    /// Move to the next link pending deletion
    fn query_deleted_link(&mut self) -> Option<DeletedLink>;

    /// Move to the next node pending deletion
    fn query_deleted_node(&mut self) -> Option<NodeId>;

    /// Accept the current delete candidate. For nodes, `delete_dependencies`
    /// also queues the links attached to it.
    fn accept_deleted_item(&mut self, delete_dependencies: bool) -> bool;

    /// Keep the current delete candidate
    fn reject_deleted_item(&mut self);

    /// Close the delete session
    fn end_delete(&mut self);
}
