// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory node canvas.
//!
//! Features:
//! - Node positions and measured bounds
//! - Pin anchors from the pin rows laid out each frame
//! - Per-node background draw lists
//! - Bezier link curves between pin anchors
//! - Create and delete interactions injected by the host
//! - Style override stack

use crate::canvas::{CanvasStyle, DeletedLink, NodeCanvas, StyleVar};
use crate::draw::DrawList;
use crate::ids::{LinkId, NodeId, PinId};
use crate::layout::LayoutContext;
use crate::pin::PinKind;
use egui::{Color32, Pos2, Rect, Rounding, Shape, Stroke, Vec2};
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};

/// Link visual parameters
const BEZIER_CURVATURE: f32 = 50.0;
const BEZIER_SEGMENTS: usize = 32;

#[derive(Debug)]
struct NodeState {
    position: Pos2,
    bounds: Rect,
    background: DrawList,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            position: Pos2::ZERO,
            // Not laid out yet
            bounds: Rect::NOTHING,
            background: DrawList::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PinState {
    node: NodeId,
    kind: PinKind,
    pivot: Vec2,
    rect: Rect,
}

impl PinState {
    fn anchor(&self) -> Pos2 {
        self.rect.min + self.rect.size() * self.pivot
    }
}

#[derive(Debug, Clone, Copy)]
struct LinkState {
    start: PinId,
    end: PinId,
    color: Color32,
    thickness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Creation {
    Link(PinId, PinId),
    Node(PinId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deletion {
    Node(NodeId),
    Link(DeletedLink),
}

/// Node canvas keeping its state in memory
#[derive(Debug, Default)]
pub struct EditorCanvas {
    base_style: CanvasStyle,
    style: CanvasStyle,
    style_stack: Vec<StyleVar>,
    nodes: IndexMap<NodeId, NodeState>,
    pins: HashMap<PinId, PinState>,
    links: IndexMap<LinkId, LinkState>,
    current_node: Option<NodeId>,
    current_pin: Option<(PinId, PinKind, Vec2)>,
    creation: Option<Creation>,
    deletions: VecDeque<Deletion>,
    deletion: Option<Deletion>,
    /// Candidates handed out this session and left unresolved
    skipped: Vec<Deletion>,
}

impl EditorCanvas {
    /// Create an empty canvas
    pub fn new(style: CanvasStyle) -> Self {
        Self {
            base_style: style,
            style,
            ..Self::default()
        }
    }

    /// Start a frame. Links and node backgrounds are declared anew every
    /// frame; positions, bounds and pin anchors are kept.
    pub fn begin_frame(&mut self) {
        if !self.style_stack.is_empty() {
            tracing::warn!(
                "{} style override(s) left pushed at frame start, discarding them",
                self.style_stack.len()
            );
            self.style_stack.clear();
            self.restyle();
        }
        self.links.clear();
        for node in self.nodes.values_mut() {
            node.background.clear();
        }
    }

    /// Place node `id` with its top-left corner at `position`
    pub fn set_node_position(&mut self, id: NodeId, position: Pos2) {
        self.nodes.entry(id).or_default().position = position;
    }

    /// Top-left corner of node `id`
    pub fn node_position(&self, id: NodeId) -> Option<Pos2> {
        self.nodes.get(&id).map(|node| node.position)
    }

    /// Bounds measured when node `id` was last laid out
    pub fn node_bounds(&self, id: NodeId) -> Option<Rect> {
        self.nodes
            .get(&id)
            .map(|node| node.bounds)
            .filter(|bounds| bounds.is_positive())
    }

    /// Known nodes in creation order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Forget node `id` and its pins
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        self.pins.retain(|_, pin| pin.node != id);
        self.nodes.shift_remove(&id).is_some()
    }

    /// Where links attach to pin `id`
    pub fn pin_anchor(&self, id: PinId) -> Option<Pos2> {
        self.pins.get(&id).map(PinState::anchor)
    }

    /// Kind pin `id` was last laid out with
    pub fn pin_kind(&self, id: PinId) -> Option<PinKind> {
        self.pins.get(&id).map(|pin| pin.kind)
    }

    /// Node pin `id` belongs to
    pub fn pin_node(&self, id: PinId) -> Option<NodeId> {
        self.pins.get(&id).map(|pin| pin.node)
    }

    /// Declare a link for this frame
    pub fn link(&mut self, id: LinkId, start: PinId, end: PinId, color: Color32, thickness: f32) {
        self.links.insert(
            id,
            LinkState {
                start,
                end,
                color,
                thickness,
            },
        );
    }

    /// Number of links declared this frame
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// The user dragged a link from `start` and dropped it on `end`
    pub fn request_link(&mut self, start: PinId, end: PinId) {
        self.creation = Some(Creation::Link(start, end));
    }

    /// The user dragged a link from `pin` and dropped it on empty canvas
    pub fn request_node(&mut self, pin: PinId) {
        self.creation = Some(Creation::Node(pin));
    }

    /// The user deleted node `id`
    pub fn request_delete_node(&mut self, id: NodeId) {
        self.deletions.push_back(Deletion::Node(id));
    }

    /// The user deleted link `id`. Ignored if the link was not declared
    /// this frame.
    pub fn request_delete_link(&mut self, id: LinkId) -> bool {
        let Some(link) = self.links.get(&id) else {
            return false;
        };
        self.deletions.push_back(Deletion::Link(DeletedLink {
            link: id,
            start: link.start,
            end: link.end,
        }));
        true
    }

    /// Whether a create or delete request is waiting
    pub fn has_pending(&self) -> bool {
        self.creation.is_some() || !self.deletions.is_empty()
    }

    /// Shapes for links and node boxes, to be painted under node content
    pub fn shapes(&self) -> Vec<Shape> {
        let mut shapes = Vec::new();

        for link in self.links.values() {
            let (Some(from), Some(to)) = (self.pin_anchor(link.start), self.pin_anchor(link.end)) else {
                continue;
            };
            shapes.push(bezier_link(from, to, Stroke::new(link.thickness, link.color)));
        }

        let style = &self.base_style;
        let rounding = Rounding::same(style.node_rounding);
        for node in self.nodes.values().filter(|node| node.bounds.is_positive()) {
            shapes.push(Shape::rect_filled(node.bounds, rounding, style.node_background));
            shapes.extend(node.background.shapes());
            shapes.push(Shape::rect_stroke(
                node.bounds,
                rounding,
                Stroke::new(style.node_border_width, style.node_border),
            ));
        }

        shapes
    }

    fn restyle(&mut self) {
        let mut style = self.base_style;
        for var in &self.style_stack {
            var.apply(&mut style);
        }
        self.style = style;
    }

    /// Make `deletion` the current candidate, setting aside an unresolved one
    fn hand_out(&mut self, deletion: Deletion) {
        if let Some(previous) = self.deletion.replace(deletion) {
            self.skipped.push(previous);
        }
    }

    fn queue_node_links(&mut self, id: NodeId) {
        let attached: Vec<DeletedLink> = self
            .links
            .iter()
            .filter(|(_, link)| {
                self.pin_node(link.start) == Some(id) || self.pin_node(link.end) == Some(id)
            })
            .map(|(&link, state)| DeletedLink {
                link,
                start: state.start,
                end: state.end,
            })
            .collect();

        for link in attached {
            let queued = Deletion::Link(link);
            if !self.deletions.contains(&queued) {
                self.deletions.push_back(queued);
            }
        }
    }
}

impl NodeCanvas for EditorCanvas {
    fn push_style_var(&mut self, var: StyleVar) {
        self.style_stack.push(var);
        self.restyle();
    }

    fn pop_style_var(&mut self, count: usize) {
        debug_assert!(count <= self.style_stack.len(), "popped more style vars than pushed");
        let keep = self.style_stack.len().saturating_sub(count);
        self.style_stack.truncate(keep);
        self.restyle();
    }

    fn style(&self) -> &CanvasStyle {
        &self.style
    }

    fn begin_node(&mut self, layout: &mut dyn LayoutContext, id: NodeId) {
        debug_assert!(self.current_node.is_none(), "begin_node inside an open node");
        let padding = self.style.node_padding;
        let node = self.nodes.entry(id).or_default();
        layout.set_cursor(node.position + Vec2::new(padding.left, padding.top));
        self.current_node = Some(id);
    }

    fn end_node(&mut self, layout: &mut dyn LayoutContext) {
        let Some(id) = self.current_node.take() else {
            debug_assert!(false, "end_node without begin_node");
            return;
        };
        let padding = self.style.node_padding;
        let content = layout.item_rect();
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.bounds = Rect::from_min_max(
            node.position,
            content.max + Vec2::new(padding.right, padding.bottom),
        );
        layout.add_item(node.bounds);
        tracing::trace!(node = ?id, bounds = ?node.bounds, "end node");
    }

    fn begin_pin(&mut self, _layout: &mut dyn LayoutContext, id: PinId, kind: PinKind, pivot: Vec2) {
        debug_assert!(self.current_pin.is_none(), "begin_pin inside an open pin");
        self.current_pin = Some((id, kind, pivot));
    }

    fn end_pin(&mut self, layout: &mut dyn LayoutContext) {
        let (Some((id, kind, pivot)), Some(node)) = (self.current_pin.take(), self.current_node) else {
            debug_assert!(false, "end_pin outside a node pin");
            return;
        };
        self.pins.insert(
            id,
            PinState {
                node,
                kind,
                pivot,
                rect: layout.item_rect(),
            },
        );
    }

    fn node_background_draw_list(&mut self, id: NodeId) -> &mut DrawList {
        &mut self.nodes.entry(id).or_default().background
    }

    fn begin_create(&mut self) -> bool {
        self.creation.is_some()
    }

    fn query_new_link(&mut self) -> Option<(PinId, PinId)> {
        match self.creation {
            Some(Creation::Link(start, end)) => Some((start, end)),
            _ => None,
        }
    }

    fn query_new_node(&mut self) -> Option<PinId> {
        match self.creation {
            Some(Creation::Node(pin)) => Some(pin),
            _ => None,
        }
    }

    fn accept_new_item(&mut self) -> bool {
        let accepted = self.creation.take();
        tracing::debug!(?accepted, "create accepted");
        accepted.is_some()
    }

    fn reject_new_item(&mut self) {
        let rejected = self.creation.take();
        tracing::debug!(?rejected, "create rejected");
    }

    fn end_create(&mut self) {}

    fn begin_delete(&mut self) -> bool {
        !self.deletions.is_empty()
    }

    fn query_deleted_link(&mut self) -> Option<DeletedLink> {
        let index = self
            .deletions
            .iter()
            .position(|deletion| matches!(deletion, Deletion::Link(_)))?;
        let deletion = self.deletions.remove(index)?;
        self.hand_out(deletion);
        match deletion {
            Deletion::Link(link) => Some(link),
            Deletion::Node(_) => None,
        }
    }

    fn query_deleted_node(&mut self) -> Option<NodeId> {
        let index = self
            .deletions
            .iter()
            .position(|deletion| matches!(deletion, Deletion::Node(_)))?;
        let deletion = self.deletions.remove(index)?;
        self.hand_out(deletion);
        match deletion {
            Deletion::Node(node) => Some(node),
            Deletion::Link(_) => None,
        }
    }

    fn accept_deleted_item(&mut self, delete_dependencies: bool) -> bool {
        let Some(deletion) = self.deletion.take() else {
            return false;
        };
        tracing::debug!(?deletion, delete_dependencies, "delete accepted");
        match deletion {
            Deletion::Link(link) => {
                self.links.shift_remove(&link.link);
            }
            Deletion::Node(node) => {
                if delete_dependencies {
                    self.queue_node_links(node);
                }
                self.remove_node(node);
            }
        }
        true
    }

    fn reject_deleted_item(&mut self) {
        let rejected = self.deletion.take();
        tracing::debug!(?rejected, "delete rejected");
    }

    fn end_delete(&mut self) {
        // Unresolved candidates stay pending, in the order they were queued
        if let Some(deletion) = self.deletion.take() {
            self.skipped.push(deletion);
        }
        for deletion in self.skipped.drain(..).rev() {
            self.deletions.push_front(deletion);
        }
    }
}

/// Cubic bezier leaving `from` to the right and entering `to` from the left
fn bezier_link(from: Pos2, to: Pos2, stroke: Stroke) -> Shape {
    let distance = (to.x - from.x).abs();
    let curvature = BEZIER_CURVATURE.min(distance * 0.5).max(BEZIER_CURVATURE * 0.5);

    let ctrl1 = Pos2::new(from.x + curvature, from.y);
    let ctrl2 = Pos2::new(to.x - curvature, to.y);

    Shape::line(bezier_points(from, ctrl1, ctrl2, to, BEZIER_SEGMENTS), stroke)
}

/// Generate points along a cubic bezier curve
fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    (0..=segments)
        .map(|i| {
            let t = i as f32 / segments as f32;
            let mt = 1.0 - t;
            let a = mt * mt * mt;
            let b = 3.0 * mt * mt * t;
            let c = 3.0 * mt * t * t;
            let d = t * t * t;
            Pos2::new(
                a * p0.x + b * p1.x + c * p2.x + d * p3.x,
                a * p0.y + b * p1.y + c * p2.y + d * p3.y,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::EditorFrame;
    use crate::interaction::{ItemBuilder, ItemDeleter};
    use crate::layout::LayoutStyle;
    use crate::node_builder::BlueprintNodeBuilder;
    use crate::stack_layout::StackLayout;
    use egui::{pos2, vec2};

    const NODE: NodeId = NodeId(1);
    const OTHER: NodeId = NodeId(2);

    fn layout() -> StackLayout {
        StackLayout::new(
            LayoutStyle::default(),
            Rect::from_min_size(Pos2::ZERO, vec2(1000.0, 1000.0)),
        )
    }

    /// Lays out NODE with input 10 and output 11, OTHER with input 20
    fn frame(canvas: &mut EditorCanvas, layout: &mut StackLayout) {
        layout.begin_frame();
        canvas.begin_frame();
        let mut builder = BlueprintNodeBuilder::new(None);
        let mut frame = EditorFrame::new(layout, canvas);

        builder.begin(&mut frame, NODE);
        builder.header(&mut frame, [0.5, 0.5, 1.0, 1.0]);
        frame.layout.allocate(vec2(60.0, 16.0));
        builder.end_header(&mut frame);
        builder.input(&mut frame, PinId(10));
        frame.layout.allocate(vec2(30.0, 12.0));
        builder.end_input(&mut frame);
        builder.output(&mut frame, PinId(11));
        frame.layout.allocate(vec2(30.0, 12.0));
        builder.end_output(&mut frame);
        builder.end(&mut frame);

        builder.begin(&mut frame, OTHER);
        builder.input(&mut frame, PinId(20));
        frame.layout.allocate(vec2(30.0, 12.0));
        builder.end_input(&mut frame);
        builder.end(&mut frame);

        layout.end_frame();
        canvas.link(LinkId(5), PinId(11), PinId(20), Color32::WHITE, 2.0);
    }

    fn canvas() -> EditorCanvas {
        let mut canvas = EditorCanvas::new(CanvasStyle::default());
        canvas.set_node_position(NODE, pos2(100.0, 100.0));
        canvas.set_node_position(OTHER, pos2(400.0, 100.0));
        canvas
    }

    #[test]
    fn test_node_bounds_start_at_position() {
        let mut canvas = canvas();
        let mut layout = layout();
        frame(&mut canvas, &mut layout);

        let bounds = canvas.node_bounds(NODE).unwrap();
        assert_eq!(bounds.min, pos2(100.0, 100.0));
        assert!(bounds.width() >= 60.0 + 16.0);
        assert!(canvas.style_stack.is_empty());
    }

    #[test]
    fn test_pin_anchors_follow_pivot() {
        let mut canvas = canvas();
        let mut layout = layout();
        frame(&mut canvas, &mut layout);

        let input = canvas.pins[&PinId(10)];
        let output = canvas.pins[&PinId(11)];
        assert_eq!(canvas.pin_anchor(PinId(10)), Some(pos2(input.rect.min.x, input.rect.center().y)));
        assert_eq!(canvas.pin_anchor(PinId(11)), Some(pos2(output.rect.max.x, output.rect.center().y)));
        assert_eq!(canvas.pin_kind(PinId(11)), Some(PinKind::Source));
        assert_eq!(canvas.pin_node(PinId(20)), Some(OTHER));
        assert!(input.rect.max.x <= output.rect.min.x);
    }

    #[test]
    fn test_shapes_include_links_and_nodes() {
        let mut canvas = canvas();
        let mut layout = layout();
        frame(&mut canvas, &mut layout);

        let shapes = canvas.shapes();
        // One link, fill + separator line + border for NODE, fill + border for OTHER
        assert_eq!(shapes.len(), 6);
        match &shapes[0] {
            Shape::Path(path) => {
                assert_eq!(path.points.len(), BEZIER_SEGMENTS + 1);
                assert_eq!(path.points.first(), canvas.pin_anchor(PinId(11)).as_ref());
                assert_eq!(path.points.last(), canvas.pin_anchor(PinId(20)).as_ref());
            }
            other => panic!("expected link path, got {other:?}"),
        }
    }

    #[test]
    fn test_create_accept_and_reject() {
        let mut canvas = canvas();
        canvas.request_link(PinId(11), PinId(20));
        {
            let mut builder = ItemBuilder::new(&mut canvas);
            let link = builder.query_new_link().unwrap();
            link.reject();
        }
        assert!(!canvas.has_pending());

        canvas.request_node(PinId(11));
        {
            let mut builder = ItemBuilder::new(&mut canvas);
            assert!(builder.query_new_link().is_none());
            assert!(builder.query_new_node().unwrap().accept());
        }
        assert!(!canvas.has_pending());
    }

    #[test]
    fn test_delete_node_queues_its_links() {
        let mut canvas = canvas();
        let mut layout = layout();
        frame(&mut canvas, &mut layout);
        canvas.request_delete_node(OTHER);

        {
            let mut deleter = ItemDeleter::new(&mut canvas);
            assert!(deleter.query_deleted_link().is_none());
            assert!(deleter.query_deleted_node().unwrap().accept());

            let link = deleter.query_deleted_link().unwrap();
            assert_eq!((link.link, link.start, link.end), (LinkId(5), PinId(11), PinId(20)));
            assert!(link.accept());
        }

        assert_eq!(canvas.node_ids().collect::<Vec<_>>(), vec![NODE]);
        assert_eq!(canvas.pin_anchor(PinId(20)), None);
        assert_eq!(canvas.link_count(), 0);
        assert!(!canvas.has_pending());
    }

    #[test]
    fn test_unresolved_deletion_stays_pending() {
        let mut canvas = canvas();
        canvas.request_delete_node(NODE);
        {
            let mut deleter = ItemDeleter::new(&mut canvas);
            let node = deleter.query_deleted_node().map(|node| node.node);
            assert_eq!(node, Some(NODE));
        }
        assert!(canvas.has_pending());
        assert!(!canvas.request_delete_link(LinkId(99)));
    }

    #[test]
    fn test_every_unresolved_deletion_stays_pending() {
        let mut canvas = canvas();
        canvas.request_delete_node(NODE);
        canvas.request_delete_node(OTHER);
        {
            let mut deleter = ItemDeleter::new(&mut canvas);
            let mut seen = Vec::new();
            while let Some(node) = deleter.query_deleted_node() {
                seen.push(node.node);
            }
            assert_eq!(seen, vec![NODE, OTHER]);
        }

        // Both come back, in their original order
        let mut deleter = ItemDeleter::new(&mut canvas);
        assert!(deleter.is_active());
        let first = deleter.query_deleted_node().unwrap();
        assert_eq!(first.node, NODE);
        first.reject();
        let second = deleter.query_deleted_node().unwrap();
        assert_eq!(second.node, OTHER);
        assert!(second.accept());
        assert!(deleter.query_deleted_node().is_none());
        drop(deleter);

        assert!(!canvas.has_pending());
        assert_eq!(canvas.node_ids().collect::<Vec<_>>(), vec![NODE]);
    }

    #[test]
    fn test_unplaced_node_has_no_bounds() {
        let canvas = canvas();
        assert_eq!(canvas.node_position(NODE), Some(pos2(100.0, 100.0)));
        assert_eq!(canvas.node_bounds(NODE), None);
    }

    #[test]
    fn test_style_stack() {
        let mut canvas = canvas();
        canvas.push_style_var(StyleVar::NodeRounding(3.0));
        canvas.push_style_var(StyleVar::NodeBorderWidth(4.0));
        assert_eq!(canvas.style().node_rounding, 3.0);
        canvas.pop_style_var(1);
        assert_eq!(canvas.style().node_border_width, 1.5);
        assert_eq!(canvas.style().node_rounding, 3.0);
        canvas.pop_style_var(1);
        assert_eq!(*canvas.style(), CanvasStyle::default());
    }

    #[test]
    fn test_bezier_endpoints() {
        let points = bezier_points(pos2(0.0, 0.0), pos2(1.0, 0.0), pos2(2.0, 1.0), pos2(3.0, 1.0), 4);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], pos2(0.0, 0.0));
        assert_eq!(points[4], pos2(3.0, 1.0));
    }
}
