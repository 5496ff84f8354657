// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recording layout and canvas for call-sequence tests.

use crate::canvas::{CanvasStyle, DeletedLink, NodeCanvas, StyleVar};
use crate::draw::DrawList;
use crate::ids::{NodeId, PinId};
use crate::layout::{Axis, GroupId, LayoutContext, LayoutStyle};
use crate::pin::PinKind;
use egui::{pos2, vec2, Id, Pos2, Rect, Vec2};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One recorded layout or canvas call
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    PushId(Id),
    PopId,
    BeginHorizontal(GroupId),
    BeginVertical(GroupId, Option<f32>),
    EndHorizontal,
    EndVertical,
    Spring(f32, Option<f32>),
    Allocate(Vec2),
    AddItem(Rect),
    PushStyleVar(StyleVar),
    PopStyleVar(usize),
    BeginNode(NodeId),
    EndNode,
    BeginPin(PinId, PinKind, Vec2),
    EndPin,
    BeginCreate,
    AcceptNewItem,
    RejectNewItem,
    EndCreate,
    BeginDelete,
    AcceptDeletedItem(bool),
    RejectDeletedItem,
    EndDelete,
}

type Log = Rc<RefCell<Vec<Call>>>;

/// A layout and canvas writing to one shared call log
pub(crate) fn recorder() -> (RecordingLayout, RecordingCanvas) {
    let log = Log::default();
    (
        RecordingLayout::with_log(Rc::clone(&log)),
        RecordingCanvas::with_log(log),
    )
}

/// Panics unless every open call in `calls` has a matching close.
///
/// Each scope kind nests on its own: layout groups, id scopes, canvas
/// node/pin regions and style vars. Scopes of different kinds may close in
/// any relative order.
pub(crate) fn assert_balanced(calls: &[Call]) {
    let mut groups = Vec::new();
    let mut regions = Vec::new();
    let mut ids = 0usize;
    let mut styles = 0usize;

    for call in calls {
        match call {
            Call::BeginHorizontal(_) => groups.push(Axis::Horizontal),
            Call::BeginVertical(..) => groups.push(Axis::Vertical),
            Call::EndHorizontal => {
                assert_eq!(groups.pop(), Some(Axis::Horizontal), "in {calls:#?}");
            }
            Call::EndVertical => {
                assert_eq!(groups.pop(), Some(Axis::Vertical), "in {calls:#?}");
            }
            Call::BeginNode(_) => {
                assert!(regions.is_empty(), "node opened inside {regions:?}");
                regions.push("node");
            }
            Call::BeginPin(..) => {
                assert_eq!(regions.last(), Some(&"node"), "pin opened outside a node");
                regions.push("pin");
            }
            Call::EndPin => assert_eq!(regions.pop(), Some("pin"), "in {calls:#?}"),
            Call::EndNode => assert_eq!(regions.pop(), Some("node"), "in {calls:#?}"),
            Call::PushId(_) => ids += 1,
            Call::PopId => {
                assert!(ids > 0, "pop_id without push_id in {calls:#?}");
                ids -= 1;
            }
            Call::PushStyleVar(_) => styles += 1,
            Call::PopStyleVar(count) => {
                assert!(*count <= styles, "popped {count} of {styles} style vars");
                styles -= count;
            }
            _ => {}
        }
    }

    assert!(groups.is_empty(), "layout groups left open: {groups:?}");
    assert!(regions.is_empty(), "canvas regions left open: {regions:?}");
    assert_eq!(ids, 0, "id scopes left open");
    assert_eq!(styles, 0, "style vars left pushed");
}

/// Layout that records calls and reports a fresh rectangle per closed group
pub(crate) struct RecordingLayout {
    log: Log,
    style: LayoutStyle,
    groups: Vec<Axis>,
    closed: u32,
    item: Rect,
    cursor: Pos2,
    pub visible: bool,
}

impl RecordingLayout {
    pub fn new() -> Self {
        Self::with_log(Log::default())
    }

    fn with_log(log: Log) -> Self {
        Self {
            log,
            style: LayoutStyle::default(),
            groups: Vec::new(),
            closed: 0,
            item: Rect::NOTHING,
            cursor: Pos2::ZERO,
            visible: true,
        }
    }

    pub fn style_mut(&mut self) -> &mut LayoutStyle {
        &mut self.style
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn clear(&mut self) {
        self.log.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl LayoutContext for RecordingLayout {
    fn push_id(&mut self, id: Id) {
        self.record(Call::PushId(id));
    }

    fn pop_id(&mut self) {
        self.record(Call::PopId);
    }

    fn begin_group(&mut self, axis: Axis, id: GroupId, _size: Vec2, align: Option<f32>) {
        self.groups.push(axis);
        self.record(match axis {
            Axis::Horizontal => Call::BeginHorizontal(id),
            Axis::Vertical => Call::BeginVertical(id, align),
        });
    }

    fn end_group(&mut self, axis: Axis) {
        assert_eq!(self.groups.pop(), Some(axis), "mismatched group close");
        self.closed += 1;
        self.item = Rect::from_min_size(pos2(0.0, 10.0 * self.closed as f32), vec2(100.0, 10.0));
        self.record(match axis {
            Axis::Horizontal => Call::EndHorizontal,
            Axis::Vertical => Call::EndVertical,
        });
    }

    fn spring(&mut self, weight: f32, spacing: Option<f32>) {
        self.record(Call::Spring(weight, spacing));
    }

    fn cursor(&self) -> Pos2 {
        self.cursor
    }

    fn set_cursor(&mut self, pos: Pos2) {
        self.cursor = pos;
    }

    fn allocate(&mut self, size: Vec2) -> Rect {
        self.item = Rect::from_min_size(self.cursor, size);
        self.cursor.y += size.y;
        self.record(Call::Allocate(size));
        self.item
    }

    fn add_item(&mut self, rect: Rect) -> bool {
        self.item = rect;
        self.record(Call::AddItem(rect));
        self.visible
    }

    fn item_rect(&self) -> Rect {
        self.item
    }

    fn is_item_visible(&self) -> bool {
        self.visible
    }

    fn style(&self) -> &LayoutStyle {
        &self.style
    }

    fn depth(&self) -> usize {
        self.groups.len()
    }
}

/// Canvas that records calls and serves scripted interactions
pub(crate) struct RecordingCanvas {
    log: Log,
    base: CanvasStyle,
    style: CanvasStyle,
    overrides: Vec<StyleVar>,
    backgrounds: HashMap<NodeId, DrawList>,
    pub new_link: Option<(PinId, PinId)>,
    pub new_node: Option<PinId>,
    pub deleted_nodes: Vec<NodeId>,
    pub deleted_links: Vec<DeletedLink>,
}

impl RecordingCanvas {
    fn with_log(log: Log) -> Self {
        Self {
            log,
            base: CanvasStyle::default(),
            style: CanvasStyle::default(),
            overrides: Vec::new(),
            backgrounds: HashMap::new(),
            new_link: None,
            new_node: None,
            deleted_nodes: Vec::new(),
            deleted_links: Vec::new(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn background(&self, id: NodeId) -> Option<&DrawList> {
        self.backgrounds.get(&id)
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }

    fn restyle(&mut self) {
        let mut style = self.base;
        for var in &self.overrides {
            var.apply(&mut style);
        }
        self.style = style;
    }
}

impl NodeCanvas for RecordingCanvas {
    fn push_style_var(&mut self, var: StyleVar) {
        self.overrides.push(var);
        self.restyle();
        self.record(Call::PushStyleVar(var));
    }

    fn pop_style_var(&mut self, count: usize) {
        let keep = self.overrides.len().saturating_sub(count);
        self.overrides.truncate(keep);
        self.restyle();
        self.record(Call::PopStyleVar(count));
    }

    fn style(&self) -> &CanvasStyle {
        &self.style
    }

    fn begin_node(&mut self, _layout: &mut dyn LayoutContext, id: NodeId) {
        self.record(Call::BeginNode(id));
    }

    fn end_node(&mut self, _layout: &mut dyn LayoutContext) {
        self.record(Call::EndNode);
    }

    fn begin_pin(&mut self, _layout: &mut dyn LayoutContext, id: PinId, kind: PinKind, pivot: Vec2) {
        self.record(Call::BeginPin(id, kind, pivot));
    }

    fn end_pin(&mut self, _layout: &mut dyn LayoutContext) {
        self.record(Call::EndPin);
    }

    fn node_background_draw_list(&mut self, id: NodeId) -> &mut DrawList {
        self.backgrounds.entry(id).or_default()
    }

    fn begin_create(&mut self) -> bool {
        self.record(Call::BeginCreate);
        self.new_link.is_some() || self.new_node.is_some()
    }

    fn query_new_link(&mut self) -> Option<(PinId, PinId)> {
        self.new_link
    }

    fn query_new_node(&mut self) -> Option<PinId> {
        self.new_node
    }

    fn accept_new_item(&mut self) -> bool {
        self.record(Call::AcceptNewItem);
        true
    }

    fn reject_new_item(&mut self) {
        self.record(Call::RejectNewItem);
    }

    fn end_create(&mut self) {
        self.record(Call::EndCreate);
    }

    fn begin_delete(&mut self) -> bool {
        self.record(Call::BeginDelete);
        !self.deleted_nodes.is_empty() || !self.deleted_links.is_empty()
    }

    fn query_deleted_link(&mut self) -> Option<DeletedLink> {
        (!self.deleted_links.is_empty()).then(|| self.deleted_links.remove(0))
    }

    fn query_deleted_node(&mut self) -> Option<NodeId> {
        (!self.deleted_nodes.is_empty()).then(|| self.deleted_nodes.remove(0))
    }

    fn accept_deleted_item(&mut self, delete_dependencies: bool) -> bool {
        self.record(Call::AcceptDeletedItem(delete_dependencies));
        true
    }

    fn reject_deleted_item(&mut self) {
        self.record(Call::RejectDeletedItem);
    }

    fn end_delete(&mut self) {
        self.record(Call::EndDelete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_kinds_close_independently() {
        // Node builder order: the canvas node closes before the id scope
        assert_balanced(&[
            Call::PushStyleVar(StyleVar::NodeRounding(2.0)),
            Call::BeginNode(NodeId(1)),
            Call::PushId(Id::new(1)),
            Call::BeginVertical(GroupId::Named("node"), None),
            Call::BeginPin(PinId(2), PinKind::Target, vec2(0.0, 0.5)),
            Call::BeginHorizontal(GroupId::Pin(PinId(2))),
            Call::EndHorizontal,
            Call::EndPin,
            Call::EndVertical,
            Call::EndNode,
            Call::PopId,
            Call::PopStyleVar(1),
        ]);
    }

    #[test]
    #[should_panic]
    fn test_crossed_layout_groups_panic() {
        assert_balanced(&[
            Call::BeginVertical(GroupId::Named("node"), None),
            Call::BeginHorizontal(GroupId::Named("content")),
            Call::EndVertical,
            Call::EndHorizontal,
        ]);
    }

    #[test]
    #[should_panic]
    fn test_open_pin_panics() {
        assert_balanced(&[
            Call::BeginNode(NodeId(1)),
            Call::BeginPin(PinId(2), PinKind::Source, vec2(1.0, 0.5)),
            Call::EndNode,
        ]);
    }
}
