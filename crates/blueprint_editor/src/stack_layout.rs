// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stack layout: an in-memory [`LayoutContext`].
//!
//! Groups are laid out in a single pass. Anything that depends on the final
//! size of a group (springs, cross-axis alignment) uses the size the same
//! group had in the previous frame, so layouts settle after a couple of
//! frames and stay stable afterwards.

use crate::layout::{Axis, GroupId, LayoutContext, LayoutStyle};
use egui::{Id, Pos2, Rect, Vec2};
use std::collections::HashMap;

/// What a group measured last frame
#[derive(Debug, Clone, Default)]
struct GroupMemory {
    size: Vec2,
    spring_extra: Vec<f32>,
}

#[derive(Debug, Clone, Copy)]
struct Spring {
    weight: f32,
    extra: f32,
}

#[derive(Debug)]
struct OpenGroup {
    key: Id,
    axis: Axis,
    min: Pos2,
    fixed_size: Vec2,
    align: f32,
    /// Length used along the axis so far
    main: f32,
    /// Largest extent across the axis so far
    cross: f32,
    item_count: usize,
    after_spring: bool,
    springs: Vec<Spring>,
    /// Cross size from last frame, used to align items
    available_cross: f32,
    /// Main size the springs may grow the group to
    available_main: f32,
}

/// Immediate-mode stack layout with springs
#[derive(Debug)]
pub struct StackLayout {
    style: LayoutStyle,
    clip_rect: Rect,
    cursor: Pos2,
    id_stack: Vec<Id>,
    groups: Vec<OpenGroup>,
    last_item: Rect,
    last_item_visible: bool,
    memory: HashMap<Id, GroupMemory>,
    next_memory: HashMap<Id, GroupMemory>,
}

impl StackLayout {
    /// Create a layout drawing into `clip_rect`
    pub fn new(style: LayoutStyle, clip_rect: Rect) -> Self {
        Self {
            style,
            clip_rect,
            cursor: clip_rect.min,
            id_stack: Vec::new(),
            groups: Vec::new(),
            last_item: Rect::NOTHING,
            last_item_visible: false,
            memory: HashMap::new(),
            next_memory: HashMap::new(),
        }
    }

    /// Visible area
    pub fn clip_rect(&self) -> Rect {
        self.clip_rect
    }

    /// Resize the visible area
    pub fn set_clip_rect(&mut self, clip_rect: Rect) {
        self.clip_rect = clip_rect;
    }

    /// Mutable access to the ambient style
    pub fn style_mut(&mut self) -> &mut LayoutStyle {
        &mut self.style
    }

    /// Start a frame
    pub fn begin_frame(&mut self) {
        debug_assert!(self.groups.is_empty(), "frame started with open layout groups");
        self.groups.clear();
        self.id_stack.clear();
        self.cursor = self.clip_rect.min;
        self.last_item = Rect::NOTHING;
        self.last_item_visible = false;
    }

    /// Finish a frame; measurements become next frame's memory
    pub fn end_frame(&mut self) {
        if !self.groups.is_empty() {
            tracing::warn!(
                "Frame ended with {} open layout group(s), discarding them",
                self.groups.len()
            );
            debug_assert!(false, "unbalanced layout groups at end of frame");
            self.groups.clear();
        }
        debug_assert!(self.id_stack.is_empty(), "unbalanced id scopes at end of frame");

        self.memory = std::mem::take(&mut self.next_memory);
    }

    fn scope(&self) -> Id {
        self.id_stack
            .last()
            .copied()
            .unwrap_or_else(|| Id::new("stack_layout"))
    }

    /// Position for the next item of `size` in the innermost group
    fn next_position(&mut self, size: Vec2) -> Pos2 {
        let spacing = self.style.item_spacing;
        match self.groups.last_mut() {
            Some(group) => {
                let axis = group.axis;
                if group.item_count > 0 && !group.after_spring {
                    group.main += axis.main(spacing);
                }
                group.after_spring = false;

                let cross_offset = group.align * (group.available_cross - axis.cross(size)).max(0.0);
                group.min + axis.compose(group.main, cross_offset)
            }
            None => self.cursor,
        }
    }

    /// Record a placed item in the innermost group
    fn commit(&mut self, rect: Rect) {
        match self.groups.last_mut() {
            Some(group) => {
                let axis = group.axis;
                let extent = rect.max - group.min;
                group.main = group.main.max(axis.main(extent));
                group.cross = group.cross.max(axis.cross(extent));
                group.item_count += 1;
            }
            None => {
                self.cursor.y = rect.max.y + self.style.item_spacing.y;
            }
        }

        self.last_item = rect;
        self.last_item_visible = self.clip_rect.intersects(rect);
    }
}

impl LayoutContext for StackLayout {
    fn push_id(&mut self, id: Id) {
        let scoped = self.scope().with(id);
        self.id_stack.push(scoped);
    }

    fn pop_id(&mut self) {
        let popped = self.id_stack.pop();
        debug_assert!(popped.is_some(), "pop_id without a matching push_id");
    }

    fn begin_group(&mut self, axis: Axis, id: GroupId, size: Vec2, align: Option<f32>) {
        let key = self.scope().with(id);
        let remembered = self.memory.get(&key).cloned().unwrap_or_default();
        let expected = remembered.size.max(size);

        let min = self.next_position(expected);

        let available_main = if axis.main(size) > 0.0 {
            axis.main(size)
        } else {
            match self.groups.last() {
                // A group stacked across its parent may stretch to the parent's width
                Some(parent) if parent.axis != axis => parent.available_cross,
                _ => 0.0,
            }
        };

        tracing::trace!(?id, ?axis, depth = self.groups.len(), "begin layout group");

        self.groups.push(OpenGroup {
            key,
            axis,
            min,
            fixed_size: size,
            align: align.unwrap_or(0.0),
            main: 0.0,
            cross: 0.0,
            item_count: 0,
            after_spring: false,
            springs: Vec::new(),
            available_cross: axis.cross(expected),
            available_main,
        });
    }

    fn end_group(&mut self, axis: Axis) {
        let Some(group) = self.groups.pop() else {
            tracing::warn!("end_group({axis:?}) without an open group");
            debug_assert!(false, "end_group without an open group");
            return;
        };
        debug_assert_eq!(group.axis, axis, "layout group closed on the wrong axis");

        let grown: f32 = group.springs.iter().map(|s| s.extra).sum();
        let min_main = group.main - grown;

        // Share the space the group may grow into for next frame
        let free = (group.available_main - min_main).max(0.0);
        let total_weight: f32 = group.springs.iter().map(|s| s.weight).sum();
        let spring_extra = group
            .springs
            .iter()
            .map(|s| {
                if total_weight > 0.0 {
                    free * s.weight / total_weight
                } else {
                    0.0
                }
            })
            .collect();

        let size = group.axis.compose(
            group.main.max(group.axis.main(group.fixed_size)),
            group.cross.max(group.axis.cross(group.fixed_size)),
        );
        let rect = Rect::from_min_size(group.min, size);

        self.next_memory.insert(group.key, GroupMemory { size, spring_extra });
        self.commit(rect);
    }

    fn spring(&mut self, weight: f32, spacing: Option<f32>) {
        let item_spacing = self.style.item_spacing;
        let Some(group) = self.groups.last_mut() else {
            // Springs only mean something inside a group
            return;
        };

        let spacing = spacing.unwrap_or_else(|| group.axis.main(item_spacing));
        let extra = self
            .memory
            .get(&group.key)
            .and_then(|m| m.spring_extra.get(group.springs.len()))
            .copied()
            .unwrap_or(0.0);

        group.springs.push(Spring { weight, extra });
        group.main += spacing + extra;
        group.after_spring = true;
    }

    fn cursor(&self) -> Pos2 {
        self.cursor
    }

    fn set_cursor(&mut self, pos: Pos2) {
        self.cursor = pos;
    }

    fn allocate(&mut self, size: Vec2) -> Rect {
        let min = self.next_position(size);
        let rect = Rect::from_min_size(min, size);
        self.commit(rect);
        rect
    }

    fn add_item(&mut self, rect: Rect) -> bool {
        self.last_item = rect;
        self.last_item_visible = self.clip_rect.intersects(rect);
        self.last_item_visible
    }

    fn item_rect(&self) -> Rect {
        self.last_item
    }

    fn is_item_visible(&self) -> bool {
        self.last_item_visible
    }

    fn style(&self) -> &LayoutStyle {
        &self.style
    }

    fn depth(&self) -> usize {
        self.groups.len()
    }
}
