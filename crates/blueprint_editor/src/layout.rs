// SPDX-License-Identifier: MIT OR Apache-2.0
//! Immediate-mode layout seam.
//!
//! Widgets describe their layout as a nested stack of horizontal and
//! vertical groups with springs between items. Every call is positional:
//! the order of calls within a frame is the layout.

use crate::ids::PinId;
use egui::{Id, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Direction a layout group stacks its items in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Items left to right
    Horizontal,
    /// Items top to bottom
    Vertical,
}

impl Axis {
    /// Component of `v` along this axis
    pub fn main(self, v: Vec2) -> f32 {
        match self {
            Self::Horizontal => v.x,
            Self::Vertical => v.y,
        }
    }

    /// Component of `v` across this axis
    pub fn cross(self, v: Vec2) -> f32 {
        match self {
            Self::Horizontal => v.y,
            Self::Vertical => v.x,
        }
    }

    /// Build a vector from main and cross components
    pub fn compose(self, main: f32, cross: f32) -> Vec2 {
        match self {
            Self::Horizontal => Vec2::new(main, cross),
            Self::Vertical => Vec2::new(cross, main),
        }
    }
}

/// Key of a layout group, unique within the enclosing id scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupId {
    /// A fixed region name such as `"header"`
    Named(&'static str),
    /// The row of a pin
    Pin(PinId),
}

/// Ambient style of the immediate-mode layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutStyle {
    /// Gap between consecutive items
    pub item_spacing: Vec2,
    /// Global opacity applied to everything drawn
    pub alpha: f32,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            item_spacing: Vec2::new(8.0, 4.0),
            alpha: 1.0,
        }
    }
}

/// The immediate-mode cursor and layout group stack.
///
/// Every `begin_group` must be matched by an `end_group` on the same axis
/// within the frame, or the layout of everything after it is shifted.
pub trait LayoutContext {
    /// Enter an id scope; group keys are hashed with the scope
    fn push_id(&mut self, id: Id);

    /// Leave the innermost id scope
    fn pop_id(&mut self);

    /// Open a group. A zero `size` component means "fit the content",
    /// `align` places items across the axis (0.0 start, 1.0 end).
    fn begin_group(&mut self, axis: Axis, id: GroupId, size: Vec2, align: Option<f32>);

    /// Close the innermost group, which becomes the last item
    fn end_group(&mut self, axis: Axis);

    /// Insert a spring. `weight` shares out free space, `spacing` is the
    /// minimum length (`None` uses the item spacing).
    fn spring(&mut self, weight: f32, spacing: Option<f32>);

    /// Where the next root item will be placed
    fn cursor(&self) -> Pos2;

    /// Move the root cursor
    fn set_cursor(&mut self, pos: Pos2);

    /// Place a widget of `size` at the cursor, returning its rectangle
    fn allocate(&mut self, size: Vec2) -> Rect;

    /// Register `rect` as the last item without moving the cursor.
    /// Returns whether it is visible.
    fn add_item(&mut self, rect: Rect) -> bool;

    /// Rectangle of the last item
    fn item_rect(&self) -> Rect;

    /// Whether the last item intersects the visible area
    fn is_item_visible(&self) -> bool;

    /// Ambient style
    fn style(&self) -> &LayoutStyle;

    /// Number of open groups
    fn depth(&self) -> usize;

    /// Open a horizontal group fitting its content
    fn begin_horizontal(&mut self, id: GroupId) {
        self.begin_group(Axis::Horizontal, id, Vec2::ZERO, None);
    }

    /// Open a vertical group fitting its content
    fn begin_vertical(&mut self, id: GroupId, align: Option<f32>) {
        self.begin_group(Axis::Vertical, id, Vec2::ZERO, align);
    }

    /// Close a horizontal group
    fn end_horizontal(&mut self) {
        self.end_group(Axis::Horizontal);
    }

    /// Close a vertical group
    fn end_vertical(&mut self) {
        self.end_group(Axis::Vertical);
    }
}
