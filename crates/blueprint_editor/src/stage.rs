// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layout stage machine for a single node.
//!
//! A node is laid out as a vertical column: a header row, then a content row
//! holding the input pin column on the left and the output pin column on the
//! right. Each region is opened on entry to its stage and closed on exit, so
//! every region boundary is computed here and nowhere else.
//!
//! ```text
//! node (vertical)
//! ├── header (horizontal)
//! ├── spacer
//! └── content (horizontal)
//!     ├── inputs (vertical, aligned left)
//!     ├── spring
//!     └── outputs (vertical, aligned right)
//! ```

use crate::layout::{GroupId, LayoutContext};
use egui::Rect;

/// Region of a node currently being laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Stage {
    /// No node is being built
    #[default]
    Invalid,
    /// Node opened, nothing laid out yet
    Begin,
    /// Inside the header row
    Header,
    /// Inside the content row, outside both pin columns
    Content,
    /// Inside the input pin column
    Input,
    /// Inside the output pin column
    Output,
    /// Node closed
    End,
}

/// Measured rectangles of the last node built
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRects {
    /// Header row, [`Rect::NOTHING`] if the node had none
    pub header: Rect,
    /// Content row
    pub content: Rect,
    /// Whole node
    pub node: Rect,
}

impl Default for NodeRects {
    fn default() -> Self {
        Self {
            header: Rect::NOTHING,
            content: Rect::NOTHING,
            node: Rect::NOTHING,
        }
    }
}

impl NodeRects {
    /// Gap between the bottom of the header and the top of the content
    pub fn header_separator(&self) -> Rect {
        Rect::from_min_max(self.header.left_bottom(), self.content.right_top())
    }

    /// Gap between the bottom of the content and the bottom of the node
    pub fn footer_separator(&self) -> Rect {
        Rect::from_min_max(self.content.left_bottom(), self.node.right_bottom())
    }

    /// Everything below the header
    pub fn body(&self) -> Rect {
        self.header_separator().union(self.footer_separator())
    }
}

/// Whether `rect` encloses no area
pub(crate) fn is_empty(rect: Rect) -> bool {
    !rect.is_positive()
}

/// Tracks the current [`Stage`] and emits the layout calls of each transition
#[derive(Debug, Clone, Default)]
pub struct StageMachine {
    stage: Stage,
    rects: NodeRects,
}

impl StageMachine {
    /// A machine in [`Stage::Invalid`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Rectangles captured so far
    pub fn rects(&self) -> &NodeRects {
        &self.rects
    }

    /// Forget the rectangles of the previous node
    pub fn reset_rects(&mut self) {
        self.rects = NodeRects::default();
    }

    /// Leave the current stage without layout calls
    pub(crate) fn invalidate(&mut self) {
        self.stage = Stage::Invalid;
    }

    /// Move to `stage`. Returns false, emitting nothing, if already there.
    pub fn set_stage(&mut self, layout: &mut dyn LayoutContext, stage: Stage) -> bool {
        if stage == self.stage {
            return false;
        }

        let old = self.stage;
        self.stage = stage;
        tracing::trace!(?old, new = ?stage, "node stage");

        match old {
            Stage::Header => {
                layout.end_horizontal();
                self.rects.header = layout.item_rect();
                let spacing = layout.style().item_spacing.y * 2.0;
                layout.spring(0.0, Some(spacing));
            }
            Stage::Input => {
                layout.spring(1.0, Some(0.0));
                layout.end_vertical();
            }
            Stage::Output => {
                layout.spring(1.0, None);
                layout.end_vertical();
            }
            Stage::Invalid | Stage::Begin | Stage::Content | Stage::End => {}
        }

        match stage {
            Stage::Begin => layout.begin_vertical(GroupId::Named("node"), None),
            Stage::Header => layout.begin_horizontal(GroupId::Named("header")),
            Stage::Content => {
                layout.begin_horizontal(GroupId::Named("content"));
                layout.spring(0.0, Some(0.0));
            }
            Stage::Input => layout.begin_vertical(GroupId::Named("inputs"), Some(0.0)),
            Stage::Output => {
                layout.spring(1.0, None);
                layout.begin_vertical(GroupId::Named("outputs"), Some(1.0));
            }
            Stage::End => {
                if old == Stage::Input {
                    layout.spring(1.0, Some(0.0));
                }
                layout.end_horizontal();
                self.rects.content = layout.item_rect();
                layout.end_vertical();
                self.rects.node = layout.item_rect();
            }
            Stage::Invalid => {}
        }

        true
    }
}
