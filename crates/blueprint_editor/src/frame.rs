// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-frame handles passed to every widget call.

use crate::canvas::NodeCanvas;
use crate::layout::LayoutContext;

/// The layout and canvas a frame is being built against
pub struct EditorFrame<'a> {
    /// Immediate-mode cursor and group stack
    pub layout: &'a mut dyn LayoutContext,
    /// Node canvas
    pub canvas: &'a mut dyn NodeCanvas,
}

impl<'a> EditorFrame<'a> {
    /// Bundle the two handles
    pub fn new(layout: &'a mut dyn LayoutContext, canvas: &'a mut dyn NodeCanvas) -> Self {
        Self { layout, canvas }
    }
}
