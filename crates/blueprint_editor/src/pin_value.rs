// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rounded background behind pin value widgets.

use crate::draw::{pack_color, DrawList};
use crate::layout::LayoutContext;
use egui::{Color32, Rounding};

/// Matches the frame background of value editors
const DEFAULT_COLOR: [f32; 4] = [0.16, 0.29, 0.48, 0.54];
const DEFAULT_ALPHA: f32 = 0.25;
const ROUNDING: f32 = 4.0;

/// Scope that lets a pin value draw first and gets its background slid
/// underneath afterwards.
///
/// Content drawn through [`Self::draw_list`] goes to the foreground.
/// [`Self::commit`] adds the background behind the last laid out item,
/// [`Self::discard`] keeps the content only. Dropping the renderer without
/// either discards.
pub struct PinValueBackgroundRenderer<'d> {
    list: &'d mut DrawList,
    color: Color32,
    finished: bool,
}

impl<'d> PinValueBackgroundRenderer<'d> {
    /// Start capturing with the default frame background color
    pub fn new(list: &'d mut DrawList) -> Self {
        Self::with_color(list, DEFAULT_COLOR, DEFAULT_ALPHA)
    }

    /// Start capturing with an unmultiplied RGBA `color` faded by `alpha`
    pub fn with_color(list: &'d mut DrawList, color: [f32; 4], alpha: f32) -> Self {
        let [r, g, b, a] = pack_color([color[0], color[1], color[2], color[3] * alpha]);
        let color = Color32::from_rgba_unmultiplied(r, g, b, a);
        list.split(2);
        list.set_channel(1);
        Self {
            list,
            color,
            finished: false,
        }
    }

    /// Background color that a commit draws
    pub fn color(&self) -> Color32 {
        self.color
    }

    /// Foreground the value content is drawn into
    pub fn draw_list(&mut self) -> &mut DrawList {
        self.list
    }

    /// Draw the background behind `layout`'s last item and merge
    pub fn commit(mut self, layout: &dyn LayoutContext) {
        let rect = layout
            .item_rect()
            .expand2(layout.style().item_spacing * 0.25);
        let rounding = Rounding::same(ROUNDING);

        self.list.set_channel(0);
        self.list.add_rect_filled(rect, self.color, rounding);
        self.list.add_rect(rect, self.color, rounding, 1.0);
        self.finish();
    }

    /// Merge the content without a background
    pub fn discard(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.list.merge();
        }
    }
}

impl Drop for PinValueBackgroundRenderer<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}
