// SPDX-License-Identifier: MIT OR Apache-2.0
//! Blueprint-style node builder.
//!
//! Builds one node box per `begin`/`end` pair: an optional tinted header,
//! then a content row with inputs on the left and outputs on the right.
//! Once the node is closed and visible, the header texture and the
//! header/content separator are drawn into the node's background list.
//!
//! Calls must come in this order for each node:
//!
//! ```text
//! begin
//!   [header .. end_header]
//!   (input .. end_input | output .. end_output)*
//! end
//! ```
//!
//! Nesting `begin` inside an open node is a caller error. Debug builds
//! assert on it; release builds lay out garbage for that node only.

use crate::canvas::StyleVar;
use crate::draw::{pack_color, CornerFlags};
use crate::frame::EditorFrame;
use crate::ids::{NodeId, PinId};
use crate::layout::GroupId;
use crate::pin::{self, PinKind};
use crate::stage::{is_empty, NodeRects, Stage, StageMachine};
use egui::{pos2, vec2, Color32, Id, Margin, Pos2, Rect, TextureId};

/// Padding applied to every node the builder opens
const NODE_PADDING: Margin = Margin {
    left: 8.0,
    right: 8.0,
    top: 4.0,
    bottom: 8.0,
};

/// Texture tiled across node headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderTexture {
    /// Texture handle
    pub id: TextureId,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl HeaderTexture {
    /// A texture of `width` × `height` pixels
    pub fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    /// Bottom-right UV for a header of the size of `header`.
    /// One texel covers four points.
    pub fn uv(&self, header: Rect) -> Pos2 {
        pos2(
            header.width() / (4.0 * self.width.max(1) as f32),
            header.height() / (4.0 * self.height.max(1) as f32),
        )
    }
}

/// Lays out blueprint nodes through a [`StageMachine`]
#[derive(Debug, Clone)]
pub struct BlueprintNodeBuilder {
    header_texture: Option<HeaderTexture>,
    current_node: NodeId,
    stages: StageMachine,
    header_color: [u8; 4],
}

impl BlueprintNodeBuilder {
    /// Create a builder, optionally tiling `header_texture` across headers
    pub fn new(header_texture: Option<HeaderTexture>) -> Self {
        Self {
            header_texture,
            current_node: NodeId::INVALID,
            stages: StageMachine::new(),
            header_color: [255; 4],
        }
    }

    /// Texture drawn behind headers
    pub fn header_texture(&self) -> Option<HeaderTexture> {
        self.header_texture
    }

    /// Node being built, [`NodeId::INVALID`] between nodes
    pub fn current_node(&self) -> NodeId {
        self.current_node
    }

    /// Current layout stage
    pub fn stage(&self) -> Stage {
        self.stages.stage()
    }

    /// Rectangles measured for the current or last node
    pub fn rects(&self) -> &NodeRects {
        self.stages.rects()
    }

    /// Open node `id`
    pub fn begin(&mut self, frame: &mut EditorFrame<'_>, id: NodeId) {
        debug_assert_eq!(self.stages.stage(), Stage::Invalid, "begin inside an open node");
        tracing::trace!(node = ?id, "begin node");

        frame.canvas.push_style_var(StyleVar::NodePadding(NODE_PADDING));
        frame.canvas.begin_node(frame.layout, id);
        frame.layout.push_id(Id::new(id));

        self.current_node = id;
        self.header_color = [255; 4];
        self.stages.reset_rects();
        self.stages.set_stage(frame.layout, Stage::Begin);
    }

    /// Open the header row, tinted with unmultiplied RGBA `color`.
    /// Only the RGB part is used; the header opacity follows the style alpha.
    pub fn header(&mut self, frame: &mut EditorFrame<'_>, color: [f32; 4]) {
        self.header_color = pack_color(color);
        self.stages.set_stage(frame.layout, Stage::Header);
    }

    /// Close the header row
    pub fn end_header(&mut self, frame: &mut EditorFrame<'_>) {
        self.stages.set_stage(frame.layout, Stage::Content);
    }

    /// Open the row of input pin `id`
    pub fn input(&mut self, frame: &mut EditorFrame<'_>, id: PinId) {
        if self.stages.stage() == Stage::Begin {
            self.stages.set_stage(frame.layout, Stage::Content);
        }

        let apply_padding = self.stages.stage() == Stage::Input;
        self.stages.set_stage(frame.layout, Stage::Input);
        if apply_padding {
            frame.layout.spring(0.0, None);
        }

        pin::begin_pin(frame, id, PinKind::Target);
        frame.layout.begin_horizontal(GroupId::Pin(id));
    }

    /// Close the current input pin row
    pub fn end_input(&mut self, frame: &mut EditorFrame<'_>) {
        frame.layout.end_horizontal();
        pin::end_pin(frame);
    }

    /// Open the row of output pin `id`
    pub fn output(&mut self, frame: &mut EditorFrame<'_>, id: PinId) {
        // Outputs always sit in their own column after the inputs
        if self.stages.stage() == Stage::Begin {
            self.stages.set_stage(frame.layout, Stage::Content);
            self.stages.set_stage(frame.layout, Stage::Input);
        }

        let apply_padding = self.stages.stage() == Stage::Output;
        self.stages.set_stage(frame.layout, Stage::Output);
        if apply_padding {
            frame.layout.spring(0.0, None);
        }

        pin::begin_pin(frame, id, PinKind::Source);
        frame.layout.begin_horizontal(GroupId::Pin(id));
    }

    /// Close the current output pin row
    pub fn end_output(&mut self, frame: &mut EditorFrame<'_>) {
        frame.layout.end_horizontal();
        pin::end_pin(frame);
    }

    /// Close the node and draw its header decorations
    pub fn end(&mut self, frame: &mut EditorFrame<'_>) {
        if matches!(self.stages.stage(), Stage::Begin | Stage::Header) {
            self.stages.set_stage(frame.layout, Stage::Content);
        }
        self.stages.set_stage(frame.layout, Stage::End);

        frame.canvas.end_node(frame.layout);

        if frame.layout.is_item_visible() {
            self.draw_background(frame);
        }

        self.current_node = NodeId::INVALID;
        frame.layout.pop_id();
        frame.canvas.pop_style_var(1);
        self.stages.invalidate();
    }

    fn draw_background(&self, frame: &mut EditorFrame<'_>) {
        let alpha = (255.0 * frame.layout.style().alpha.clamp(0.0, 1.0)) as u8;
        let style = *frame.canvas.style();
        let inset = 8.0 - style.node_border_width * 0.5;
        let rects = *self.stages.rects();

        let [r, g, b, _] = self.header_color;
        let header_color = Color32::from_rgba_unmultiplied(r, g, b, alpha);

        let list = frame.canvas.node_background_draw_list(self.current_node);

        if let Some(texture) = self.header_texture.filter(|_| !is_empty(rects.header)) {
            list.add_image(
                texture.id,
                rects.header.min - vec2(inset, 4.0 - style.node_border_width * 0.5),
                rects.header.max + vec2(inset, 0.0),
                Pos2::ZERO,
                texture.uv(rects.header),
                header_color,
                CornerFlags::TOP.rounding(style.node_rounding),
            );
        }

        let separator = rects.header_separator();
        if !is_empty(separator) {
            let line_alpha = (96 * u32::from(alpha) / (3 * 255)) as u8;
            list.add_line(
                separator.left_top() + vec2(-inset, -1.0),
                separator.right_top() + vec2(inset, -1.0),
                Color32::from_rgba_unmultiplied(255, 255, 255, line_alpha),
                1.0,
            );
        }
    }
}
