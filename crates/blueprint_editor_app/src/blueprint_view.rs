// SPDX-License-Identifier: MIT OR Apache-2.0
//! Blueprint rendering through the node builder.
//!
//! Text is measured but not rasterized in the headless demo: labels take up
//! layout space and values are marked with a baseline stroke.

use blueprint_editor::{
    BlueprintNodeBuilder, DebugOverlay, DrawList, EditorFrame, LayoutContext,
    PinValueBackgroundRenderer,
};
use blueprint_script::{Blueprint, Context, Node, NodeKind, Pin, PinValue};
use egui::{vec2, Color32, Rounding, Vec2};

/// Pin icon visual dimensions
const ICON_SIZE: f32 = 16.0;
const ICON_RADIUS: f32 = 5.0;

/// Approximate glyph metrics used to measure labels
const CHAR_WIDTH: f32 = 7.0;
const LINE_HEIGHT: f32 = 14.0;

/// Header height below the title
const HEADER_HEIGHT: f32 = 28.0;

/// Header tint per node kind
pub fn header_color(kind: &NodeKind) -> [f32; 4] {
    match kind {
        NodeKind::Entry => [1.0, 0.25, 0.25, 1.0],
        NodeKind::Branch => [1.0, 1.0, 1.0, 1.0],
        NodeKind::Print => [0.25, 0.5, 1.0, 1.0],
        NodeKind::ConstBool(_) | NodeKind::ConstInt32(_) => [0.35, 0.8, 0.35, 1.0],
        NodeKind::AddInt32 | NodeKind::ToString => [0.6, 0.6, 0.8, 1.0],
    }
}

/// Space a single line of `text` takes
pub fn label_size(text: &str) -> Vec2 {
    vec2(text.chars().count() as f32 * CHAR_WIDTH, LINE_HEIGHT)
}

/// Lays out and draws every node of a blueprint
pub struct BlueprintView<'v> {
    /// Node builder shared by all nodes
    pub builder: &'v mut BlueprintNodeBuilder,
    /// Execution highlights
    pub overlay: &'v mut DebugOverlay,
    /// Draw list for node content
    pub content: &'v mut DrawList,
}

impl BlueprintView<'_> {
    /// Draw all nodes of `blueprint`, showing values computed in `context`
    pub fn draw(&mut self, frame: &mut EditorFrame<'_>, blueprint: &Blueprint, context: &Context) {
        self.overlay.begin(self.content);
        for node in blueprint.nodes() {
            self.draw_node(frame, blueprint, context, node);
        }
        self.overlay.end(self.content);
    }

    fn draw_node(&mut self, frame: &mut EditorFrame<'_>, blueprint: &Blueprint, context: &Context, node: &Node) {
        let rounding = frame.canvas.style().node_rounding;

        self.builder.begin(frame, node.id.into());

        self.builder.header(frame, header_color(&node.kind));
        frame.layout.spring(0.0, None);
        frame.layout.allocate(label_size(&node.name));
        frame.layout.spring(1.0, None);
        frame.layout.allocate(vec2(0.0, HEADER_HEIGHT));
        frame.layout.spring(0.0, None);
        self.builder.end_header(frame);

        for pin in &node.inputs {
            let linked = blueprint.is_linked(pin.id);
            self.builder.input(frame, pin.id.into());
            self.draw_pin_icon(frame.layout, pin, linked);
            frame.layout.spring(0.0, None);
            if !pin.name.is_empty() {
                frame.layout.allocate(label_size(&pin.name));
                frame.layout.spring(0.0, None);
            }
            if !pin.is_flow() && !linked {
                let value = context.value(pin.id).or(pin.default_value.as_ref());
                if let Some(value) = value {
                    self.draw_value(frame.layout, value);
                }
            }
            self.builder.end_input(frame);
            self.overlay
                .draw_input_pin(self.content, pin, frame.layout.item_rect());
        }

        for pin in &node.outputs {
            let linked = blueprint.is_linked(pin.id);
            self.builder.output(frame, pin.id.into());
            if !pin.name.is_empty() {
                frame.layout.allocate(label_size(&pin.name));
                frame.layout.spring(0.0, None);
            }
            self.draw_pin_icon(frame.layout, pin, linked);
            self.builder.end_output(frame);
            self.overlay
                .draw_output_pin(self.content, pin, frame.layout.item_rect());
        }

        self.builder.end(frame);
        self.overlay
            .draw_node(self.content, node.id, frame.layout.item_rect(), rounding);
    }

    fn draw_pin_icon(&mut self, layout: &mut dyn LayoutContext, pin: &Pin, linked: bool) {
        let rect = layout.allocate(Vec2::splat(ICON_SIZE));
        let [r, g, b] = pin.pin_type.color();
        let color = Color32::from_rgb(r, g, b);

        if pin.is_flow() {
            let icon = rect.shrink(ICON_SIZE * 0.5 - ICON_RADIUS);
            if linked {
                self.content.add_rect_filled(icon, color, Rounding::same(2.0));
            } else {
                self.content.add_rect(icon, color, Rounding::same(2.0), 2.0);
            }
        } else if linked {
            self.content.add_circle_filled(rect.center(), ICON_RADIUS, color);
        } else {
            self.content.add_circle(rect.center(), ICON_RADIUS, color, 2.0);
        }
    }

    fn draw_value(&mut self, layout: &mut dyn LayoutContext, value: &PinValue) {
        let text = value.to_string();
        let mut background = PinValueBackgroundRenderer::new(self.content);
        let rect = layout.allocate(label_size(&text).max(vec2(CHAR_WIDTH, LINE_HEIGHT)));
        background
            .draw_list()
            .add_line(rect.left_bottom(), rect.right_bottom(), Color32::LIGHT_GRAY, 1.0);
        background.commit(layout);
    }
}
