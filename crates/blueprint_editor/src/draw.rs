// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recorded draw commands with channel splitting.
//!
//! A [`DrawList`] collects commands in submission order. Splitting it opens
//! a set of channels that are drawn in channel order once merged, which lets
//! a widget emit a background after the content it sits behind.

use egui::epaint::RectShape;
use egui::{Color32, Pos2, Rect, Rounding, Shape, Stroke, TextureId};

/// Which corners of a rectangle are rounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CornerFlags(u8);

impl CornerFlags {
    /// No rounded corners
    pub const NONE: Self = Self(0);
    /// Top-left corner
    pub const TOP_LEFT: Self = Self(1);
    /// Top-right corner
    pub const TOP_RIGHT: Self = Self(2);
    /// Bottom-left corner
    pub const BOTTOM_LEFT: Self = Self(4);
    /// Bottom-right corner
    pub const BOTTOM_RIGHT: Self = Self(8);
    /// Both top corners
    pub const TOP: Self = Self(1 | 2);
    /// Every corner
    pub const ALL: Self = Self(1 | 2 | 4 | 8);

    /// Whether all corners in `other` are set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Rounding with `radius` on the selected corners
    pub fn rounding(self, radius: f32) -> Rounding {
        let pick = |corner: Self| if self.contains(corner) { radius } else { 0.0 };
        Rounding {
            nw: pick(Self::TOP_LEFT),
            ne: pick(Self::TOP_RIGHT),
            sw: pick(Self::BOTTOM_LEFT),
            se: pick(Self::BOTTOM_RIGHT),
        }
    }
}

impl std::ops::BitOr for CornerFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Pack an unmultiplied float color into 8-bit sRGBA
pub fn pack_color(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
}

/// A single recorded primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Textured rectangle
    Image {
        /// Texture to sample
        texture: TextureId,
        /// Screen rectangle
        rect: Rect,
        /// Normalized texture coordinates
        uv: Rect,
        /// Multiplied with the texture
        tint: Color32,
        /// Corner rounding
        rounding: Rounding,
    },
    /// Line segment
    Line {
        /// End points
        points: [Pos2; 2],
        /// Width and color
        stroke: Stroke,
    },
    /// Rectangle outline
    Rect {
        /// Screen rectangle
        rect: Rect,
        /// Corner rounding
        rounding: Rounding,
        /// Width and color
        stroke: Stroke,
    },
    /// Filled rectangle
    RectFilled {
        /// Screen rectangle
        rect: Rect,
        /// Corner rounding
        rounding: Rounding,
        /// Fill color
        fill: Color32,
    },
    /// Circle, filled and/or outlined
    Circle {
        /// Center
        center: Pos2,
        /// Radius
        radius: f32,
        /// Fill color, transparent for an outline
        fill: Color32,
        /// Outline
        stroke: Stroke,
    },
}

impl DrawCommand {
    /// Convert to an egui shape
    pub fn to_shape(&self) -> Shape {
        match *self {
            Self::Image {
                texture,
                rect,
                uv,
                tint,
                rounding,
            } => {
                let mut shape = RectShape::filled(rect, rounding, tint);
                shape.fill_texture_id = texture;
                shape.uv = uv;
                Shape::Rect(shape)
            }
            Self::Line { points, stroke } => Shape::line_segment(points, stroke),
            Self::Rect {
                rect,
                rounding,
                stroke,
            } => Shape::rect_stroke(rect, rounding, stroke),
            Self::RectFilled {
                rect,
                rounding,
                fill,
            } => Shape::rect_filled(rect, rounding, fill),
            Self::Circle {
                center,
                radius,
                fill,
                stroke,
            } => Shape::Circle(egui::epaint::CircleShape {
                center,
                radius,
                fill,
                stroke,
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct Split {
    channels: Vec<Vec<DrawCommand>>,
    current: usize,
}

/// Ordered list of draw commands.
///
/// Splits nest: `merge` always closes the innermost split and appends its
/// channels to whatever was current when it was opened.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
    splits: Vec<Split>,
}

impl DrawList {
    /// Create an empty draw list
    pub fn new() -> Self {
        Self::default()
    }

    fn target(&mut self) -> &mut Vec<DrawCommand> {
        match self.splits.last_mut() {
            Some(split) => &mut split.channels[split.current],
            None => &mut self.commands,
        }
    }

    /// Append a command to the current channel
    pub fn push(&mut self, command: DrawCommand) {
        self.target().push(command);
    }

    /// Draw a texture stretched over `min..max`
    pub fn add_image(
        &mut self,
        texture: TextureId,
        min: Pos2,
        max: Pos2,
        uv_min: Pos2,
        uv_max: Pos2,
        tint: Color32,
        rounding: Rounding,
    ) {
        self.push(DrawCommand::Image {
            texture,
            rect: Rect::from_min_max(min, max),
            uv: Rect::from_min_max(uv_min, uv_max),
            tint,
            rounding,
        });
    }

    /// Draw a line segment
    pub fn add_line(&mut self, from: Pos2, to: Pos2, color: Color32, thickness: f32) {
        self.push(DrawCommand::Line {
            points: [from, to],
            stroke: Stroke::new(thickness, color),
        });
    }

    /// Draw a rectangle outline
    pub fn add_rect(&mut self, rect: Rect, color: Color32, rounding: Rounding, thickness: f32) {
        self.push(DrawCommand::Rect {
            rect,
            rounding,
            stroke: Stroke::new(thickness, color),
        });
    }

    /// Draw a filled rectangle
    pub fn add_rect_filled(&mut self, rect: Rect, color: Color32, rounding: Rounding) {
        self.push(DrawCommand::RectFilled {
            rect,
            rounding,
            fill: color,
        });
    }

    /// Draw a filled circle
    pub fn add_circle_filled(&mut self, center: Pos2, radius: f32, color: Color32) {
        self.push(DrawCommand::Circle {
            center,
            radius,
            fill: color,
            stroke: Stroke::NONE,
        });
    }

    /// Draw a circle outline
    pub fn add_circle(&mut self, center: Pos2, radius: f32, color: Color32, thickness: f32) {
        self.push(DrawCommand::Circle {
            center,
            radius,
            fill: Color32::TRANSPARENT,
            stroke: Stroke::new(thickness, color),
        });
    }

    /// Open `count` channels; drawing continues in channel 0
    pub fn split(&mut self, count: usize) {
        self.splits.push(Split {
            channels: vec![Vec::new(); count.max(1)],
            current: 0,
        });
    }

    /// Select the channel subsequent commands go to
    pub fn set_channel(&mut self, channel: usize) {
        match self.splits.last_mut() {
            Some(split) => {
                debug_assert!(channel < split.channels.len(), "channel {channel} out of range");
                split.current = channel.min(split.channels.len() - 1);
            }
            None => debug_assert!(false, "set_channel on a draw list that is not split"),
        }
    }

    /// Channel currently drawn to, if split
    pub fn current_channel(&self) -> Option<usize> {
        self.splits.last().map(|split| split.current)
    }

    /// Number of open splits
    pub fn split_depth(&self) -> usize {
        self.splits.len()
    }

    /// Close the innermost split, appending its channels in order
    pub fn merge(&mut self) {
        let Some(split) = self.splits.pop() else {
            debug_assert!(false, "merge on a draw list that is not split");
            return;
        };
        let merged = split.channels.concat();
        self.target().extend(merged);
    }

    /// Merged commands; channels still open are not included
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of merged commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command has been merged
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Remove every command and open split
    pub fn clear(&mut self) {
        self.commands.clear();
        self.splits.clear();
    }

    /// Merged commands as egui shapes
    pub fn shapes(&self) -> impl Iterator<Item = Shape> + '_ {
        self.commands.iter().map(DrawCommand::to_shape)
    }
}
