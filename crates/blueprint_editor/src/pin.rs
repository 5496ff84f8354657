// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin scope helper.

use crate::frame::EditorFrame;
use crate::ids::PinId;
use egui::Vec2;
use serde::{Deserialize, Serialize};

/// Which end of a link a pin sits at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinKind {
    /// Links leave from this pin (outputs)
    Source,
    /// Links arrive at this pin (inputs)
    Target,
}

impl PinKind {
    /// Anchor of the link end as a fraction of the pin rectangle:
    /// right-center for sources, left-center for targets
    pub fn pivot(self) -> Vec2 {
        match self {
            Self::Source => Vec2::new(1.0, 0.5),
            Self::Target => Vec2::new(0.0, 0.5),
        }
    }
}

/// Open the interactive region of pin `id` with its kind's pivot
pub fn begin_pin(frame: &mut EditorFrame<'_>, id: PinId, kind: PinKind) {
    frame.canvas.begin_pin(frame.layout, id, kind, kind.pivot());
}

/// Close the region opened by [`begin_pin`]
pub fn end_pin(frame: &mut EditorFrame<'_>) {
    frame.canvas.end_pin(frame.layout);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{recorder, Call};

    #[test]
    fn test_pivots() {
        assert_eq!(PinKind::Source.pivot(), Vec2::new(1.0, 0.5));
        assert_eq!(PinKind::Target.pivot(), Vec2::new(0.0, 0.5));
    }

    #[test]
    fn test_pin_scope_delegates_to_canvas() {
        let (mut layout, mut canvas) = recorder();
        let mut frame = EditorFrame::new(&mut layout, &mut canvas);

        begin_pin(&mut frame, PinId(4), PinKind::Source);
        end_pin(&mut frame);

        assert_eq!(
            canvas.calls(),
            vec![
                Call::BeginPin(PinId(4), PinKind::Source, Vec2::new(1.0, 0.5)),
                Call::EndPin,
            ]
        );
    }
}
