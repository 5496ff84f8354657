// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless editor session.
//!
//! Runs the editor frame loop over a blueprint: lay out and draw every node,
//! declare links, replay scheduled user actions through the create/delete
//! queries and step the evaluator. Every frame is summarized in a
//! [`FrameReport`].

use crate::blueprint_view::BlueprintView;
use crate::config::{ConfigError, DemoAction, DemoConfig};
use blueprint_editor::{
    BlueprintNodeBuilder, DebugOverlay, DrawList, EditorCanvas, EditorFrame, EvaluationTrace,
    HeaderTexture, ItemBuilder, ItemDeleter, NodeCanvas, StackLayout,
};
use blueprint_script::{
    Blueprint, Context, ExecutionState, LinkError, LinkId, NodeId, NodeKind, PinId,
};
use egui::{pos2, vec2, Color32, Rect, TextureId};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Horizontal gap between a node and one created from its pin
const NEW_NODE_OFFSET: f32 = 60.0;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Blueprint file could not be parsed
    #[error("Invalid blueprint: {0}")]
    Blueprint(#[from] ron::error::SpannedError),

    /// Configuration could not be loaded or saved
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Built-in sample could not be linked
    #[error("Link error: {0}")]
    Link(#[from] LinkError),
}

/// Where a node ended up in a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeReport {
    /// Top-left corner
    pub position: [f32; 2],
    /// Laid out size
    pub size: [f32; 2],
}

/// Summary of one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    /// Frame number, starting at 0
    pub frame: u32,
    /// Node geometry keyed by node id
    pub nodes: IndexMap<u32, NodeReport>,
    /// Links declared on the canvas
    pub link_count: usize,
    /// Shapes painted this frame
    pub shape_count: usize,
    /// Evaluator state after the frame's steps
    pub trace: EvaluationTrace,
    /// Printed lines of the current run
    pub output: Vec<String>,
    /// Interactions resolved this frame
    pub events: Vec<String>,
}

/// Editor state for a headless run
pub struct DemoSession {
    config: DemoConfig,
    blueprint: Blueprint,
    layout: StackLayout,
    canvas: EditorCanvas,
    builder: BlueprintNodeBuilder,
    overlay: DebugOverlay,
    context: Context,
    content: DrawList,
    frame: u32,
    events: Vec<String>,
    reports: Vec<FrameReport>,
}

impl DemoSession {
    /// Set up a session editing `blueprint`
    pub fn new(config: DemoConfig, blueprint: Blueprint) -> Self {
        let [width, height] = config.viewport;
        let layout = StackLayout::new(
            config.layout_style,
            Rect::from_min_size(pos2(0.0, 0.0), vec2(width, height)),
        );

        let mut canvas = EditorCanvas::new(config.canvas_style);
        for node in blueprint.nodes() {
            canvas.set_node_position(node.id.into(), pos2(node.position[0], node.position[1]));
        }

        let header_texture = config
            .header_texture
            .map(|size| HeaderTexture::new(TextureId::User(1), size.width, size.height));

        let mut context = Context::new();
        let mut overlay = DebugOverlay::new();
        overlay.attach(&mut context);

        let mut session = Self {
            config,
            blueprint,
            layout,
            canvas,
            builder: BlueprintNodeBuilder::new(header_texture),
            overlay,
            context,
            content: DrawList::new(),
            frame: 0,
            events: Vec::new(),
            reports: Vec::new(),
        };
        session.restart();
        session
    }

    /// Load the configured blueprint, or the built-in sample
    pub fn from_config(config: DemoConfig) -> Result<Self, SessionError> {
        let blueprint = match &config.blueprint_path {
            Some(path) => {
                tracing::info!("Loading blueprint from {}", path.display());
                Blueprint::from_ron(&std::fs::read_to_string(path)?)?
            }
            None => crate::sample::blueprint()?,
        };
        Ok(Self::new(config, blueprint))
    }

    /// Blueprint being edited
    #[cfg(test)]
    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    /// Canvas state
    #[cfg(test)]
    pub fn canvas(&self) -> &EditorCanvas {
        &self.canvas
    }

    /// Reports of the frames run so far
    #[cfg(test)]
    pub fn reports(&self) -> &[FrameReport] {
        &self.reports
    }

    /// Run all configured frames
    pub fn run(&mut self) {
        for _ in 0..self.config.frames {
            self.run_frame();
        }
        tracing::info!(
            "Ran {} frame(s), {} node(s) and {} link(s) remain",
            self.frame,
            self.blueprint.node_count(),
            self.blueprint.link_count()
        );
    }

    /// Run a single frame
    pub fn run_frame(&mut self) {
        let _span = tracing::debug_span!("frame", frame = self.frame).entered();

        self.layout.begin_frame();
        self.canvas.begin_frame();
        self.content.clear();
        {
            let mut frame = EditorFrame::new(&mut self.layout, &mut self.canvas);
            let mut view = BlueprintView {
                builder: &mut self.builder,
                overlay: &mut self.overlay,
                content: &mut self.content,
            };
            view.draw(&mut frame, &self.blueprint, &self.context);
        }
        self.declare_links();
        self.layout.end_frame();

        let actions: Vec<DemoAction> = self.config.actions_at(self.frame).collect();
        for action in actions {
            self.apply(action);
        }
        self.handle_create();
        self.handle_delete();
        self.evaluate();

        let report = self.report();
        self.reports.push(report);
        self.frame += 1;
    }

    /// Write the frame reports as JSON
    pub fn write_report(&self, path: &Path) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(&self.reports)?;
        std::fs::write(path, json)?;
        tracing::info!("Wrote frame report to {}", path.display());
        Ok(())
    }

    fn declare_links(&mut self) {
        let thickness = self.canvas.style().link_thickness;
        for link in self.blueprint.links() {
            let color = self
                .blueprint
                .pin(link.from_pin)
                .map(|pin| {
                    let [r, g, b] = pin.pin_type.color();
                    Color32::from_rgb(r, g, b)
                })
                .unwrap_or(Color32::WHITE);
            self.canvas.link(
                link.id.into(),
                link.from_pin.into(),
                link.to_pin.into(),
                color,
                thickness,
            );
        }
    }

    fn apply(&mut self, action: DemoAction) {
        tracing::debug!(?action, "replaying action");
        match action {
            DemoAction::Connect { from, to } => {
                self.canvas
                    .request_link(PinId(from).into(), PinId(to).into());
            }
            DemoAction::CreateNodeFrom { pin } => self.canvas.request_node(PinId(pin).into()),
            DemoAction::DeleteNode { node } => {
                self.canvas.request_delete_node(NodeId(node).into());
            }
            DemoAction::DeleteLink { link } => {
                if !self.canvas.request_delete_link(LinkId(link).into()) {
                    tracing::warn!("Link {link} is not on the canvas");
                }
            }
            DemoAction::MoveNode { node, x, y } => {
                if let Some(node) = self.blueprint.node_mut(NodeId(node)) {
                    node.position = [x, y];
                    self.canvas.set_node_position(node.id.into(), pos2(x, y));
                } else {
                    tracing::warn!("Node {node} does not exist");
                }
            }
        }
    }

    fn handle_create(&mut self) {
        if let Some(pin) = self.resolve_create() {
            self.create_node_from(pin);
        }
    }

    /// Resolve this frame's create request. Returns the pin a new node
    /// should be created from.
    fn resolve_create(&mut self) -> Option<PinId> {
        let mut builder = ItemBuilder::new(&mut self.canvas);
        if !builder.is_active() {
            return None;
        }

        if let Some(request) = builder.query_new_link() {
            let (Some(start), Some(end)) = (script_pin(request.start), script_pin(request.end))
            else {
                request.reject();
                return None;
            };
            match self.blueprint.check_link(start, end) {
                Ok(_) => {
                    if request.accept() {
                        if let Ok(link) = self.blueprint.connect(start, end) {
                            self.events
                                .push(format!("linked {} -> {} as {}", start.0, end.0, link.0));
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Rejected link {} -> {}: {}", start.0, end.0, e);
                    self.events
                        .push(format!("rejected link {} -> {}: {}", start.0, end.0, e));
                    request.reject();
                }
            }
        }

        let request = builder.query_new_node()?;
        let Some(pin) = script_pin(request.pin).filter(|pin| self.blueprint.pin(*pin).is_some())
        else {
            request.reject();
            return None;
        };
        request.accept().then_some(pin)
    }

    fn create_node_from(&mut self, pin: PinId) {
        let anchor = self
            .blueprint
            .pin(pin)
            .and_then(|pin| self.canvas.node_bounds(pin.node.into()));

        let node_id = self.blueprint.add_node(NodeKind::Print);
        let position = anchor
            .map(|bounds| pos2(bounds.right() + NEW_NODE_OFFSET, bounds.top()))
            .unwrap_or_default();
        if let Some(node) = self.blueprint.node_mut(node_id) {
            node.position = [position.x, position.y];
        }
        self.canvas.set_node_position(node_id.into(), position);
        self.events.push(format!("created node {}", node_id.0));

        // Link the new node to the first pin that accepts the drag
        let target = self.blueprint.node(node_id).and_then(|node| {
            node.pins()
                .find(|candidate| self.blueprint.check_link(pin, candidate.id).is_ok())
                .map(|candidate| candidate.id)
        });
        if let Some(target) = target {
            if let Ok(link) = self.blueprint.connect(pin, target) {
                self.events
                    .push(format!("linked {} -> {} as {}", pin.0, target.0, link.0));
            }
        }
    }

    fn handle_delete(&mut self) {
        let mut deleter = ItemDeleter::new(&mut self.canvas);
        if !deleter.is_active() {
            return;
        }

        while let Some(request) = deleter.query_deleted_node() {
            let Some(node) = u32::try_from(request.node.0).ok().map(NodeId) else {
                request.reject();
                continue;
            };
            if request.accept() && self.blueprint.remove_node(node).is_some() {
                self.events.push(format!("deleted node {}", node.0));
            }
        }

        while let Some(request) = deleter.query_deleted_link() {
            let Some(link) = u32::try_from(request.link.0).ok().map(LinkId) else {
                request.reject();
                continue;
            };
            // Links of deleted nodes are already gone from the blueprint
            if request.accept() && self.blueprint.disconnect(link).is_some() {
                self.events.push(format!("deleted link {}", link.0));
            }
        }
    }

    fn evaluate(&mut self) {
        if self.context.state() == ExecutionState::Done && self.config.restart_when_done {
            self.restart();
        }

        for _ in 0..self.config.steps_per_frame {
            match self.context.step(&self.blueprint) {
                Ok(_) if self.context.state() == ExecutionState::Done => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Evaluation failed: {}", e);
                    self.events.push(format!("evaluation failed: {e}"));
                    self.restart();
                    break;
                }
            }
        }
    }

    fn restart(&mut self) {
        let Some(entry) = self.blueprint.entry_nodes().next().map(|node| node.id) else {
            tracing::debug!("No entry node, nothing to run");
            return;
        };
        if let Err(e) = self.context.start(&self.blueprint, entry) {
            tracing::warn!("Failed to start execution: {}", e);
        }
    }

    fn report(&mut self) -> FrameReport {
        let nodes = self
            .blueprint
            .nodes()
            .filter_map(|node| {
                let bounds = self.canvas.node_bounds(node.id.into())?;
                Some((
                    node.id.0,
                    NodeReport {
                        position: [bounds.min.x, bounds.min.y],
                        size: [bounds.width(), bounds.height()],
                    },
                ))
            })
            .collect();

        FrameReport {
            frame: self.frame,
            nodes,
            link_count: self.canvas.link_count(),
            shape_count: self.canvas.shapes().len() + self.content.len(),
            trace: self.overlay.trace(),
            output: self.context.output().to_vec(),
            events: std::mem::take(&mut self.events),
        }
    }
}

impl Drop for DemoSession {
    fn drop(&mut self) {
        self.overlay.detach(&mut self.context);
    }
}

/// Canvas pin ids map onto the script's id space
fn script_pin(id: blueprint_editor::PinId) -> Option<PinId> {
    u32::try_from(id.0).ok().map(PinId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScheduledAction;

    fn session(actions: Vec<(u32, DemoAction)>) -> DemoSession {
        let config = DemoConfig {
            actions: actions
                .into_iter()
                .map(|(frame, action)| ScheduledAction { frame, action })
                .collect(),
            ..DemoConfig::default()
        };
        DemoSession::from_config(config).unwrap()
    }

    #[test]
    fn test_renders_sample() {
        let mut session = session(Vec::new());
        session.run_frame();

        let report = &session.reports()[0];
        assert_eq!(report.nodes.len(), 8);
        assert_eq!(report.link_count, 7);
        assert!(report.shape_count > 7);
        assert!(report.events.is_empty());
    }

    #[test]
    fn test_evaluation_prints_sum() {
        let mut session = session(Vec::new());
        session.run();

        assert_eq!(session.reports().len(), 8);
        assert!(session
            .reports()
            .iter()
            .any(|report| report.output == ["5"]));
        assert!(session
            .reports()
            .iter()
            .any(|report| report.trace.current_node.is_some()));
    }

    #[test]
    fn test_connect_to_linked_pin_is_rejected() {
        let mut session = session(vec![(0, DemoAction::Connect { from: 11, to: 19 })]);
        session.run_frame();

        assert_eq!(session.blueprint().link_count(), 7);
        assert!(session.reports()[0].events[0].starts_with("rejected link 11 -> 19"));
        assert!(!session.canvas().has_pending());
    }

    #[test]
    fn test_delete_then_relink() {
        let mut session = session(vec![
            (0, DemoAction::DeleteLink { link: 29 }),
            (1, DemoAction::Connect { from: 13, to: 16 }),
        ]);
        session.run_frame();
        assert!(session.blueprint().link(LinkId(29)).is_none());
        assert!(!session.blueprint().is_linked(PinId(16)));

        session.run_frame();
        assert!(session.blueprint().is_linked(PinId(16)));
        assert_eq!(session.blueprint().link_count(), 7);
    }

    #[test]
    fn test_create_node_from_pin() {
        let mut session = session(vec![(0, DemoAction::CreateNodeFrom { pin: 7 })]);
        session.run_frame();

        let blueprint = session.blueprint();
        assert_eq!(blueprint.node_count(), 9);
        let created = blueprint.nodes().last().unwrap();
        assert_eq!(created.kind, NodeKind::Print);
        let flow_in = created.flow_input().unwrap().id;
        assert_eq!(blueprint.link_to(flow_in).unwrap().from_pin, PinId(7));

        // Placed right of the branch node
        let branch = session.canvas().node_bounds(NodeId(3).into()).unwrap();
        assert_eq!(created.position[0], branch.right() + NEW_NODE_OFFSET);

        session.run_frame();
        assert_eq!(session.reports()[1].nodes.len(), 9);
    }

    #[test]
    fn test_delete_node_removes_links() {
        let mut session = session(vec![(0, DemoAction::DeleteNode { node: 12 })]);
        session.run_frame();

        let blueprint = session.blueprint();
        assert!(blueprint.node(NodeId(12)).is_none());
        assert!(!blueprint.is_linked(PinId(16)));
        assert_eq!(blueprint.link_count(), 6);
        assert!(session.canvas().node_bounds(NodeId(12).into()).is_none());
        assert_eq!(session.reports()[0].events[0], "deleted node 12");
    }

    #[test]
    fn test_move_node() {
        let mut session = session(vec![(
            0,
            DemoAction::MoveNode {
                node: 21,
                x: 800.0,
                y: 100.0,
            },
        )]);
        session.run_frame();
        session.run_frame();

        assert_eq!(session.reports()[1].nodes[&21].position, [800.0, 100.0]);
    }
}
