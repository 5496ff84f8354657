// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in sample blueprint.

use blueprint_script::{Blueprint, LinkError, NodeId, NodeKind};

/// Entry → Branch(condition) → True: Print(ToString(Add(2, 3)))
pub fn blueprint() -> Result<Blueprint, LinkError> {
    let mut blueprint = Blueprint::new("Sample");

    let mut place = |kind: NodeKind, x: f32, y: f32| -> NodeId {
        let id = blueprint.add_node(kind);
        if let Some(node) = blueprint.node_mut(id) {
            node.position = [x, y];
        }
        id
    };

    let entry = place(NodeKind::Entry, 40.0, 60.0);
    let branch = place(NodeKind::Branch, 240.0, 60.0);
    let condition = place(NodeKind::ConstBool(true), 40.0, 200.0);
    let two = place(NodeKind::ConstInt32(2), 40.0, 340.0);
    let three = place(NodeKind::ConstInt32(3), 40.0, 440.0);
    let add = place(NodeKind::AddInt32, 240.0, 360.0);
    let to_string = place(NodeKind::ToString, 440.0, 360.0);
    let print = place(NodeKind::Print, 640.0, 60.0);

    let links = [
        ((entry, 0), (branch, 0)),
        ((condition, 0), (branch, 1)),
        ((branch, 0), (print, 0)),
        ((two, 0), (add, 0)),
        ((three, 0), (add, 1)),
        ((add, 0), (to_string, 0)),
        ((to_string, 0), (print, 1)),
    ];

    for ((from_node, output), (to_node, input)) in links {
        let from = blueprint
            .node(from_node)
            .and_then(|node| node.output(output))
            .map(|pin| pin.id);
        let to = blueprint
            .node(to_node)
            .and_then(|node| node.input(input))
            .map(|pin| pin.id);
        if let (Some(from), Some(to)) = (from, to) {
            blueprint.connect(from, to)?;
        }
    }

    Ok(blueprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_script::{Context, PinId, StepResult};

    #[test]
    fn test_sample_runs() {
        let blueprint = blueprint().unwrap();
        assert_eq!(blueprint.node_count(), 8);
        assert_eq!(blueprint.link_count(), 7);

        let entry = blueprint.entry_nodes().next().unwrap().id;
        let mut context = Context::new();
        context.start(&blueprint, entry).unwrap();
        assert_eq!(context.run(&blueprint, 10).unwrap(), StepResult::Done);
        assert_eq!(context.output(), ["5"]);
    }

    #[test]
    fn test_sample_ids_are_stable() {
        // Demo configurations refer to these ids
        let blueprint = blueprint().unwrap();
        let print = blueprint.nodes().last().unwrap();
        assert_eq!(print.id, NodeId(21));
        assert_eq!(print.inputs[1].id, PinId(23));
        assert!(blueprint.link(blueprint_script::LinkId(29)).is_some());
    }
}
