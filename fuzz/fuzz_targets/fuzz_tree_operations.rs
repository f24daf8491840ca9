#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use pagecraft_core::{Attributes, ContainerRef, DragEvent, DragSource, DropTarget, NodeId, NodeKind};
use pagecraft_tree::{DragSession, TreeStore};

#[derive(Debug, Arbitrary)]
enum Op {
    Add { kind: u8, target: u8, index: u8 },
    Remove { node: u8 },
    Move { node: u8, target: u8, index: u8 },
    Update { node: u8, value: u8 },
    Drag { source: u8, palette: bool, over: u8, fraction: u16 },
}

fn pick_node(tree: &TreeStore, selector: u8) -> Option<NodeId> {
    let ids: Vec<NodeId> = tree.iter().map(|node| node.id()).collect();
    if ids.is_empty() {
        return None;
    }
    Some(ids[selector as usize % ids.len()])
}

fn pick_container(tree: &TreeStore, selector: u8) -> ContainerRef {
    // Selector 0 is the root; anything else picks a node, leaves included.
    match selector {
        0 => ContainerRef::Root,
        _ => pick_node(tree, selector).map_or(ContainerRef::Root, ContainerRef::Node),
    }
}

fn pick_kind(selector: u8) -> NodeKind {
    NodeKind::ALL[selector as usize % NodeKind::ALL.len()]
}

fuzz_target!(|data: &[u8]| {
    let mut input = Unstructured::new(data);
    let mut tree = TreeStore::default();
    let mut session = DragSession::default();

    // Cap operation count to keep runs fast.
    for _ in 0..256 {
        let Ok(op) = Op::arbitrary(&mut input) else {
            break;
        };
        let before = tree.state_hash();

        let result = match op {
            Op::Add { kind, target, index } => tree
                .add_new_node(pick_kind(kind), pick_container(&tree, target), index as usize)
                .map(|_| ()),
            Op::Remove { node } => match pick_node(&tree, node) {
                Some(id) => tree.remove_node(id).map(|_| ()),
                None => Ok(()),
            },
            Op::Move { node, target, index } => match pick_node(&tree, node) {
                Some(id) => tree.move_node(id, pick_container(&tree, target), index as usize),
                None => Ok(()),
            },
            Op::Update { node, value } => match pick_node(&tree, node) {
                Some(id) => tree
                    .update_attributes(id, Attributes::new().with("value", value))
                    .map(|_| ()),
                None => Ok(()),
            },
            Op::Drag {
                source,
                palette,
                over,
                fraction,
            } => {
                let source = match pick_node(&tree, source) {
                    Some(id) if !palette => DragSource::node(id),
                    _ => DragSource::palette(pick_kind(source)),
                };
                let over = match pick_container(&tree, over) {
                    ContainerRef::Root => DropTarget::Canvas,
                    ContainerRef::Node(id) => DropTarget::node(id),
                };
                let fraction = f32::from(fraction) / f32::from(u16::MAX);
                let _ = session.apply_event(&mut tree, &DragEvent::Start { active: source });
                let end = DragEvent::End {
                    active: source,
                    over: Some(over),
                    fraction,
                };
                let ended = session.apply_event(&mut tree, &end);
                assert!(ended.is_ok(), "resolved drop failed to commit: {ended:?}");
                assert!(!session.is_active(), "session stayed active after end");
                Ok(())
            }
        };

        if result.is_err() {
            assert_eq!(tree.state_hash(), before, "failed operation mutated the tree");
        }
        if let Err(err) = tree.validate() {
            panic!("tree invariant broken after {result:?}: {err}");
        }
    }
});
