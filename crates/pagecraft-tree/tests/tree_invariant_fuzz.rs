//! Property/fuzz-style invariants for tree store operations.
//!
//! Random operation streams run against the public `TreeStore` and
//! `DragSession` APIs. After every call the tree must validate; every
//! rejected call must leave the state hash unchanged.

use pagecraft_core::{
    Attributes, CancelReason, ContainerRef, DragEvent, DragSource, DropTarget, NodeId, NodeKind,
};
use pagecraft_tree::{DragSession, TreeError, TreeStore};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn choose_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 0
    }

    fn next_fraction(&mut self) -> f32 {
        (self.next_u64() % 1001) as f32 / 1000.0
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Operation {
    Add {
        kind: NodeKind,
        target: ContainerRef,
        index: usize,
    },
    Remove {
        id: NodeId,
    },
    Move {
        id: NodeId,
        target: ContainerRef,
        index: usize,
    },
    Update {
        id: NodeId,
        label: String,
    },
}

fn node_ids(tree: &TreeStore) -> Vec<NodeId> {
    tree.iter().map(|node| node.id()).collect()
}

/// Root plus every node, leaves included, so nesting rejections get exercised.
fn random_target(tree: &TreeStore, rng: &mut Lcg) -> ContainerRef {
    let ids = node_ids(tree);
    if ids.is_empty() || rng.choose_index(4) == 0 {
        ContainerRef::Root
    } else {
        ContainerRef::Node(ids[rng.choose_index(ids.len())])
    }
}

fn random_index(tree: &TreeStore, target: ContainerRef, rng: &mut Lcg) -> usize {
    let len = tree.children(target).map_or(0, <[NodeId]>::len);
    // One past the valid range so InvalidIndex is reachable.
    rng.choose_index(len + 2)
}

fn random_operation(tree: &TreeStore, rng: &mut Lcg, sequence: usize) -> Operation {
    let ids = node_ids(tree);
    let choice = if ids.is_empty() { 0 } else { rng.choose_index(6) };
    match choice {
        0..=2 => {
            let kind = NodeKind::ALL[rng.choose_index(NodeKind::ALL.len())];
            let target = random_target(tree, rng);
            let index = random_index(tree, target, rng);
            Operation::Add {
                kind,
                target,
                index,
            }
        }
        3 => Operation::Remove {
            id: ids[rng.choose_index(ids.len())],
        },
        4 => {
            let id = ids[rng.choose_index(ids.len())];
            let target = random_target(tree, rng);
            let index = random_index(tree, target, rng);
            Operation::Move { id, target, index }
        }
        _ => Operation::Update {
            id: ids[rng.choose_index(ids.len())],
            label: format!("label-{sequence}"),
        },
    }
}

fn apply(tree: &mut TreeStore, operation: &Operation) -> Result<(), TreeError> {
    match operation {
        Operation::Add {
            kind,
            target,
            index,
        } => tree.add_new_node(*kind, *target, *index).map(|_| ()),
        Operation::Remove { id } => tree.remove_node(*id).map(|_| ()),
        Operation::Move { id, target, index } => tree.move_node(*id, *target, *index),
        Operation::Update { id, label } => tree
            .update_attributes(*id, Attributes::new().with("label", label.as_str()))
            .map(|_| ()),
    }
}

fn assert_tree_invariants(tree: &TreeStore) {
    tree.validate()
        .expect("tree should remain structurally valid");
    let report = tree.invariant_report();
    assert!(
        report.is_clean(),
        "invariant report contains issues: {:?}",
        report.issues
    );
}

fn run_sequence(seed: u64, steps: usize) -> (TreeStore, Vec<Operation>) {
    let mut tree = TreeStore::default();
    let mut rng = Lcg::new(seed);
    let mut applied = Vec::with_capacity(steps);

    for step in 0..steps {
        let operation = random_operation(&tree, &mut rng, step);
        let before = tree.clone();
        let before_hash = tree.state_hash();

        match apply(&mut tree, &operation) {
            Ok(()) => {
                assert_tree_invariants(&tree);
                applied.push(operation);
            }
            Err(err) => {
                assert_eq!(
                    tree.state_hash(),
                    before_hash,
                    "failed op changed state at step {step}, seed={seed}, op={operation:?}, err={err}"
                );
                assert_eq!(tree, before);
            }
        }
    }

    (tree, applied)
}

fn run_drag_sequence(seed: u64, gestures: usize) -> TreeStore {
    let mut tree = TreeStore::default();
    let mut session = DragSession::default();
    let mut rng = Lcg::new(seed);

    for _ in 0..gestures {
        let ids = node_ids(&tree);
        let source = if ids.is_empty() || rng.choose_bool() {
            DragSource::palette(NodeKind::ALL[rng.choose_index(NodeKind::ALL.len())])
        } else {
            DragSource::node(ids[rng.choose_index(ids.len())])
        };
        session
            .apply_event(&mut tree, &DragEvent::Start { active: source })
            .expect("start is valid");

        for _ in 0..rng.choose_index(4) {
            let over = random_drop_target(&tree, &mut rng);
            let before = tree.state_hash();
            session
                .apply_event(
                    &mut tree,
                    &DragEvent::Over {
                        active: source,
                        over,
                        fraction: rng.next_fraction(),
                    },
                )
                .expect("over is valid");
            assert_eq!(tree.state_hash(), before, "hover must not mutate");
        }

        let event = if rng.choose_index(5) == 0 {
            DragEvent::Cancel {
                active: source,
                reason: CancelReason::PointerLost,
            }
        } else {
            DragEvent::End {
                active: source,
                over: random_drop_target(&tree, &mut rng),
                fraction: rng.next_fraction(),
            }
        };
        let _ = session
            .apply_event(&mut tree, &event)
            .expect("resolved drops always commit");
        assert!(!session.is_active());
        assert_tree_invariants(&tree);
    }

    tree
}

fn random_drop_target(tree: &TreeStore, rng: &mut Lcg) -> Option<DropTarget> {
    let ids = node_ids(tree);
    match rng.choose_index(6) {
        0 => None,
        1 => Some(DropTarget::Canvas),
        _ if ids.is_empty() => Some(DropTarget::Canvas),
        _ => Some(DropTarget::node(ids[rng.choose_index(ids.len())])),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn tree_random_operation_sequences_preserve_invariants(
        seed in any::<u64>(),
        steps in 20usize..120,
    ) {
        let (tree, _) = run_sequence(seed, steps);
        assert_tree_invariants(&tree);
    }

    #[test]
    fn tree_random_operation_sequences_replay_deterministically(
        seed in any::<u64>(),
        steps in 20usize..80,
    ) {
        let (final_tree, operations) = run_sequence(seed, steps);

        let mut replay_tree = TreeStore::default();
        for operation in &operations {
            apply(&mut replay_tree, operation).expect("replay operation should succeed");
        }

        prop_assert_eq!(replay_tree.state_hash(), final_tree.state_hash());
        prop_assert_eq!(replay_tree.snapshot(), final_tree.snapshot());
    }

    #[test]
    fn random_drag_gestures_preserve_invariants(
        seed in any::<u64>(),
        gestures in 10usize..60,
    ) {
        let tree = run_drag_sequence(seed, gestures);
        assert_tree_invariants(&tree);
    }
}

#[test]
fn tree_fuzz_seed_corpus_preserves_invariants() {
    let seeds = [
        0_u64,
        1,
        2,
        3,
        5,
        8,
        13,
        21,
        34,
        55,
        89,
        144,
        u32::MAX as u64,
        (u32::MAX as u64) + 1,
        u64::MAX - 1,
        u64::MAX,
    ];

    for seed in seeds {
        let (tree, _) = run_sequence(seed, 180);
        assert_tree_invariants(&tree);
        let _ = run_drag_sequence(seed, 60);
    }
}

#[test]
fn removal_never_leaves_dangling_references() {
    let (mut tree, _) = run_sequence(7, 150);
    while let Some(&first) = tree.root_children().first() {
        let removed = tree.remove_node(first).expect("root child exists");
        for id in &removed {
            assert!(!tree.contains(*id));
        }
        for node in tree.iter() {
            assert!(node.children().iter().all(|child| !removed.contains(child)));
        }
        assert_tree_invariants(&tree);
    }
    assert!(tree.is_empty());
}
