#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use pagecraft_tree::{NodeRegistry, TreeSnapshot, TreeStore};

fuzz_target!(|data: &[u8]| {
    // Cap length to keep fuzzing fast.
    if data.len() > 4096 {
        return;
    }
    let Ok(snapshot) = serde_json::from_slice::<TreeSnapshot>(data) else {
        return;
    };

    // Diagnostics must never panic, even on malformed trees.
    let report = snapshot.invariant_report(&NodeRegistry::standard());

    match TreeStore::from_snapshot(Arc::new(NodeRegistry::standard()), snapshot) {
        Ok(tree) => {
            assert!(report.is_clean(), "loaded tree had issues: {:?}", report.issues);
            assert!(tree.invariant_report().is_clean());
            // Reload of our own output must succeed and hash identically.
            let again = TreeStore::from_snapshot(tree.registry_handle(), tree.snapshot())
                .expect("reload of a valid tree");
            assert_eq!(again.state_hash(), tree.state_hash());
        }
        Err(_) => assert!(!report.is_clean(), "rejected tree had a clean report"),
    }
});
