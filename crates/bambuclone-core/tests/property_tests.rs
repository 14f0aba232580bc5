//! Property-based tests for inheritance resolution and identity tokens
//!
//! 1. Resolved profiles never carry `inherits`
//! 2. Nearer descendants win every shared field
//! 3. The resolved field set is the union of the chain
//! 4. Identity tokens are deterministic hex digests

use bambuclone_core::{identity_token, ProfileIndex};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

// ============================================================================
// Strategies
// ============================================================================

/// Setting keys, kept to a small pool so chains share fields
fn field_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("layer_height".to_string()),
        Just("wall_loops".to_string()),
        Just("sparse_infill_density".to_string()),
        Just("top_shell_layers".to_string()),
        Just("print_speed".to_string()),
        "[a-z_]{3,12}",
    ]
    .prop_filter("reserved keys", |k| {
        !matches!(k.as_str(), "name" | "type" | "inherits")
    })
}

/// Own fields of one profile in a chain
fn own_fields_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(field_key_strategy(), "[0-9.]{1,5}", 0..6)
}

/// A chain of profiles, root first
fn chain_strategy() -> impl Strategy<Value = Vec<BTreeMap<String, String>>> {
    prop::collection::vec(own_fields_strategy(), 1..6)
}

/// Write the chain as `p0 <- p1 <- ... <- pN` and return the index
fn write_chain(
    root: &std::path::Path,
    chain: &[BTreeMap<String, String>],
) -> ProfileIndex {
    for (depth, own) in chain.iter().enumerate() {
        let mut obj = Map::new();
        obj.insert("name".into(), json!(format!("p{depth}")));
        obj.insert("type".into(), json!("process"));
        if depth > 0 {
            obj.insert("inherits".into(), json!(format!("p{}", depth - 1)));
        }
        for (k, v) in own {
            obj.insert(k.clone(), json!(v));
        }
        let path = root.join(format!("system/process/p{depth}.json"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, serde_json::to_string(&Value::Object(obj)).unwrap()).unwrap();
    }
    ProfileIndex::build(root).unwrap()
}

// ============================================================================
// Resolution invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn resolved_profile_never_has_inherits(chain in chain_strategy()) {
        let dir = tempdir().unwrap();
        let index = write_chain(dir.path(), &chain);

        for record in index.records() {
            let flat = index.resolve(record).unwrap();
            prop_assert!(flat.get("inherits").is_none());
        }
    }

    #[test]
    fn resolved_profile_is_nearest_wins_union(chain in chain_strategy()) {
        let dir = tempdir().unwrap();
        let index = write_chain(dir.path(), &chain);
        let leaf = format!("p{}", chain.len() - 1);

        let mut expected: BTreeMap<String, String> = BTreeMap::new();
        for own in &chain {
            for (k, v) in own {
                expected.insert(k.clone(), v.clone());
            }
        }

        let flat = index.resolve(index.find_process(&leaf).unwrap()).unwrap();
        prop_assert_eq!(flat.name(), Some(leaf.as_str()));
        prop_assert_eq!(flat.fields().len(), expected.len() + 2);
        for (k, v) in &expected {
            prop_assert_eq!(flat.get(k).cloned(), Some(json!(v)));
        }

        // The leaf's own fields always survive untouched.
        for (k, v) in chain.last().unwrap() {
            prop_assert_eq!(flat.get(k).cloned(), Some(json!(v)));
        }
    }

    #[test]
    fn identity_token_is_deterministic(name in "\\PC{0,40}") {
        let a = identity_token(&name);
        let b = identity_token(&name);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), 64);
        prop_assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn identity_tokens_differ_for_different_names(a in "[a-zA-Z0-9 ]{1,20}", b in "[a-zA-Z0-9 ]{1,20}") {
        prop_assume!(a != b);
        prop_assert_ne!(identity_token(&a), identity_token(&b));
    }
}
