//! Property tests for the compute/apply pair.

use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use crate::{apply, compute, compute_edit, validate, DiffError};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z ]{0,6}".prop_map(Value::from),
    ]
}

/// Arbitrary documents. Keys never spell `id`, so arrays stay positional.
fn document() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-hj-z][a-z]{0,3}", inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Same-shape edit of `value`: flips a subset of its scalars, chosen by `seed`.
fn mutate(value: &Value, seed: &mut u64) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, child)| (key.clone(), mutate(child, seed)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|child| mutate(child, seed)).collect()),
        leaf => {
            let flip = *seed & 1 == 1;
            *seed = seed.rotate_right(1) ^ 0x9e37_79b9_7f4a_7c15;
            if !flip {
                return leaf.clone();
            }
            match leaf {
                Value::Bool(b) => Value::Bool(!b),
                Value::Number(n) => Value::from(n.as_i64().unwrap_or(0).wrapping_add(1)),
                Value::String(s) => Value::from(format!("{s}~")),
                other => other.clone(),
            }
        }
    }
}

/// Record lists over a small id space, so duplicate ids occur.
fn record_list() -> impl Strategy<Value = Value> {
    prop::collection::vec((0u8..6, scalar()), 1..8).prop_map(|items| {
        Value::Array(
            items
                .into_iter()
                .map(|(id, t)| json!({"id": id, "t": t}))
                .collect(),
        )
    })
}

/// Same-length edit of a record list: flips some non-id values, and
/// optionally renames one record and swaps two.
fn edit_records(
    list: &Value,
    seed: u64,
    rename: Option<(usize, u8)>,
    swap: Option<(usize, usize)>,
) -> Value {
    let mut items = mutate(list, &mut seed.clone())
        .as_array()
        .cloned()
        .unwrap_or_default();
    for (item, before) in items.iter_mut().zip(ids(list)) {
        item["id"] = before;
    }
    let len = items.len();
    if let Some((i, id)) = rename {
        items[i % len]["id"] = json!(id);
    }
    if let Some((i, j)) = swap {
        items.swap(i % len, j % len);
    }
    Value::Array(items)
}

fn ids(list: &Value) -> Vec<Value> {
    list.as_array()
        .map(|items| items.iter().map(|item| item["id"].clone()).collect())
        .unwrap_or_default()
}

fn records(ids: &BTreeSet<u8>, tag: &str) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| json!({"id": id, "t": format!("{tag}{}", id % 3)}))
            .collect(),
    )
}

fn sorted_by_id(value: &Value) -> Vec<Value> {
    let mut items = value.as_array().cloned().unwrap_or_default();
    items.sort_by_key(|item| item["id"].as_u64());
    items
}

proptest! {
    #[test]
    fn comparing_a_document_with_itself_yields_no_diff(doc in document()) {
        prop_assert!(compute(&doc, &doc).unwrap().is_none());
    }

    #[test]
    fn same_shape_edits_round_trip(doc in document(), seed in any::<u64>()) {
        let edited = mutate(&doc, &mut seed.clone());
        prop_assert!(validate(&doc, &edited));
        let patched = match compute(&doc, &edited).unwrap() {
            Some(diff) => {
                prop_assert!(!diff.is_empty());
                apply(&doc, &diff).value
            }
            None => doc.clone(),
        };
        prop_assert_eq!(patched, edited);
    }

    #[test]
    fn same_shape_replay_is_idempotent(doc in document(), seed in any::<u64>()) {
        let edited = mutate(&doc, &mut seed.clone());
        if let Some(diff) = compute(&doc, &edited).unwrap() {
            let once = apply(&doc, &diff);
            let twice = apply(&once.value, &diff);
            prop_assert_eq!(once.value, twice.value);
        }
    }

    #[test]
    fn record_edits_are_reproduced_exactly_or_rejected(
        list in record_list(),
        seed in any::<u64>(),
        rename in prop::option::of((0usize..8, 0u8..6)),
        swap in prop::option::of((0usize..8, 0usize..8)),
    ) {
        let original = json!({"dataList": list});
        let edited = json!({"dataList": edit_records(&original["dataList"], seed, rename, swap)});

        match compute_edit(&original, &edited) {
            Ok(diff) => {
                let patched = match diff {
                    Some(diff) => apply(&original, &diff).value,
                    None => original.clone(),
                };
                prop_assert_eq!(patched, edited);
            }
            Err(DiffError::StructureMismatch { .. }) => {
                let before = ids(&original["dataList"]);
                let unique = before.iter().map(Value::to_string).collect::<BTreeSet<_>>().len() == before.len();
                // Unique ids kept in place must always be accepted.
                prop_assert!(!unique || before != ids(&edited["dataList"]));
            }
            Err(other) => prop_assert!(false, "unexpected error {}", other),
        }
    }

    /// Replay across base versions: records may be added and removed, and
    /// additions land after the surviving records.
    #[test]
    fn record_arrays_round_trip_up_to_order(
        before in prop::collection::btree_set(0u8..24, 1..8),
        after in prop::collection::btree_set(0u8..24, 1..8),
    ) {
        let original = records(&before, "a");
        let edited = records(&after, "b");
        let patched = match compute(&original, &edited).unwrap() {
            Some(diff) => {
                let patched = apply(&original, &diff);
                prop_assert!(patched.is_clean());
                patched.value
            }
            None => original.clone(),
        };
        prop_assert_eq!(sorted_by_id(&patched), sorted_by_id(&edited));
    }
}
