//! Identity lookup over record arrays.

use std::collections::HashMap;

use lov_types::RecordId;
use serde_json::Value;

/// Lookup from record id to element for one array.
///
/// Elements that are not records (no `id` field) are skipped; they only
/// participate by position. When several elements share an id, the last
/// occurrence wins and the id is listed in [`IdentityIndex::duplicates`].
#[derive(Debug, Default)]
pub struct IdentityIndex<'a> {
    entries: HashMap<RecordId, &'a Value>,
    /// Distinct ids in order of first occurrence.
    order: Vec<RecordId>,
    duplicates: Vec<RecordId>,
}

impl<'a> IdentityIndex<'a> {
    /// Build the index. Never fails.
    pub fn build(items: &'a [Value]) -> Self {
        let mut index = Self {
            entries: HashMap::with_capacity(items.len()),
            order: Vec::with_capacity(items.len()),
            duplicates: Vec::new(),
        };

        for item in items {
            let Some(id) = RecordId::of(item) else {
                continue;
            };
            if index.entries.insert(id.clone(), item).is_some() {
                if !index.duplicates.contains(&id) {
                    index.duplicates.push(id);
                }
            } else {
                index.order.push(id);
            }
        }

        index
    }

    pub fn get(&self, id: &RecordId) -> Option<&'a Value> {
        self.entries.get(id).copied()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Distinct ids with their (last-occurrence) element, in order of first
    /// occurrence.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &'a Value)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|item| (id, *item)))
    }

    /// Ids that occurred more than once.
    pub fn duplicates(&self) -> &[RecordId] {
        &self.duplicates
    }
}

/// Returns `true` if every element of `items` is a record.
///
/// An empty array is vacuously a record array.
pub fn is_record_array(items: &[Value]) -> bool {
    items.iter().all(|item| RecordId::of(item).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(value: Value) -> RecordId {
        RecordId::new(value)
    }

    #[test]
    fn indexes_records_by_id() {
        let items = vec![json!({"id": 1, "t": "x"}), json!({"id": "b", "t": "y"})];
        let index = IdentityIndex::build(&items);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&id(json!(1))), Some(&items[0]));
        assert_eq!(index.get(&id(json!("b"))), Some(&items[1]));
        assert!(!index.contains(&id(json!(2))));
        assert!(index.duplicates().is_empty());
    }

    #[test]
    fn skips_non_records() {
        let items = vec![json!("loose"), json!({"t": "no id"}), json!({"id": 7})];
        let index = IdentityIndex::build(&items);
        assert_eq!(index.len(), 1);
        assert!(index.contains(&id(json!(7))));
    }

    #[test]
    fn last_duplicate_wins() {
        let items = vec![
            json!({"id": 1, "t": "first"}),
            json!({"id": 2}),
            json!({"id": 1, "t": "second"}),
            json!({"id": 1, "t": "third"}),
        ];
        let index = IdentityIndex::build(&items);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&id(json!(1))), Some(&items[3]));
        assert_eq!(index.duplicates(), &[id(json!(1))]);
    }

    #[test]
    fn iterates_in_first_occurrence_order() {
        let items = vec![json!({"id": 3}), json!({"id": 1}), json!({"id": 3, "v": 1})];
        let index = IdentityIndex::build(&items);
        let ids: Vec<_> = index.iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        let (_, first) = index.iter().next().unwrap();
        assert_eq!(first, &json!({"id": 3, "v": 1}));
    }

    #[test]
    fn record_array_detection() {
        assert!(is_record_array(&[json!({"id": 1}), json!({"id": 2})]));
        assert!(is_record_array(&[]));
        assert!(!is_record_array(&[json!({"id": 1}), json!({"name": 2})]));
        assert!(!is_record_array(&[json!(1), json!(2)]));
    }
}
