//! Flat-keyed index tables over the composite collections.
//!
//! An [`IndexTable`] maps every working-point combination (one cell per
//! encoded key) to the positions, in a fixed order, of the composites
//! satisfying it. Tables are rebuilt from scratch each event; looking up
//! a combination nothing satisfied yields an empty slice, never an
//! error.

use std::marker::PhantomData;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::wp::FlatKey;

/// Dense table of index lists, one slot per key in the domain.
#[derive(Debug, Clone)]
pub struct IndexTable<K: FlatKey> {
    slots: Vec<Vec<usize>>,
    _key: PhantomData<K>,
}

impl<K: FlatKey> IndexTable<K> {
    /// A table with every cell empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![Vec::new(); K::DOMAIN],
            _key: PhantomData,
        }
    }

    /// Number of cells (the full key domain, including empty cells).
    #[must_use]
    pub fn domain(&self) -> usize {
        self.slots.len()
    }

    /// Append an index to a cell, preserving insertion order.
    pub fn push(&mut self, key: K, index: usize) {
        self.slots[key.encode()].push(index);
    }

    /// The indices recorded under a key, in insertion (or slice-sort)
    /// order. Empty for combinations nothing satisfied.
    #[must_use]
    pub fn get(&self, key: K) -> &[usize] {
        &self.slots[key.encode()]
    }

    /// Replace a cell's contents wholesale (used for re-sorted slices).
    pub fn set(&mut self, key: K, indices: Vec<usize>) {
        self.slots[key.encode()] = indices;
    }

    /// Iterate over the non-empty cells as (decoded key, indices).
    pub fn iter_nonempty(&self) -> impl Iterator<Item = (K, &[usize])> {
        self.slots.iter().enumerate().filter_map(|(raw, slot)| {
            if slot.is_empty() {
                None
            } else {
                K::decode(raw).map(|key| (key, slot.as_slice()))
            }
        })
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn occupancy(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_empty()).count()
    }
}

impl<K: FlatKey> Default for IndexTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

// Serialized as the raw slot lists, in key-encoding order: downstream
// consumers address cells by encoded key.
impl<K: FlatKey> Serialize for IndexTable<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.slots.len()))?;
        for slot in &self.slots {
            seq.serialize_element(slot)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wp::{LepId, LepIso, LepKey};

    #[test]
    fn test_empty_cell_yields_empty_slice() {
        let table: IndexTable<LepKey> = IndexTable::new();
        let key = LepKey {
            id: LepId::Tight,
            iso: LepIso::Tight,
        };
        assert!(table.get(key).is_empty());
        assert_eq!(table.occupancy(), 0);
        assert_eq!(table.domain(), 6);
    }

    #[test]
    fn test_push_preserves_insertion_order() {
        let mut table: IndexTable<LepKey> = IndexTable::new();
        let key = LepKey {
            id: LepId::Loose,
            iso: LepIso::None,
        };
        table.push(key, 2);
        table.push(key, 0);
        table.push(key, 1);
        assert_eq!(table.get(key), &[2, 0, 1]);
    }

    #[test]
    fn test_iter_nonempty_decodes_keys() {
        let mut table: IndexTable<LepKey> = IndexTable::new();
        let key = LepKey {
            id: LepId::Tight,
            iso: LepIso::Loose,
        };
        table.push(key, 7);
        let cells: Vec<_> = table.iter_nonempty().collect();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].0, key);
        assert_eq!(cells[0].1, &[7]);
    }

    #[test]
    fn test_serializes_as_slot_lists() {
        let mut table: IndexTable<LepKey> = IndexTable::new();
        table.push(
            LepKey {
                id: LepId::Loose,
                iso: LepIso::None,
            },
            3,
        );
        let json = serde_json::to_value(&table).unwrap();
        let slots = json.as_array().unwrap();
        assert_eq!(slots.len(), 6);
        assert_eq!(slots[0], serde_json::json!([3]));
        assert_eq!(slots[5], serde_json::json!([]));
    }
}
