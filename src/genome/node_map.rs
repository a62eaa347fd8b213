//! Node id to dense node index mapping.

use std::collections::HashMap;

/// Maps sparse node ids to dense node indexes in `[0, node_count)`.
///
/// Two representations behind one lookup contract, chosen once when a
/// genome is built: the identity form covers the common case where node ids
/// are already dense and contiguous, and the table form covers arbitrary
/// remaps (required after acyclic depth re-layering relocates nodes).
#[derive(Debug, Clone)]
pub enum NodeIdMap {
    /// Ids are already dense: every id maps to itself.
    Identity {
        /// Total number of nodes.
        count: usize,
    },
    /// General remap: ids below `fixed_count` map to themselves, all other
    /// ids are looked up in the table.
    Table {
        /// Ids below this value (the input nodes) map to themselves.
        fixed_count: usize,
        /// Explicit id → index entries for the remaining nodes.
        entries: HashMap<u32, u32>,
    },
}

impl NodeIdMap {
    /// Create an identity map over `count` dense node ids.
    #[must_use]
    pub fn identity(count: usize) -> Self {
        Self::Identity { count }
    }

    /// Create a table map. Ids below `fixed_count` map to themselves;
    /// `entries` must cover every other node id.
    #[must_use]
    pub fn table(fixed_count: usize, entries: HashMap<u32, u32>) -> Self {
        Self::Table {
            fixed_count,
            entries,
        }
    }

    /// The total number of nodes covered by the map.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Identity { count } => *count,
            Self::Table {
                fixed_count,
                entries,
            } => fixed_count + entries.len(),
        }
    }

    /// True if the map covers no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the dense node index for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not covered by the map; every id referenced by a
    /// genome's connections must be.
    #[must_use]
    pub fn map(&self, id: u32) -> u32 {
        match self {
            Self::Identity { count } => {
                debug_assert!((id as usize) < *count, "node id {id} out of range");
                id
            }
            Self::Table {
                fixed_count,
                entries,
            } => {
                if (id as usize) < *fixed_count {
                    id
                } else {
                    *entries
                        .get(&id)
                        .unwrap_or_else(|| panic!("node id {id} missing from node id map"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_map() {
        let map = NodeIdMap::identity(5);
        assert_eq!(map.len(), 5);
        assert_eq!(map.map(0), 0);
        assert_eq!(map.map(4), 4);
    }

    #[test]
    fn test_table_map_fixed_prefix_and_entries() {
        let mut entries = HashMap::new();
        entries.insert(2, 3);
        entries.insert(7, 2);
        let map = NodeIdMap::table(2, entries);
        assert_eq!(map.len(), 4);
        // Fixed ids map to themselves.
        assert_eq!(map.map(0), 0);
        assert_eq!(map.map(1), 1);
        // Remapped ids go through the table.
        assert_eq!(map.map(2), 3);
        assert_eq!(map.map(7), 2);
    }

    #[test]
    #[should_panic(expected = "missing from node id map")]
    fn test_unknown_id_panics() {
        let map = NodeIdMap::table(1, HashMap::new());
        let _ = map.map(9);
    }
}
