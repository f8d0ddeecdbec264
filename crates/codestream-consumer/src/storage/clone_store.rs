//! Append-only repository of discovered clone groups

use parking_lot::RwLock;
use std::sync::Arc;

use crate::types::CloneGroup;

/// Shared clone repository
#[derive(Debug, Default)]
pub struct CloneStore {
    clones: RwLock<Vec<Arc<CloneGroup>>>,
}

impl CloneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clone groups
    pub fn count(&self) -> usize {
        self.clones.read().len()
    }

    /// Commit one invocation's full clone set and return the new count
    ///
    /// The whole set lands under a single write lock, so concurrent commits
    /// never interleave.
    pub fn append(&self, set: Vec<CloneGroup>) -> usize {
        let mut clones = self.clones.write();
        clones.extend(set.into_iter().map(Arc::new));
        clones.len()
    }

    /// Snapshot of all clone groups in commit order
    pub fn iterate(&self) -> Vec<Arc<CloneGroup>> {
        self.clones.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CloneTarget;

    fn group(source: &str) -> CloneGroup {
        CloneGroup {
            source_name: source.to_string(),
            source_start_line: 1,
            source_end_line: 5,
            original_code: "x\n".to_string(),
            targets: vec![CloneTarget {
                name: "other.c".to_string(),
                start_line: 3,
            }],
        }
    }

    #[test]
    fn test_append_full_set() {
        let store = CloneStore::new();
        assert_eq!(store.count(), 0);
        assert_eq!(store.append(vec![group("a.c"), group("a.c")]), 2);
        assert_eq!(store.append(Vec::new()), 2);
        assert_eq!(store.append(vec![group("b.c")]), 3);

        let names: Vec<_> = store.iterate().iter().map(|c| c.source_name.clone()).collect();
        assert_eq!(names, vec!["a.c", "a.c", "b.c"]);
    }

    #[test]
    fn test_concurrent_sets_stay_contiguous() {
        let store = Arc::new(CloneStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let name = format!("t{}.c", t);
                        store.append(vec![group(&name), group(&name), group(&name)]);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snapshot = store.iterate();
        assert_eq!(snapshot.len(), 8 * 50 * 3);
        for set in snapshot.chunks(3) {
            assert!(set.iter().all(|c| c.source_name == set[0].source_name));
        }
    }
}
