//! Set of directories with a live native watch.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Registry of watched directories.
///
/// Every directory is watched non-recursively, so the registry mirrors the
/// directory trees of all roots one entry per directory.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    dirs: BTreeSet<PathBuf>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directory. Returns false if it was already present.
    pub fn insert(&mut self, dir: PathBuf) -> bool {
        self.dirs.insert(dir)
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Drop directories that no longer exist, returning them.
    pub fn prune_missing(&mut self) -> Vec<PathBuf> {
        let removed: Vec<PathBuf> = self.dirs.iter().filter(|d| !d.is_dir()).cloned().collect();
        for dir in &removed {
            self.dirs.remove(dir);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_insert_is_deduplicated() {
        let mut registry = WatchRegistry::new();

        assert!(registry.insert(PathBuf::from("/r")));
        assert!(registry.insert(PathBuf::from("/r/sub")));
        assert!(!registry.insert(PathBuf::from("/r")));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(Path::new("/r/sub")));
    }

    #[test]
    fn test_prune_missing() {
        let temp_dir = TempDir::new().unwrap();
        let live = temp_dir.path().join("live");
        std::fs::create_dir(&live).unwrap();
        let gone = temp_dir.path().join("gone");

        let mut registry = WatchRegistry::new();
        registry.insert(live.clone());
        registry.insert(gone.clone());

        let pruned = registry.prune_missing();
        assert_eq!(pruned, vec![gone]);
        assert!(registry.contains(&live));
        assert_eq!(registry.len(), 1);
    }
}
