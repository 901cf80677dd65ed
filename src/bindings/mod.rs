//! Key bindings per executable
//!
//! Bindings are keyed by executable path rather than process id, so they
//! survive restarts of the bound program and apply to every process started
//! from the same file.

mod store;

use std::collections::BTreeMap;

pub use store::BindingStore;

use crate::hotkeys::KeyCombination;
use crate::system::CoreLimit;

/// One key combination and the core count it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: KeyCombination,
    pub cores: CoreLimit,
}

/// The ordered bindings of one executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableBindingSet {
    pub executable: String,
    pub bindings: Vec<KeyBinding>,
}

/// All bindings, by executable path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingMap {
    sets: BTreeMap<String, ExecutableBindingSet>,
}

impl BindingMap {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no executable has bindings
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Total number of bindings across all executables
    pub fn binding_count(&self) -> usize {
        self.sets.values().map(|set| set.bindings.len()).sum()
    }

    /// Appends a binding to `executable`'s list, creating the list if needed.
    pub fn add_binding(&mut self, executable: &str, key: KeyCombination, cores: CoreLimit) {
        self.sets
            .entry(executable.to_string())
            .or_insert_with(|| ExecutableBindingSet {
                executable: executable.to_string(),
                bindings: Vec::new(),
            })
            .bindings
            .push(KeyBinding { key, cores });
    }

    /// Removes every binding of `key` from `executable`.
    ///
    /// # Returns
    /// `false` (and no change) if there was no such binding
    pub fn remove_binding(&mut self, executable: &str, key: &KeyCombination) -> bool {
        let Some(set) = self.sets.get_mut(executable) else {
            return false;
        };

        let before = set.bindings.len();
        set.bindings.retain(|b| b.key != *key);
        let removed = set.bindings.len() != before;

        if set.bindings.is_empty() {
            self.sets.remove(executable);
        }
        removed
    }

    /// The bindings of `executable`, in insertion order
    pub fn bindings_for(&self, executable: &str) -> &[KeyBinding] {
        self.sets
            .get(executable)
            .map(|set| set.bindings.as_slice())
            .unwrap_or(&[])
    }

    /// The executable that `key` is bound for, if any
    pub fn owner_of(&self, key: &KeyCombination) -> Option<&str> {
        self.sets
            .values()
            .find(|set| set.bindings.iter().any(|b| b.key == *key))
            .map(|set| set.executable.as_str())
    }

    /// Iterates executables in path order
    pub fn iter(&self) -> impl Iterator<Item = &ExecutableBindingSet> {
        self.sets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> KeyCombination {
        KeyCombination::parse(s).unwrap()
    }

    fn cores(n: u32) -> CoreLimit {
        CoreLimit::new(n).unwrap()
    }

    #[test]
    fn test_add_keeps_order_per_executable() {
        let mut map = BindingMap::new();
        map.add_binding("/usr/bin/app", key("ctrl+2"), cores(2));
        map.add_binding("/usr/bin/app", key("ctrl+1"), cores(1));
        map.add_binding("/usr/bin/other", key("ctrl+3"), cores(3));

        let keys: Vec<String> = map
            .bindings_for("/usr/bin/app")
            .iter()
            .map(|b| b.key.to_string())
            .collect();
        assert_eq!(keys, vec!["ctrl+2", "ctrl+1"]);
        assert_eq!(map.binding_count(), 3);
        assert_eq!(map.owner_of(&key("ctrl+3")), Some("/usr/bin/other"));
    }

    #[test]
    fn test_remove_missing_binding_is_noop() {
        let mut map = BindingMap::new();
        map.add_binding("/usr/bin/app", key("ctrl+1"), cores(1));
        let before = map.clone();

        assert!(!map.remove_binding("/usr/bin/app", &key("ctrl+9")));
        assert!(!map.remove_binding("/usr/bin/none", &key("ctrl+1")));
        assert_eq!(map, before);
    }

    #[test]
    fn test_remove_last_binding_drops_executable() {
        let mut map = BindingMap::new();
        map.add_binding("/usr/bin/app", key("ctrl+1"), cores(1));

        assert!(map.remove_binding("/usr/bin/app", &key("ctrl+1")));
        assert!(map.is_empty());
        assert!(map.bindings_for("/usr/bin/app").is_empty());
    }
}
