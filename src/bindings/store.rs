//! Bindings file persistence
//!
//! The file is a versioned JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "executables": [
//!     { "path": "/usr/bin/app",
//!       "bindings": [ { "key": "ctrl+1", "num_cores": 2 } ] }
//!   ]
//! }
//! ```
//!
//! Saving writes a temporary sibling file and renames it over the target,
//! so a crash never leaves a truncated file behind.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{BINDINGS_FORMAT_VERSION, CORRUPT_FILE_SUFFIX};
use crate::hotkeys::KeyCombination;
use crate::system::error::{PersistFormatError, StoreError, StoreResult};
use crate::system::CoreLimit;

use super::BindingMap;

#[derive(Deserialize)]
struct VersionTag {
    version: u32,
}

#[derive(Serialize, Deserialize)]
struct BindingsDocument {
    version: u32,
    #[serde(default)]
    executables: Vec<ExecutableRecord>,
}

#[derive(Serialize, Deserialize)]
struct ExecutableRecord {
    path: String,
    #[serde(default)]
    bindings: Vec<BindingRecord>,
}

#[derive(Serialize, Deserialize)]
struct BindingRecord {
    key: String,
    num_cores: u32,
}

/// Converts a bindings map to the file format.
pub fn encode(map: &BindingMap) -> Result<String, PersistFormatError> {
    let document = BindingsDocument {
        version: BINDINGS_FORMAT_VERSION,
        executables: map
            .iter()
            .map(|set| ExecutableRecord {
                path: set.executable.clone(),
                bindings: set
                    .bindings
                    .iter()
                    .map(|b| BindingRecord {
                        key: b.key.to_string(),
                        num_cores: b.cores.get(),
                    })
                    .collect(),
            })
            .collect(),
    };

    let mut text = serde_json::to_string_pretty(&document)?;
    text.push('\n');
    Ok(text)
}

/// Parses the file format into a bindings map.
pub fn decode(text: &str) -> Result<BindingMap, PersistFormatError> {
    let tag: VersionTag = serde_json::from_str(text)?;
    if tag.version != BINDINGS_FORMAT_VERSION {
        return Err(PersistFormatError::UnsupportedVersion { found: tag.version });
    }

    let document: BindingsDocument = serde_json::from_str(text)?;
    let mut map = BindingMap::new();

    for record in document.executables {
        for binding in record.bindings {
            let invalid = |reason: String| PersistFormatError::InvalidEntry {
                executable: record.path.clone(),
                reason,
            };

            let key = KeyCombination::parse(&binding.key).map_err(|e| invalid(e.to_string()))?;
            let cores = CoreLimit::new(binding.num_cores)
                .ok_or_else(|| invalid(format!("key {} binds zero cores", key)))?;
            map.add_binding(&record.path, key, cores);
        }
    }

    Ok(map)
}

/// Loads and saves the bindings file.
#[derive(Debug, Clone)]
pub struct BindingStore {
    path: PathBuf,
}

impl BindingStore {
    /// Creates a store for the file at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the bindings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the bindings file.
    ///
    /// # Returns
    /// * `Ok(map)` - The stored bindings; empty if the file is missing or blank
    /// * `Err(StoreError::Format)` - The file exists but is not a bindings document
    /// * `Err(StoreError::Io)` - The file could not be read
    pub fn load(&self) -> StoreResult<BindingMap> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no bindings file yet");
                return Ok(BindingMap::new());
            }
            Err(e) => {
                return Err(StoreError::Io {
                    action: "read",
                    source: e,
                })
            }
        };

        if text.trim().is_empty() {
            return Ok(BindingMap::new());
        }

        let map = decode(&text)?;
        tracing::info!(
            path = %self.path.display(),
            bindings = map.binding_count(),
            "bindings loaded"
        );
        Ok(map)
    }

    /// Writes the whole map, replacing the previous file atomically.
    pub fn save(&self, map: &BindingMap) -> StoreResult<()> {
        let text = encode(map)?;
        let temp = self.sibling("tmp");

        let write = || -> io::Result<()> {
            let mut file = File::create(&temp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp, &self.path)
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::Io {
                action: "write",
                source: e,
            });
        }

        tracing::info!(
            path = %self.path.display(),
            bindings = map.binding_count(),
            "bindings saved"
        );
        Ok(())
    }

    /// Moves an unreadable bindings file aside so the next save cannot
    /// overwrite it.
    ///
    /// # Returns
    /// Where the file was moved to
    pub fn quarantine(&self) -> StoreResult<PathBuf> {
        let target = self.sibling(CORRUPT_FILE_SUFFIX);
        fs::rename(&self.path, &target).map_err(|e| StoreError::Io {
            action: "move aside",
            source: e,
        })?;

        tracing::warn!(
            from = %self.path.display(),
            to = %target.display(),
            "unreadable bindings file moved aside"
        );
        Ok(target)
    }

    /// `<path>.<suffix>`
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn temp_store(name: &str) -> BindingStore {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!(
            "core_limiter_{}_{}_{}.json",
            name,
            std::process::id(),
            nanos
        ));
        BindingStore::new(path)
    }

    fn key(s: &str) -> KeyCombination {
        KeyCombination::parse(s).unwrap()
    }

    fn cores(n: u32) -> CoreLimit {
        CoreLimit::new(n).unwrap()
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let store = temp_store("missing");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_blank_file_loads_empty() {
        let store = temp_store("blank");
        fs::write(store.path(), "  \n").unwrap();
        assert!(store.load().unwrap().is_empty());
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let store = temp_store("roundtrip");
        let mut map = BindingMap::new();
        map.add_binding("/usr/bin/app", key("ctrl+1"), cores(2));
        map.add_binding("/usr/bin/app", key("alt+f2"), cores(1));
        map.add_binding("/opt/game/bin/game", key("ctrl+shift+g"), cores(4));

        store.save(&map).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, map);

        // Saving what was loaded yields the same file
        let first = fs::read_to_string(store.path()).unwrap();
        store.save(&loaded).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), first);
        assert!(!store.sibling("tmp").exists());

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_decode_reads_documented_format() {
        let text = r#"{
            "version": 1,
            "executables": [
                { "path": "/usr/bin/app",
                  "bindings": [ { "key": "Ctrl 1", "num_cores": 2 } ] }
            ]
        }"#;
        let map = decode(text).unwrap();
        let bindings = map.bindings_for("/usr/bin/app");
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].key, key("ctrl+1"));
        assert_eq!(bindings[0].cores, cores(2));
    }

    #[test]
    fn test_decode_rejects_bad_documents() {
        assert!(matches!(
            decode("<KeyBindings/>"),
            Err(PersistFormatError::Malformed { .. })
        ));
        assert!(matches!(
            decode(r#"{"executables": []}"#),
            Err(PersistFormatError::Malformed { .. })
        ));
        assert_eq!(
            decode(r#"{"version": 7, "whatever": true}"#),
            Err(PersistFormatError::UnsupportedVersion { found: 7 })
        );
        assert!(matches!(
            decode(r#"{"version": 1, "executables": [{"path": "/a", "bindings": [{"key": "ctrl+1", "num_cores": 0}]}]}"#),
            Err(PersistFormatError::InvalidEntry { .. })
        ));
        assert!(matches!(
            decode(r#"{"version": 1, "executables": [{"path": "/a", "bindings": [{"key": "ctrl+", "num_cores": 1}]}]}"#),
            Err(PersistFormatError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_reported_and_can_be_moved_aside() {
        let store = temp_store("corrupt");
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Format(_))));

        let moved = store.quarantine().unwrap();
        assert!(moved.exists());
        assert!(store.load().unwrap().is_empty());

        let _ = fs::remove_file(moved);
    }
}
