//! Plugin file index - Snapshots the plugin directory

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Plugin name -> modification time of its file
pub type Snapshot = BTreeMap<String, SystemTime>;

/// Plugin directory scanner
#[derive(Debug, Clone)]
pub struct PluginFileIndex {
    dir: PathBuf,
    extension: String,
}

impl PluginFileIndex {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// List plugin files keyed by file stem.
    ///
    /// Creates the directory when it does not exist. Files that disappear
    /// between listing and stat are left out instead of failing the scan.
    pub fn snapshot(&self) -> io::Result<Snapshot> {
        std::fs::create_dir_all(&self.dir)?;

        let mut files = Snapshot::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let metadata = match std::fs::metadata(&path) {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!("Failed to stat {}: {}", path.display(), e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            match metadata.modified() {
                Ok(modified) => {
                    files.insert(name.to_string(), modified);
                }
                Err(e) => tracing::warn!("No modification time for {}: {}", path.display(), e),
            }
        }

        Ok(files)
    }
}

/// Difference between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Present in both with a different modification time
    pub modified: Vec<String>,
}

impl SnapshotDiff {
    pub fn between(previous: &Snapshot, current: &Snapshot) -> Self {
        let mut diff = Self::default();

        for (name, modified) in current {
            match previous.get(name) {
                None => diff.added.push(name.clone()),
                Some(old) if old != modified => diff.modified.push(name.clone()),
                Some(_) => {}
            }
        }
        diff.removed = previous
            .keys()
            .filter(|name| !current.contains_key(*name))
            .cloned()
            .collect();

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn touch(dir: &Path, file: &str, secs: u64) {
        let path = dir.join(file);
        std::fs::write(&path, "").unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
    }

    #[test]
    fn test_snapshot_creates_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("plugins");

        let index = PluginFileIndex::new(&dir, "yaml");
        assert!(index.snapshot().unwrap().is_empty());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_snapshot_keys_by_stem_and_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "ping.yaml", 10);
        touch(dir.path(), "sus.yaml", 20);
        touch(dir.path(), "notes.txt", 30);
        touch(dir.path(), ".hidden.yaml", 40);
        std::fs::create_dir(dir.path().join("folder.yaml")).unwrap();

        let snapshot = PluginFileIndex::new(dir.path(), "yaml").snapshot().unwrap();
        let names: Vec<_> = snapshot.keys().cloned().collect();
        assert_eq!(names, vec!["ping", "sus"]);
        assert_eq!(snapshot["ping"], SystemTime::UNIX_EPOCH + Duration::from_secs(10));
    }

    #[test]
    fn test_diff_categories() {
        let t = |s| SystemTime::UNIX_EPOCH + Duration::from_secs(s);
        let previous: Snapshot = [("keep", t(1)), ("edit", t(1)), ("gone", t(1))]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let current: Snapshot = [("keep", t(1)), ("edit", t(2)), ("new", t(1))]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let diff = SnapshotDiff::between(&previous, &current);
        assert_eq!(diff.added, vec!["new"]);
        assert_eq!(diff.removed, vec!["gone"]);
        assert_eq!(diff.modified, vec!["edit"]);
        assert!(SnapshotDiff::between(&current, &current).is_empty());
    }
}
