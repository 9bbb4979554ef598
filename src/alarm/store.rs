//! Durable alarm configuration.
//!
//! The store keeps the current [`AlarmSet`] in memory and mirrors it to a
//! single JSON file. Every mutation is written to disk before it becomes
//! visible in memory, so a failed write leaves the store unchanged.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::{debug, info, warn};

use super::error::{AlarmError, StorageFault};
use super::evaluator::evaluate;
use super::model::{AlarmSet, AlertEvent, MetricKind, MetricSample, Threshold};

const TEMP_SUFFIX: &str = ".tmp";

/// Mode of a storage file created by the first save.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Owner of the alarm configuration and its storage file.
#[derive(Debug)]
pub struct AlarmStore {
    path: PathBuf,
    alarms: AlarmSet,
}

impl AlarmStore {
    /// Opens the store backed by `path`.
    ///
    /// A missing file yields an empty set; the file is created on the first
    /// mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AlarmError> {
        let path = path.into();
        remove_stale_temp_files(&path);
        let alarms = load_alarms(&path)?;
        Ok(Self { path, alarms })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn alarms(&self) -> &AlarmSet {
        &self.alarms
    }

    /// Sets the threshold for `kind` and persists the whole set.
    pub fn configure(&mut self, kind: MetricKind, percent: u32) -> Result<Threshold, AlarmError> {
        let threshold = Threshold::new(percent)?;
        let mut next = self.alarms;
        next.set(kind, Some(threshold));
        self.commit(next)?;
        info!("Alarm configured: {} at {}", kind, threshold);
        Ok(threshold)
    }

    /// Every kind with its threshold, unset entries included, in evaluation order.
    pub fn list(&self) -> Vec<(MetricKind, Option<Threshold>)> {
        self.alarms.iter().collect()
    }

    /// Configured alarms by ascending threshold, for display.
    pub fn sorted(&self) -> Vec<(MetricKind, Threshold)> {
        self.alarms.sorted_by_threshold()
    }

    /// Clears the threshold for `kind` and returns the removed value.
    ///
    /// Fails with [`AlarmError::NothingToDelete`] when no alarm is configured
    /// at all, and with [`AlarmError::NotConfigured`] when only `kind` is unset.
    /// Neither failure touches the storage file.
    pub fn delete(&mut self, kind: MetricKind) -> Result<Threshold, AlarmError> {
        if self.alarms.is_empty() {
            return Err(AlarmError::NothingToDelete);
        }
        let removed = self
            .alarms
            .get(kind)
            .ok_or(AlarmError::NotConfigured(kind))?;

        let mut next = self.alarms;
        next.set(kind, None);
        self.commit(next)?;
        info!("Alarm removed: {} at {}", kind, removed);
        Ok(removed)
    }

    /// Writes the current set to the storage file.
    pub fn save(&self) -> Result<(), AlarmError> {
        save_alarms(&self.path, &self.alarms)
    }

    /// Checks `sample` against the configured alarms.
    pub fn evaluate(&self, sample: &MetricSample) -> Vec<AlertEvent> {
        evaluate(&self.alarms, sample)
    }

    fn commit(&mut self, next: AlarmSet) -> Result<(), AlarmError> {
        save_alarms(&self.path, &next)?;
        self.alarms = next;
        Ok(())
    }
}

/// Reads an alarm set from `path`. A missing file yields an empty set.
pub fn load_alarms(path: &Path) -> Result<AlarmSet, AlarmError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(
                "No alarm configuration found at {}; starting with no alarms",
                path.display()
            );
            return Ok(AlarmSet::default());
        }
        Err(e) => return Err(unavailable(path, e.into())),
    };

    let alarms: AlarmSet = serde_json::from_str(&raw).map_err(|e| unavailable(path, e.into()))?;
    info!(
        "Loaded {} configured alarm(s) from {}",
        alarms.configured().len(),
        path.display()
    );
    Ok(alarms)
}

/// Replaces the content of `path` with `alarms`.
///
/// The data goes to a temporary file in the same directory, which is then
/// renamed over `path`. Missing parent directories are created.
pub fn save_alarms(path: &Path, alarms: &AlarmSet) -> Result<(), AlarmError> {
    write_atomic(path, alarms).map_err(|e| unavailable(path, e))?;
    debug!("Alarm configuration saved to {}", path.display());
    Ok(())
}

fn write_atomic(path: &Path, alarms: &AlarmSet) -> Result<(), StorageFault> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;

    let body = serde_json::to_vec(alarms)?;
    let mut tmp = Builder::new()
        .prefix(&temp_prefix(path))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)?;
    tmp.write_all(&body)?;
    // The temp file is created owner-only; keep the mode of the file it replaces.
    match fs::metadata(path) {
        Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => set_new_file_mode(tmp.as_file())?,
        Err(e) => return Err(e.into()),
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_new_file_mode(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn set_new_file_mode(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Temp files for `alarms.json` are named `.alarms.json.XXXXXX.tmp`.
fn temp_prefix(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(".{}.", name)
}

/// Removes temp files left behind by a save that never reached the rename.
fn remove_stale_temp_files(path: &Path) {
    let prefix = temp_prefix(path);
    let Ok(entries) = fs::read_dir(parent_dir(path)) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && name.ends_with(TEMP_SUFFIX) {
            match fs::remove_file(entry.path()) {
                Ok(()) => debug!("Removed stale temp file {}", entry.path().display()),
                Err(e) => warn!(
                    "Failed to remove stale temp file {}: {}",
                    entry.path().display(),
                    e
                ),
            }
        }
    }
}

fn unavailable(path: &Path, source: StorageFault) -> AlarmError {
    AlarmError::StorageUnavailable {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(percent: u32) -> Threshold {
        Threshold::new(percent).unwrap()
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");

        let store = AlarmStore::open(&path).unwrap();
        assert!(store.alarms().is_empty());
        assert_eq!(
            store.list(),
            vec![
                (MetricKind::Cpu, None),
                (MetricKind::Memory, None),
                (MetricKind::Disk, None),
            ]
        );
        assert!(store.evaluate(&MetricSample::new(100.0, 100.0, 100.0)).is_empty());
        // Opening alone never creates the file.
        assert!(!path.exists());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");

        let set = AlarmSet::default()
            .with(MetricKind::Cpu, t(1))
            .with(MetricKind::Disk, t(100));
        save_alarms(&path, &set).unwrap();
        assert_eq!(load_alarms(&path).unwrap(), set);

        save_alarms(&path, &AlarmSet::default()).unwrap();
        assert_eq!(load_alarms(&path).unwrap(), AlarmSet::default());
    }

    #[test]
    fn test_save_restores_removed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        let mut store = AlarmStore::open(&path).unwrap();
        store.configure(MetricKind::Memory, 70).unwrap();

        fs::remove_file(&path).unwrap();
        store.save().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"CPU": null, "Memory": 70, "Disk": null}));
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("alarms.json");

        let mut store = AlarmStore::open(&path).unwrap();
        store.configure(MetricKind::Memory, 75).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_configure_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");

        let mut store = AlarmStore::open(&path).unwrap();
        assert_eq!(store.configure(MetricKind::Cpu, 80).unwrap(), t(80));
        store.configure(MetricKind::Cpu, 85).unwrap();

        let reopened = AlarmStore::open(&path).unwrap();
        assert_eq!(reopened.alarms().get(MetricKind::Cpu), Some(t(85)));
        assert_eq!(reopened.alarms().get(MetricKind::Memory), None);
    }

    #[test]
    fn test_configure_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        let mut store = AlarmStore::open(&path).unwrap();

        assert!(matches!(
            store.configure(MetricKind::Cpu, 0),
            Err(AlarmError::OutOfRange(0))
        ));
        assert!(matches!(
            store.configure(MetricKind::Cpu, 101),
            Err(AlarmError::OutOfRange(101))
        ));
        assert!(store.alarms().is_empty());
        assert!(!path.exists());

        store.configure(MetricKind::Cpu, 1).unwrap();
        store.configure(MetricKind::Memory, 100).unwrap();
        assert_eq!(store.alarms().get(MetricKind::Cpu), Some(t(1)));
        assert_eq!(store.alarms().get(MetricKind::Memory), Some(t(100)));
    }

    #[test]
    fn test_delete_returns_removed_and_persists_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        let mut store = AlarmStore::open(&path).unwrap();

        store.configure(MetricKind::Disk, 90).unwrap();
        assert_eq!(store.delete(MetricKind::Disk).unwrap(), t(90));
        assert_eq!(store.list()[2], (MetricKind::Disk, None));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["Disk"].is_null());
        assert!(raw.as_object().unwrap().contains_key("Disk"));
    }

    #[test]
    fn test_delete_with_nothing_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        let mut store = AlarmStore::open(&path).unwrap();

        assert!(matches!(
            store.delete(MetricKind::Cpu),
            Err(AlarmError::NothingToDelete)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_unset_kind_while_others_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        let mut store = AlarmStore::open(&path).unwrap();
        store.configure(MetricKind::Cpu, 50).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        assert!(matches!(
            store.delete(MetricKind::Memory),
            Err(AlarmError::NotConfigured(MetricKind::Memory))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(store.alarms().get(MetricKind::Cpu), Some(t(50)));
    }

    #[test]
    fn test_malformed_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        fs::write(&path, "{not json").unwrap();

        let err = AlarmStore::open(&path).unwrap_err();
        assert!(matches!(
            err,
            AlarmError::StorageUnavailable {
                source: StorageFault::Malformed(_),
                ..
            }
        ));
        assert!(err.hint().unwrap().contains("alarms.json"));
    }

    #[test]
    fn test_io_failure_has_no_hint() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be.
        let err = AlarmStore::open(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            AlarmError::StorageUnavailable {
                source: StorageFault::Io(_),
                ..
            }
        ));
        assert_eq!(err.hint(), None);
    }

    #[test]
    fn test_unknown_key_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        fs::write(&path, r#"{"CPU": 80, "Swap": 20}"#).unwrap();

        assert!(matches!(
            load_alarms(&path),
            Err(AlarmError::StorageUnavailable { .. })
        ));
    }

    #[test]
    fn test_reads_legacy_file_with_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        fs::write(&path, r#"{"CPU": 80, "Memory": null}"#).unwrap();

        let store = AlarmStore::open(&path).unwrap();
        assert_eq!(store.alarms().get(MetricKind::Cpu), Some(t(80)));
        assert_eq!(store.alarms().get(MetricKind::Disk), None);
    }

    #[test]
    fn test_failed_save_keeps_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        let path = blocker.join("alarms.json");

        let mut store = AlarmStore::open(&path).unwrap();
        // A plain file where the parent directory should be.
        fs::write(&blocker, "").unwrap();
        let err = store.configure(MetricKind::Cpu, 80).unwrap_err();
        assert!(matches!(
            err,
            AlarmError::StorageUnavailable {
                source: StorageFault::Io(_),
                ..
            }
        ));
        assert!(store.alarms().is_empty());
    }

    #[test]
    fn test_failed_delete_keeps_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let path = data.join("alarms.json");

        let mut store = AlarmStore::open(&path).unwrap();
        store.configure(MetricKind::Cpu, 80).unwrap();
        // Replace the data directory with a plain file.
        fs::remove_dir_all(&data).unwrap();
        fs::write(&data, "").unwrap();

        let err = store.delete(MetricKind::Cpu).unwrap_err();
        assert!(matches!(err, AlarmError::StorageUnavailable { .. }));
        assert_eq!(store.alarms().get(MetricKind::Cpu), Some(t(80)));
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let mut store = AlarmStore::open(&path).unwrap();
        store.configure(MetricKind::Cpu, 80).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        store.delete(MetricKind::Cpu).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        let mut store = AlarmStore::open(&path).unwrap();
        store.configure(MetricKind::Disk, 90).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn test_open_removes_stale_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.json");
        let stale = dir.path().join(".alarms.json.a1b2c3.tmp");
        let unrelated = dir.path().join(".other.json.a1b2c3.tmp");
        let plain = dir.path().join("notes.tmp");
        for file in [&stale, &unrelated, &plain] {
            fs::write(file, "").unwrap();
        }

        AlarmStore::open(&path).unwrap();
        assert!(!stale.exists());
        assert!(unrelated.exists());
        assert!(plain.exists());
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AlarmStore::open(dir.path().join("alarms.json")).unwrap();
        store.configure(MetricKind::Memory, 60).unwrap();
        store.delete(MetricKind::Memory).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("alarms.json")]);
    }

    #[test]
    fn test_configure_then_evaluate_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AlarmStore::open(dir.path().join("alarms.json")).unwrap();
        store.configure(MetricKind::Cpu, 80).unwrap();
        store.configure(MetricKind::Memory, 70).unwrap();

        let events = store.evaluate(&MetricSample::new(85.0, 60.0, 10.0));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, MetricKind::Cpu);
        assert_eq!(events[0].threshold, t(80));
        assert_eq!(events[0].observed, 85.0);
    }

    #[test]
    fn test_sorted_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AlarmStore::open(dir.path().join("alarms.json")).unwrap();
        store.configure(MetricKind::Cpu, 95).unwrap();
        store.configure(MetricKind::Disk, 20).unwrap();

        assert_eq!(
            store.sorted(),
            vec![(MetricKind::Disk, t(20)), (MetricKind::Cpu, t(95))]
        );
    }
}
