//! Filesystem space usage for the disk metric.

use std::path::Path;

use super::{CollectError, round_percent};

/// Space figures for one mounted filesystem, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskSpace {
    pub total: u64,
    pub free: u64,
    /// Free space usable by unprivileged users.
    pub available: u64,
}

impl DiskSpace {
    /// Used share of the filesystem, as `df` reports it.
    ///
    /// Blocks reserved for root count neither as used nor as available.
    pub fn used_percent(&self) -> f64 {
        let used = self.total.saturating_sub(self.free);
        let usable = used.saturating_add(self.available);
        if usable == 0 {
            return 0.0;
        }
        round_percent(used as f64 / usable as f64 * 100.0)
    }
}

/// Reports space usage for the filesystem containing a path.
pub trait DiskProbe {
    fn space(&self, path: &Path) -> Result<DiskSpace, CollectError>;
}

/// `statvfs(3)` based probe.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatvfsProbe;

impl DiskProbe for StatvfsProbe {
    #[cfg(unix)]
    fn space(&self, path: &Path) -> Result<DiskSpace, CollectError> {
        let stat = nix::sys::statvfs::statvfs(path).map_err(std::io::Error::from)?;
        let fragment = u64::from(stat.fragment_size());
        Ok(DiskSpace {
            total: u64::from(stat.blocks()).saturating_mul(fragment),
            free: u64::from(stat.blocks_free()).saturating_mul(fragment),
            available: u64::from(stat.blocks_available()).saturating_mul(fragment),
        })
    }

    #[cfg(not(unix))]
    fn space(&self, _path: &Path) -> Result<DiskSpace, CollectError> {
        Err(CollectError::Unsupported("disk usage"))
    }
}
