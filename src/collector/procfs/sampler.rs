//! Sampler combining `/proc/stat`, `/proc/meminfo` and a disk probe.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::parser::{CpuTimes, MemInfo, parse_cpu_times, parse_meminfo};
use crate::alarm::MetricSample;
use crate::collector::disk::DiskProbe;
use crate::collector::traits::FileSystem;
use crate::collector::{CollectError, MetricSampler, round_percent};

/// Time between the two `/proc/stat` readings used for CPU usage.
pub const DEFAULT_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Samples CPU, memory and disk usage.
///
/// CPU usage is the busy share of the time that passed between two readings
/// of `/proc/stat` taken `window` apart, so [`MetricSampler::sample`] blocks
/// for that long.
pub struct ProcfsSampler<F: FileSystem, D: DiskProbe> {
    fs: F,
    proc_path: String,
    disk: D,
    disk_path: PathBuf,
    window: Duration,
}

impl<F: FileSystem, D: DiskProbe> ProcfsSampler<F, D> {
    /// Creates a sampler.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `disk` - Probe used for the disk metric
    pub fn new(fs: F, proc_path: impl Into<String>, disk: D) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            disk,
            disk_path: PathBuf::from("/"),
            window: DEFAULT_SAMPLE_WINDOW,
        }
    }

    /// Sets the mount point whose usage is reported as the disk metric.
    pub fn with_disk_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.disk_path = path.into();
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn read_cpu_times(&self) -> Result<CpuTimes, CollectError> {
        let path = format!("{}/stat", self.proc_path);
        let content = self.fs.read_to_string(Path::new(&path))?;
        parse_cpu_times(&content).map_err(|e| CollectError::Parse(e.message))
    }

    pub fn read_meminfo(&self) -> Result<MemInfo, CollectError> {
        let path = format!("{}/meminfo", self.proc_path);
        let content = self.fs.read_to_string(Path::new(&path))?;
        parse_meminfo(&content).map_err(|e| CollectError::Parse(e.message))
    }
}

impl<F: FileSystem, D: DiskProbe> MetricSampler for ProcfsSampler<F, D> {
    fn sample(&mut self) -> Result<MetricSample, CollectError> {
        let before = self.read_cpu_times()?;
        if !self.window.is_zero() {
            std::thread::sleep(self.window);
        }
        let after = self.read_cpu_times()?;

        let sample = MetricSample {
            cpu_usage: cpu_percent(&before, &after),
            memory_usage: memory_percent(&self.read_meminfo()?),
            disk_usage: self.disk.space(&self.disk_path)?.used_percent(),
        };
        debug!(
            "Sampled cpu={:.1}% memory={:.1}% disk={:.1}%",
            sample.cpu_usage, sample.memory_usage, sample.disk_usage
        );
        Ok(sample)
    }
}

/// CPU usage between two `/proc/stat` readings, in percent.
///
/// Returns 0.0 when no time passed or the counters went backwards.
pub fn cpu_percent(before: &CpuTimes, after: &CpuTimes) -> f64 {
    let total = after.total().saturating_sub(before.total());
    if total == 0 {
        return 0.0;
    }
    let busy = after.busy().saturating_sub(before.busy());
    round_percent(busy as f64 / total as f64 * 100.0)
}

/// Share of memory not available to new allocations, in percent.
///
/// Falls back to `MemFree` on kernels without `MemAvailable`.
pub fn memory_percent(info: &MemInfo) -> f64 {
    if info.mem_total == 0 {
        return 0.0;
    }
    let available = info.mem_available.unwrap_or(info.mem_free);
    let used = info.mem_total.saturating_sub(available);
    round_percent(used as f64 / info.mem_total as f64 * 100.0)
}
