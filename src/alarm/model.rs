//! Value types shared by the alarm store, the evaluator and the collectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::AlarmError;

/// Metric categories an alarm can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Cpu,
    Memory,
    Disk,
}

impl MetricKind {
    /// All kinds, in evaluation order.
    pub const ALL: [MetricKind; 3] = [MetricKind::Cpu, MetricKind::Memory, MetricKind::Disk];

    /// Name used as the storage key and in log messages.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Cpu => "CPU",
            MetricKind::Memory => "Memory",
            MetricKind::Disk => "Disk",
        }
    }

    /// Human-readable label for prompts and warnings.
    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Cpu => "CPU usage",
            MetricKind::Memory => "Memory usage",
            MetricKind::Disk => "Disk usage",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = AlarmError;

    /// Parses a storage key, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| AlarmError::InvalidKind(name.to_string()))
    }
}

/// Alarm threshold as a whole percentage in `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Threshold(u8);

impl Threshold {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;

    pub fn new(percent: u32) -> Result<Self, AlarmError> {
        if (Self::MIN..=Self::MAX).contains(&percent) {
            // Range check above keeps the value within u8.
            Ok(Self(percent as u8))
        } else {
            Err(AlarmError::OutOfRange(percent))
        }
    }

    pub fn get(self) -> u32 {
        u32::from(self.0)
    }

    /// Strictly greater-than: a reading equal to the threshold does not breach it.
    pub fn is_exceeded_by(self, observed: f64) -> bool {
        observed > f64::from(self.0)
    }
}

impl TryFrom<u32> for Threshold {
    type Error = AlarmError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Threshold::new(value)
    }
}

impl From<Threshold> for u32 {
    fn from(threshold: Threshold) -> Self {
        threshold.get()
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Optional threshold for each of the three metric kinds.
///
/// The serialized form always carries the keys `CPU`, `Memory` and `Disk`,
/// with `null` for unset entries. Missing keys load as unset; unknown keys
/// are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlarmSet {
    #[serde(rename = "CPU", default)]
    cpu: Option<Threshold>,
    #[serde(rename = "Memory", default)]
    memory: Option<Threshold>,
    #[serde(rename = "Disk", default)]
    disk: Option<Threshold>,
}

impl AlarmSet {
    /// Returns a copy of this set with `kind` set to `threshold`.
    pub fn with(mut self, kind: MetricKind, threshold: Threshold) -> Self {
        self.set(kind, Some(threshold));
        self
    }

    pub fn get(&self, kind: MetricKind) -> Option<Threshold> {
        match kind {
            MetricKind::Cpu => self.cpu,
            MetricKind::Memory => self.memory,
            MetricKind::Disk => self.disk,
        }
    }

    /// Replaces the entry for `kind`, returning the previous one.
    pub(crate) fn set(
        &mut self,
        kind: MetricKind,
        threshold: Option<Threshold>,
    ) -> Option<Threshold> {
        let slot = match kind {
            MetricKind::Cpu => &mut self.cpu,
            MetricKind::Memory => &mut self.memory,
            MetricKind::Disk => &mut self.disk,
        };
        std::mem::replace(slot, threshold)
    }

    /// Every kind with its entry, in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, Option<Threshold>)> + '_ {
        MetricKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }

    /// Set entries only, in evaluation order.
    pub fn configured(&self) -> Vec<(MetricKind, Threshold)> {
        self.iter()
            .filter_map(|(kind, threshold)| threshold.map(|t| (kind, t)))
            .collect()
    }

    /// Set entries ordered by ascending threshold. Ties keep evaluation order.
    pub fn sorted_by_threshold(&self) -> Vec<(MetricKind, Threshold)> {
        let mut entries = self.configured();
        entries.sort_by_key(|&(_, threshold)| threshold);
        entries
    }

    /// True when no kind has a threshold.
    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, threshold)| threshold.is_none())
    }
}

/// One reading of all three metrics, as percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricSample {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
}

impl MetricSample {
    pub fn new(cpu_usage: f64, memory_usage: f64, disk_usage: f64) -> Self {
        Self {
            cpu_usage,
            memory_usage,
            disk_usage,
        }
    }

    pub fn value(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Cpu => self.cpu_usage,
            MetricKind::Memory => self.memory_usage,
            MetricKind::Disk => self.disk_usage,
        }
    }
}

/// A breached alarm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertEvent {
    pub kind: MetricKind,
    pub threshold: Threshold,
    pub observed: f64,
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} above {} (observed {:.1}%)",
            self.kind.label(),
            self.threshold,
            self.observed
        )
    }
}
