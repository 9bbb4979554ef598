//! Deterministic samplers and probes.

use std::collections::VecDeque;
use std::io;
use std::path::Path;

use crate::alarm::MetricSample;
use crate::collector::disk::{DiskProbe, DiskSpace};
use crate::collector::{CollectError, MetricSampler};

/// Disk probe that always reports the same figures.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedDisk(DiskSpace);

impl FixedDisk {
    pub fn new(space: DiskSpace) -> Self {
        Self(space)
    }
}

impl DiskProbe for FixedDisk {
    fn space(&self, _path: &Path) -> Result<DiskSpace, CollectError> {
        Ok(self.0)
    }
}

/// Sampler that replays a fixed script of readings and failures.
///
/// Once the script runs out every call fails.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSampler {
    steps: VecDeque<Option<MetricSample>>,
    calls: usize,
}

impl ScriptedSampler {
    pub fn new(samples: impl IntoIterator<Item = MetricSample>) -> Self {
        Self {
            steps: samples.into_iter().map(Some).collect(),
            calls: 0,
        }
    }

    /// Appends a reading.
    pub fn then(mut self, sample: MetricSample) -> Self {
        self.steps.push_back(Some(sample));
        self
    }

    /// Appends a failed reading.
    pub fn then_fail(mut self) -> Self {
        self.steps.push_back(None);
        self
    }

    /// Number of times `sample` has been called.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl MetricSampler for ScriptedSampler {
    fn sample(&mut self) -> Result<MetricSample, CollectError> {
        self.calls += 1;
        match self.steps.pop_front() {
            Some(Some(sample)) => Ok(sample),
            Some(None) => Err(CollectError::Parse("scripted failure".to_string())),
            None => Err(CollectError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "scripted samples exhausted",
            ))),
        }
    }
}
