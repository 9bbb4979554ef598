//! Host metric sampling.
//!
//! [`ProcfsSampler`] reads CPU and memory usage from `/proc` and disk usage
//! through a [`DiskProbe`]. Filesystem access goes through the [`FileSystem`]
//! trait so collectors can be tested against [`mock::MockFs`].

mod disk;
pub mod mock;
pub mod procfs;
mod traits;

pub use disk::{DiskProbe, DiskSpace, StatvfsProbe};
pub use procfs::{DEFAULT_SAMPLE_WINDOW, ProcfsSampler};
pub use traits::{FileSystem, RealFs};

use thiserror::Error;

use crate::alarm::MetricSample;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

/// Source of metric samples.
pub trait MetricSampler {
    /// Takes one reading of CPU, memory and disk usage.
    ///
    /// May block for the sampler's measurement window.
    fn sample(&mut self) -> Result<MetricSample, CollectError>;
}

impl<T: MetricSampler + ?Sized> MetricSampler for Box<T> {
    fn sample(&mut self) -> Result<MetricSample, CollectError> {
        (**self).sample()
    }
}

/// Rounds a percentage to one decimal and clamps it to `0..=100`.
pub(crate) fn round_percent(value: f64) -> f64 {
    ((value * 10.0).round() / 10.0).clamp(0.0, 100.0)
}
