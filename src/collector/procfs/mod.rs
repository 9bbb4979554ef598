//! CPU and memory usage from the Linux `/proc` filesystem.

pub mod parser;
mod sampler;

pub use sampler::{DEFAULT_SAMPLE_WINDOW, ProcfsSampler, cpu_percent, memory_percent};
