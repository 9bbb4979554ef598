//! Mock collectors for testing.
//!
//! This module provides `MockFs`, pre-built `/proc` scenarios, a fixed disk
//! probe and a scripted sampler, so the alarm loop can be exercised without
//! Linux `/proc` access.

mod filesystem;
mod sampler;
mod scenarios;

pub use filesystem::MockFs;
pub use sampler::{FixedDisk, ScriptedSampler};
