//! Threshold alarms for host metrics.
//!
//! An [`AlarmSet`] holds at most one threshold per [`MetricKind`]. The
//! [`AlarmStore`] owns the set, persists it as JSON after every mutation,
//! and [`evaluate`] turns a [`MetricSample`] into the list of breached alarms.

mod error;
mod evaluator;
mod model;
mod store;

pub use error::{AlarmError, StorageFault};
pub use evaluator::evaluate;
pub use model::{AlarmSet, AlertEvent, MetricKind, MetricSample, Threshold};
pub use store::{AlarmStore, load_alarms, save_alarms};
