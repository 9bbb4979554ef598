//! Surveillance loop: sample, evaluate, report, repeat until cancelled.

mod cancel;
mod output;
mod surveillance;

pub use cancel::{CancelAfter, CancelFactory, CancelSignal, KeypressSignal, ShutdownFlag};
pub use output::CrlfWriter;
pub use surveillance::{Monitor, MonitorSummary, report_alerts};
