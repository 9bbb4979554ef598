//! The surveillance loop.

use std::io::{self, Write};
use std::time::Duration;

use tracing::{error, info, warn};

use super::cancel::CancelSignal;
use crate::alarm::{AlarmStore, AlertEvent};
use crate::collector::MetricSampler;

/// Counters for one surveillance session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    pub cycles: u64,
    pub alerts: u64,
    pub failed_samples: u64,
}

/// Periodic alarm evaluation.
///
/// Each cycle prints the banner, waits one interval, takes a sample,
/// reports every breached alarm and then polls the cancel signal.
#[derive(Debug, Clone)]
pub struct Monitor {
    interval: Duration,
    banner: String,
}

impl Monitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            banner: "Surveillance mode active. Press any key to exit.".to_string(),
        }
    }

    /// Replaces the line printed at the start of every cycle.
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    /// Runs cycles until `cancel` fires.
    ///
    /// A failed sample is logged and counted; the loop carries on with the
    /// next cycle. Only write errors on `out` end the loop early.
    pub fn run(
        &self,
        sampler: &mut dyn MetricSampler,
        store: &AlarmStore,
        cancel: &mut dyn CancelSignal,
        out: &mut dyn Write,
    ) -> io::Result<MonitorSummary> {
        info!(
            "Surveillance started: interval={}s, {} alarm(s) configured",
            self.interval.as_secs_f64(),
            store.alarms().configured().len()
        );

        let mut summary = MonitorSummary::default();
        loop {
            writeln!(out, "{}", self.banner)?;
            out.flush()?;

            std::thread::sleep(self.interval);
            summary.cycles += 1;

            match sampler.sample() {
                Ok(sample) => {
                    let events = store.evaluate(&sample);
                    summary.alerts += events.len() as u64;
                    report_alerts(&events, out)?;
                }
                Err(e) => {
                    summary.failed_samples += 1;
                    error!("Failed to sample system metrics: {}", e);
                }
            }

            if cancel.is_cancelled() {
                break;
            }
        }

        info!(
            "Surveillance stopped after {} cycle(s): {} alert(s), {} failed sample(s)",
            summary.cycles, summary.alerts, summary.failed_samples
        );
        Ok(summary)
    }
}

/// Prints and logs each alert event.
pub fn report_alerts(events: &[AlertEvent], out: &mut dyn Write) -> io::Result<()> {
    for event in events {
        writeln!(out, "***WARNING: {}***", event)?;
        warn!(
            "{} exceeds {} (observed {:.1}%)",
            event.kind.label(),
            event.threshold,
            event.observed
        );
    }
    out.flush()
}
