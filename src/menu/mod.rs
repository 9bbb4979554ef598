//! Interactive console menu.
//!
//! The menu drives the alarm store, the sampler and the surveillance loop
//! from line-based input. It is generic over its input and output so whole
//! sessions can be scripted in tests.

mod prompt;

use std::io::{self, BufRead, Write};

use tracing::{error, info};

pub use prompt::prompt_number;

use crate::alarm::{AlarmStore, MetricKind};
use crate::collector::MetricSampler;
use crate::monitor::{CancelFactory, CrlfWriter, Monitor};

/// Main menu entries, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainChoice {
    StartMonitoring,
    ListActive,
    ConfigureAlarm,
    ListAlarms,
    Surveillance,
    DeleteAlarm,
    Exit,
}

impl MainChoice {
    const ALL: [MainChoice; 7] = [
        MainChoice::StartMonitoring,
        MainChoice::ListActive,
        MainChoice::ConfigureAlarm,
        MainChoice::ListAlarms,
        MainChoice::Surveillance,
        MainChoice::DeleteAlarm,
        MainChoice::Exit,
    ];

    fn from_number(n: u32) -> Option<Self> {
        let index = usize::try_from(n.checked_sub(1)?).ok()?;
        Self::ALL.get(index).copied()
    }

    fn title(self) -> &'static str {
        match self {
            MainChoice::StartMonitoring => "Start monitoring",
            MainChoice::ListActive => "List active monitoring",
            MainChoice::ConfigureAlarm => "Configure alarm",
            MainChoice::ListAlarms => "List configured alarms",
            MainChoice::Surveillance => "Start surveillance mode",
            MainChoice::DeleteAlarm => "Delete alarm",
            MainChoice::Exit => "Exit",
        }
    }
}

/// One interactive session over the alarm store.
///
/// Surveillance and the active-monitoring view stay locked until
/// "Start monitoring" has been chosen.
pub struct Menu<'a, R: BufRead, W: Write> {
    store: &'a mut AlarmStore,
    sampler: Box<dyn MetricSampler>,
    monitor: Monitor,
    cancel: CancelFactory,
    input: R,
    out: W,
    started: bool,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    /// Creates a menu session.
    ///
    /// # Arguments
    /// * `store` - Alarm configuration edited by the session
    /// * `sampler` - Metric source for surveillance and the active view
    /// * `monitor` - Surveillance loop settings
    /// * `cancel` - Creates the stop signal for each surveillance run
    /// * `input` / `out` - Console streams
    pub fn new(
        store: &'a mut AlarmStore,
        sampler: Box<dyn MetricSampler>,
        monitor: Monitor,
        cancel: CancelFactory,
        input: R,
        out: W,
    ) -> Self {
        Self {
            store,
            sampler,
            monitor,
            cancel,
            input,
            out,
            started: false,
        }
    }

    /// Runs the menu until the user exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        info!("Main menu shown");
        loop {
            writeln!(self.out)?;
            writeln!(self.out, "--- System monitoring menu ---")?;
            for (i, choice) in MainChoice::ALL.iter().enumerate() {
                writeln!(self.out, "{}. {}", i + 1, choice.title())?;
            }

            let max = MainChoice::ALL.len() as u32;
            let prompt = format!("Choose an option (1-{}): ", max);
            let Some(choice) = self.ask(&prompt, 1, max)?.and_then(MainChoice::from_number) else {
                info!("Input closed, leaving menu");
                return Ok(());
            };
            info!("User chose: {}", choice.title());

            match choice {
                MainChoice::StartMonitoring => self.start_monitoring()?,
                MainChoice::ListActive => self.list_active_monitoring()?,
                MainChoice::ConfigureAlarm => self.configure_alarm()?,
                MainChoice::ListAlarms => self.list_alarms()?,
                MainChoice::Surveillance => self.surveillance_mode()?,
                MainChoice::DeleteAlarm => self.delete_alarm()?,
                MainChoice::Exit => {
                    writeln!(self.out, "Exiting...")?;
                    info!("Program exited by user");
                    return Ok(());
                }
            }
        }
    }

    fn ask(&mut self, prompt: &str, min: u32, max: u32) -> io::Result<Option<u32>> {
        prompt_number(&mut self.input, &mut self.out, prompt, min, max)
    }

    fn wait_for_enter(&mut self) -> io::Result<()> {
        write!(self.out, "Press Enter to continue...")?;
        self.out.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(())
    }

    fn start_monitoring(&mut self) -> io::Result<()> {
        writeln!(self.out, "Monitoring started...")?;
        self.started = true;
        info!("Monitoring enabled");
        Ok(())
    }

    fn not_started(&mut self) -> io::Result<()> {
        writeln!(self.out, "Monitoring has not been started.")?;
        info!("Request refused: monitoring has not been started");
        Ok(())
    }

    fn list_active_monitoring(&mut self) -> io::Result<()> {
        if !self.started {
            return self.not_started();
        }

        match self.sampler.sample() {
            Ok(sample) => {
                writeln!(self.out, "Active monitoring:")?;
                for kind in MetricKind::ALL {
                    let alarm = match self.store.alarms().get(kind) {
                        Some(threshold) => format!("alarm at {}", threshold),
                        None => "no alarm".to_string(),
                    };
                    writeln!(
                        self.out,
                        "{}: {:.1}% ({})",
                        kind.label(),
                        sample.value(kind),
                        alarm
                    )?;
                }
            }
            Err(e) => {
                writeln!(self.out, "Failed to read system metrics: {}", e)?;
                error!("Failed to sample system metrics: {}", e);
            }
        }
        self.wait_for_enter()
    }

    fn configure_alarm(&mut self) -> io::Result<()> {
        for (i, kind) in MetricKind::ALL.iter().enumerate() {
            writeln!(self.out, "{}. {}", i + 1, kind.label())?;
        }
        let back = MetricKind::ALL.len() as u32 + 1;
        writeln!(self.out, "{}. Back to main menu", back)?;

        let prompt = format!("Choose an option (1-{}): ", back);
        let Some(choice) = self.ask(&prompt, 1, back)? else {
            return Ok(());
        };
        if choice == back {
            info!("User returned to the main menu without configuring an alarm");
            return Ok(());
        }
        let kind = MetricKind::ALL[(choice - 1) as usize];

        let prompt = format!("Enter threshold for {} (1-100%): ", kind.label());
        let Some(percent) = self.ask(&prompt, 1, 100)? else {
            return Ok(());
        };

        match self.store.configure(kind, percent) {
            Ok(threshold) => writeln!(self.out, "Alarm for {} set to {}", kind, threshold)?,
            Err(e) => {
                writeln!(self.out, "Could not configure alarm: {}", e)?;
                error!("Failed to configure alarm for {}: {}", kind, e);
            }
        }
        Ok(())
    }

    fn list_alarms(&mut self) -> io::Result<()> {
        writeln!(self.out, "Configured alarms (sorted):")?;
        let sorted = self.store.sorted();
        if sorted.is_empty() {
            writeln!(self.out, "No alarms configured.")?;
        }
        for (kind, threshold) in sorted {
            writeln!(self.out, "{}: {}", kind, threshold)?;
        }
        self.wait_for_enter()
    }

    fn delete_alarm(&mut self) -> io::Result<()> {
        let configured = self.store.alarms().configured();
        if configured.is_empty() {
            writeln!(self.out, "No alarms to delete.")?;
            info!("No alarms to delete");
            return Ok(());
        }

        writeln!(self.out, "Choose an alarm to delete:")?;
        for (i, (kind, threshold)) in configured.iter().enumerate() {
            writeln!(self.out, "{}. {}: {}", i + 1, kind, threshold)?;
        }

        let count = configured.len() as u32;
        let Some(choice) = self.ask("Choose the number of the alarm to delete: ", 1, count)? else {
            return Ok(());
        };
        let (kind, _) = configured[(choice - 1) as usize];

        match self.store.delete(kind) {
            Ok(removed) => writeln!(self.out, "Alarm for {} at {} removed", kind, removed)?,
            Err(e) => {
                writeln!(self.out, "Could not delete alarm: {}", e)?;
                error!("Failed to delete alarm for {}: {}", kind, e);
            }
        }
        Ok(())
    }

    fn surveillance_mode(&mut self) -> io::Result<()> {
        if !self.started {
            return self.not_started();
        }

        let mut cancel = match (self.cancel)() {
            Ok(cancel) => cancel,
            Err(e) => {
                writeln!(self.out, "Cannot watch the keyboard: {}", e)?;
                error!("Failed to set up key press detection: {}", e);
                return Ok(());
            }
        };

        info!("Surveillance mode started");
        let result = {
            let mut out = CrlfWriter::new(&mut self.out);
            self.monitor
                .run(self.sampler.as_mut(), &*self.store, cancel.as_mut(), &mut out)
        };
        // Restores the terminal before anything else is printed.
        drop(cancel);

        let summary = result?;
        writeln!(
            self.out,
            "Surveillance mode ended after {} cycle(s).",
            summary.cycles
        )?;
        info!("Surveillance mode ended by user");
        Ok(())
    }
}
