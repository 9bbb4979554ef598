//! Cooperative cancellation for the surveillance loop.
//!
//! The loop polls its signal once per cycle, after the wait and the
//! evaluation; nothing interrupts a wait that is already in progress.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;
use tracing::{info, warn};

/// Polled stop request.
pub trait CancelSignal {
    /// Returns true once the loop should stop.
    fn is_cancelled(&mut self) -> bool;
}

/// Creates a fresh signal for each surveillance session.
pub type CancelFactory = Box<dyn FnMut() -> io::Result<Box<dyn CancelSignal>>>;

/// Shared stop flag, set from a Ctrl-C handler or another thread.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    stopped: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag when the process receives Ctrl-C or SIGTERM.
    pub fn install_ctrlc(&self) -> Result<(), ctrlc::Error> {
        let stopped = self.stopped.clone();
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            stopped.store(true, Ordering::SeqCst);
        })
    }

    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl CancelSignal for ShutdownFlag {
    fn is_cancelled(&mut self) -> bool {
        self.is_set()
    }
}

/// Stops on the first key press.
///
/// The terminal is switched to raw mode while the signal is alive so key
/// presses are seen without waiting for Enter; dropping the signal restores
/// the previous mode. The key that ends the loop is consumed.
#[derive(Debug)]
pub struct KeypressSignal {
    _raw_mode: (),
}

impl KeypressSignal {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { _raw_mode: () })
    }
}

impl CancelSignal for KeypressSignal {
    fn is_cancelled(&mut self) -> bool {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => return true,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Failed to read terminal event: {}", e);
                        return false;
                    }
                },
                Ok(false) => return false,
                Err(e) => {
                    warn!("Failed to poll terminal events: {}", e);
                    return false;
                }
            }
        }
    }
}

impl Drop for KeypressSignal {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// Cancels after a fixed number of polls. Useful for bounded runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct CancelAfter {
    remaining: u64,
}

impl CancelAfter {
    /// Fires on the `cycles`-th poll, or on the first one when `cycles` is zero.
    pub fn new(cycles: u64) -> Self {
        Self { remaining: cycles }
    }
}

impl CancelSignal for CancelAfter {
    fn is_cancelled(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_flag_shared_between_clones() {
        let flag = ShutdownFlag::new();
        let mut handle = flag.clone();
        assert!(!handle.is_cancelled());
        flag.trigger();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_cancel_after_counts_polls() {
        let mut signal = CancelAfter::new(3);
        assert!(!signal.is_cancelled());
        assert!(!signal.is_cancelled());
        assert!(signal.is_cancelled());
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_cancel_after_zero_fires_immediately() {
        assert!(CancelAfter::new(0).is_cancelled());
    }
}
