//! Parsers for `/proc` files.
//!
//! These are pure functions over file contents, so they can be tested with
//! string inputs.

use thiserror::Error;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

/// Aggregate CPU time counters from the `cpu` line of `/proc/stat`, in jiffies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuTimes {
    /// Sum of all counters. Guest time is already part of user/nice time
    /// and is not added again. Saturates instead of overflowing.
    pub fn total(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .into_iter()
        .fold(0, u64::saturating_add)
    }

    /// Time the CPUs spent doing nothing, including waits on I/O.
    pub fn idle_all(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    pub fn busy(&self) -> u64 {
        self.total().saturating_sub(self.idle_all())
    }
}

/// Parses the aggregate `cpu` line of `/proc/stat`.
///
/// Older kernels report fewer columns; missing ones read as zero.
pub fn parse_cpu_times(content: &str) -> Result<CpuTimes, ParseError> {
    let line = content
        .lines()
        .find(|line| line.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| ParseError::new("missing aggregate cpu line in /proc/stat"))?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|s| {
            s.parse()
                .map_err(|_| ParseError::new(format!("invalid cpu counter '{}'", s)))
        })
        .collect::<Result<_, _>>()?;

    if fields.len() < 4 {
        return Err(ParseError::new(format!(
            "cpu line has {} counters, expected at least 4",
            fields.len()
        )));
    }

    let get_val = |idx: usize| -> u64 { fields.get(idx).copied().unwrap_or(0) };

    Ok(CpuTimes {
        user: get_val(0),
        nice: get_val(1),
        system: get_val(2),
        idle: get_val(3),
        iowait: get_val(4),
        irq: get_val(5),
        softirq: get_val(6),
        steal: get_val(7),
        guest: get_val(8),
        guest_nice: get_val(9),
    })
}

/// Memory figures from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    /// Absent on kernels older than 3.14.
    pub mem_available: Option<u64>,
}

/// Parses `/proc/meminfo` content.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();

    let parse_kb = |line: &str| -> u64 {
        line.split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            info.mem_total = parse_kb(line);
        } else if line.starts_with("MemFree:") {
            info.mem_free = parse_kb(line);
        } else if line.starts_with("MemAvailable:") {
            info.mem_available = Some(parse_kb(line));
        }
    }

    if info.mem_total == 0 {
        return Err(ParseError::new("MemTotal missing or zero in /proc/meminfo"));
    }

    Ok(info)
}
