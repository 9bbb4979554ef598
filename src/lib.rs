//! hostwatch - Host resource alarms library.
//!
//! Provides the pieces used by the `hostwatch` binary:
//! - `alarm` - alarm thresholds, their JSON store and evaluation
//! - `collector` - CPU, memory and disk usage sampling
//! - `monitor` - the surveillance loop and its stop signals
//! - `menu` - the interactive console menu

pub mod alarm;
pub mod collector;
pub mod logging;
pub mod menu;
pub mod monitor;
