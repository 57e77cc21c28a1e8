//! # pcs-pushover
//!
//! Polls ProCyclingStats LiveStats pages and pushes a handful of race
//! moments to Pushover: start, 100/50/10 km to go, and finish.
//!
//! Per-race bookkeeping lives in a JSON state file so restarts never repeat
//! a notification. Upstream outages are counted per race and reported with
//! a cooldown.

pub mod config;
pub mod discover;
pub mod engine;
pub mod error;
pub mod filters;
pub mod format;
pub mod model;
pub mod notify;
pub mod source;
pub mod storage;
pub mod telemetry;
