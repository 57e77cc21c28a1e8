//! Race engine: transition rules, upstream health, and the polling loop.

pub mod health;
pub mod transition;
pub mod watcher;

pub use health::{AlertPolicy, HealthState, SourceHealth};
pub use transition::{Transition, evaluate};
pub use watcher::{PollOutcome, ShutdownHandle, TrackedRace, WatchConfig, Watcher};
