//! Secret handling utilities.
//!
//! Re-exports secrecy types so callers expose Pushover credentials only at
//! the point of sending.

pub use secrecy::{ExposeSecret, SecretString};
