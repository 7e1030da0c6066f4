//! Time abstractions
//!
//! Production code reads time through [`Clock`] so debounce windows, cache
//! TTLs and sync watermarks can be exercised with [`MockClock`] without real
//! delays.

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
