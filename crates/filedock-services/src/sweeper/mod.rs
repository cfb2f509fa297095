pub mod service;

pub use service::{BatchSweeper, SweepOutcome};
