//! Core engine — detect → gate → size → execute, once per scan cycle.

pub mod cycle;
pub mod detector;
pub mod executor;

pub use cycle::{CycleReport, Engine};
pub use detector::OpportunityDetector;
pub use executor::ExecutionCoordinator;
