//! Integration test harness.

mod fixtures;
mod simulation;
