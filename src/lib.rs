//! ARBITER — Intra-Market Arbitrage Engine for Binary Prediction Markets
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod gateway;
pub mod signals;
pub mod strategy;
pub mod engine;
pub mod storage;
