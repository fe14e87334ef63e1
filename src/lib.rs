//! Downpour, an adaptive-concurrency bulk download queue.
//!
//! Accepts a batch of opaque download tasks and executes them with a
//! self-tuning worker pool: bounded parallelism, automatic retry with
//! linear backoff, fingerprint deduplication, rolling performance
//! metrics, and a per-run summary handed to a capped history store.

pub mod adapter;
pub mod config;
pub mod dedup;
pub mod error;
pub mod history;
pub mod metrics;
pub mod queue;
pub mod report;
pub mod retry;
pub mod runner;
pub mod task;
pub mod tuning;
