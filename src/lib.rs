//! featrun - parallel feature-unit test runner
//!
//! Runs independent feature units concurrently on a bounded worker
//! pool while keeping the shared report stream readable: every
//! reporting call a unit makes is recorded privately while it runs,
//! then replayed onto the consumers as one uninterrupted block.
//!
//! The pieces, in the order a run touches them:
//!
//! - [`models`]: units, reporting event payloads, run outcomes
//! - [`sink`]: the capability traits consumers and engines speak
//! - [`engine`]: unit execution ([`engine::OutlineEngine`] runs
//!   `.outline` files)
//! - [`record`] / [`replay`]: private capture and serialized playback
//! - [`consumer`]: the shared, lock-guarded consumer set
//! - [`executor`]: bounded pool, per-unit runner, stream finalizer
//! - [`output`]: pretty, progress and JSON consumers

pub mod cli;
pub mod config;
pub mod consumer;
pub mod engine;
pub mod executor;
pub mod models;
pub mod output;
pub mod record;
pub mod replay;
pub mod results;
pub mod sink;
pub mod utils;
