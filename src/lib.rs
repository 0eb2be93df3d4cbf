//! Session Ledger - Per-session concurrent state core
//!
//! Many conversational sessions mutate their own running tab at once. This
//! crate provides the pieces that keep that correct: a per-session lock table,
//! lazily created session records, an optimistic-concurrency payment ledger,
//! token-bucket admission control and a sweeper that retires idle sessions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
