//! Utility functions and helpers for the quotagate gateway.
//!
//! This module provides cross-cutting concerns like structured logging,
//! secret sanitization, the wall clock used for TTLs and quota windows, and
//! retry logic with backoff for provider calls.
//!
//! # Submodules
//!
//! - `clock`: Unix-seconds clock abstraction with a manual clock for tests.
//! - `logging`: Tracing and logging initialization with security filters.
//! - `retry`: Retry mechanism that respects upstream `Retry-After` hints.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod clock;
pub mod logging;
pub mod retry;
