//! # Resilience Patterns
//!
//! Retry helpers for calls that may transiently fail, built around an
//! exponential [`Backoff`] with jitter.

pub mod backoff;

pub use backoff::Backoff;
