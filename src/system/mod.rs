//! System utilities and monitoring
//!
//! This module contains process-level monitoring for the store.

pub mod metrics;
