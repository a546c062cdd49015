//! Test module for obskey-core
//!
//! This module contains tests for:
//! - Command dispatch and the two-phase filter toggle
//! - Action routing, degraded mode and shutdown
//! - Action parsing and the action file
//! - Configuration loading and overrides
//! - State queries and action validation

mod dispatch_tests;
mod fixtures;
