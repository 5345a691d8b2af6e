//! Integration test suite for the Binity updater
//!
//! These tests drive the public API against a local `wiremock` release feed
//! and a fake install in a temporary directory. Handoff tests use a recording
//! process control, so no real process is ever started or killed.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **check**: version gate, skip, cooldown and asset selection through a session
//! - **download**: staging paths and post-download integrity checks
//! - **handoff**: apply, the helper routine and next-startup consumption
//! - **end_to_end**: check -> download -> apply -> restart scenarios
//! - **cli**: the binary's commands and startup switches

mod common;

mod check;
mod cli;
mod end_to_end;
mod handoff;
