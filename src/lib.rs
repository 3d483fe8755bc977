//! Cheerdeck - Creator support server
//!
//! This library crate exposes the core functionality for integration testing.

pub mod actions;
pub mod config;
pub mod engine;
pub mod pipeline;
pub mod playback;
pub mod providers;
pub mod server;
pub mod state;
