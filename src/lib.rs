//! projrc: distribute a configuration overlay from a central repository.
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod sync;
