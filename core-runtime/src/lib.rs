//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the collection core:
//! - Logging and tracing infrastructure
//! - Typed configuration
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions, configuration defaults and event
//! broadcasting used throughout the workspace.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
