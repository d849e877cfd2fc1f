//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the runtime:
//! - Dynamic type helpers for trait objects
//! - Handle types for slot-map backed storage
//! - Frame timing
//! - Logging utilities

pub mod any;
pub mod collections;
pub mod time;
pub mod logging;
