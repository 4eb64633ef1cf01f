//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - 2D math types and transforms
//! - Handle-based collections
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod logging;
