//! Board configuration
//!
//! Compile-time constants describing one hardware revision.

pub mod board;

pub use board::*;
