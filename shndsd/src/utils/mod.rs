//! Utility functions and supporting infrastructure.
//!
//! Provides the Golomb-Rice bitstream reader and the error types shared
//! by the Shorten and DSD decoding paths.

pub mod bitstream;
pub mod errors;
