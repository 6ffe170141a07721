#![doc = include_str!("../README.md")]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use shndsd::shorten::decode::ShortenDecoder;
//!
//! let file = File::open("track.shn")?;
//! let mut decoder = ShortenDecoder::open(file)?;
//!
//! println!("{} Hz", decoder.format().sample_rate);
//! while let Some(block) = decoder.decode_block()? {
//!     for channel in &block.channels {
//!         // Planar PCM, one Vec<i32> per channel.
//!         let _ = channel.len();
//!     }
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Shorten bitstream decoding.
///
/// - **Header** ([`shorten::header`]): magic, version, and coder parameters
/// - **Container** ([`shorten::container`]): embedded WAVE/AIFF header sniffing
/// - **Decoder** ([`shorten::decode`]): the command-stream decode loop
pub mod shorten;

/// DSD to PCM decimation.
pub mod dsd;

/// Supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream`]): Rice and `ulong` field reading
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
