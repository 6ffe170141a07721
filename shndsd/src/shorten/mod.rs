//! Shorten (.shn) bitstream decoding.
//!
//! A Shorten stream is a Golomb-Rice coded command stream. After a fixed
//! header ([`header::StreamHeader`]) and an embedded verbatim copy of the
//! original RIFF/WAVE or AIFF container header ([`container`]), the stream
//! is a flat sequence of commands cycling through the channels round-robin:
//! fixed polynomial predictors (DIFF0-DIFF3), adaptive quantized LPC,
//! zero blocks, and the side-band commands that shrink the block size,
//! set the renormalization bit shift, or embed literal bytes.
//!
//! [`decode::ShortenDecoder`] drives the whole pipeline: open parses the
//! header and container, then each `decode_block` call yields one frame of
//! planar PCM until `FN_QUIT` ends the stream.

pub mod container;
pub mod decode;
pub mod header;

/// Width of a command token.
pub(crate) const FNSIZE: u32 = 2;

pub(crate) const FN_DIFF0: u32 = 0;
pub(crate) const FN_DIFF1: u32 = 1;
pub(crate) const FN_DIFF2: u32 = 2;
pub(crate) const FN_DIFF3: u32 = 3;
pub(crate) const FN_QUIT: u32 = 4;
pub(crate) const FN_BLOCKSIZE: u32 = 5;
pub(crate) const FN_BITSHIFT: u32 = 6;
pub(crate) const FN_QLPC: u32 = 7;
pub(crate) const FN_ZERO: u32 = 8;
pub(crate) const FN_VERBATIM: u32 = 9;

/// Suffix width of a residual-size field.
pub(crate) const ENERGYSIZE: u32 = 3;
/// Suffix width of a bit-shift field.
pub(crate) const BITSHIFTSIZE: u32 = 2;
/// Suffix width of an LPC order field.
pub(crate) const LPCQSIZE: u32 = 2;
/// Quantization shift of LPC coefficients; also their suffix width.
pub(crate) const LPCQUANT: u32 = 5;
/// Suffix width of a header skip byte.
pub(crate) const XBYTESIZE: u32 = 7;
/// Suffix width of a verbatim length field.
pub(crate) const VERBATIM_CKSIZE_SIZE: u32 = 5;
/// Suffix width of a verbatim payload byte.
pub(crate) const VERBATIM_BYTE_SIZE: u32 = 8;
/// Upper bound on a single verbatim chunk.
pub(crate) const VERBATIM_CHUNK_MAX: u32 = 256;

#[cfg(test)]
pub(crate) mod testkit;
