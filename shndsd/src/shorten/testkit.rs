//! Helpers for building synthetic Shorten streams in tests.

use crate::utils::bitstream::testkit::RiceWriter;

use super::header::MAGIC;
use super::{
    BITSHIFTSIZE, ENERGYSIZE, FN_BITSHIFT, FN_BLOCKSIZE, FN_QLPC, FN_QUIT, FN_VERBATIM, FNSIZE,
    LPCQSIZE, LPCQUANT, VERBATIM_BYTE_SIZE, VERBATIM_CKSIZE_SIZE,
};

/// Minimal canonical RIFF/WAVE header for embedding as a verbatim chunk.
pub(crate) fn wave_header(channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&36u32.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    let block_align = channels as u32 * (bits as u32 / 8);
    out.extend_from_slice(&(sample_rate * block_align).to_le_bytes());
    out.extend_from_slice(&(block_align as u16).to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&0u32.to_le_bytes());
    out
}

/// Incrementally builds a complete synthetic stream, header first.
pub(crate) struct StreamBuilder {
    w: RiceWriter,
}

impl StreamBuilder {
    pub fn new(
        version: u8,
        type_code: u32,
        channels: u32,
        blocksize: u32,
        max_lpc_order: u32,
        mean_window: u32,
    ) -> Self {
        let mut w = RiceWriter::new();
        for byte in MAGIC {
            w.put_n(8, byte as u32);
        }
        w.put_n(8, version as u32);
        for field in [type_code, channels, blocksize, max_lpc_order, mean_window, 0] {
            w.put_ulong(field);
        }
        Self { w }
    }

    pub fn command(&mut self, cmd: u32) -> &mut Self {
        self.w.put_urice(FNSIZE, cmd);
        self
    }

    pub fn verbatim(&mut self, bytes: &[u8]) -> &mut Self {
        self.command(FN_VERBATIM);
        self.w.put_urice(VERBATIM_CKSIZE_SIZE, bytes.len() as u32);
        for &b in bytes {
            self.w.put_urice(VERBATIM_BYTE_SIZE, b as u32);
        }
        self
    }

    /// One residual-coded channel block (any of the DIFF commands).
    pub fn residual_block(&mut self, cmd: u32, energy: u32, residuals: &[i32]) -> &mut Self {
        self.command(cmd);
        self.w.put_urice(ENERGYSIZE, energy);
        for &r in residuals {
            self.w.put_srice(energy, r);
        }
        self
    }

    pub fn qlpc_block(&mut self, energy: u32, coeffs: &[i32], residuals: &[i32]) -> &mut Self {
        self.command(FN_QLPC);
        self.w.put_urice(ENERGYSIZE, energy);
        self.w.put_urice(LPCQSIZE, coeffs.len() as u32);
        for &c in coeffs {
            self.w.put_srice(LPCQUANT, c);
        }
        for &r in residuals {
            self.w.put_srice(energy, r);
        }
        self
    }

    pub fn blocksize(&mut self, blocksize: u32) -> &mut Self {
        self.command(FN_BLOCKSIZE);
        self.w.put_ulong(blocksize);
        self
    }

    pub fn bitshift(&mut self, shift: u32) -> &mut Self {
        self.command(FN_BITSHIFT);
        self.w.put_urice(BITSHIFTSIZE, shift);
        self
    }

    pub fn quit(&mut self) -> &mut Self {
        self.command(FN_QUIT)
    }

    /// Raw Rice-coded field, for assembling malformed streams.
    pub fn raw_urice(&mut self, value: u32, k: u32) -> &mut Self {
        self.w.put_urice(k, value);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.w.finish()
    }
}
