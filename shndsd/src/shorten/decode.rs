//! Shorten stream decoder.
//!
//! [`ShortenDecoder::open`] parses the stream header and the embedded
//! container header, then [`ShortenDecoder::decode_block`] yields one
//! frame of planar PCM per call until the terminating `FN_QUIT`.
//!
//! Each channel carries two pieces of state between blocks: the last
//! `max(3, maxnlpc)` reconstructed samples, which seed the polynomial and
//! LPC predictors of the next block, and a short window of block means
//! used to derive the DC offset (`coffset`) that version 2 streams fold
//! out of the residuals. Samples stay unshifted inside the history
//! buffer; the renormalization bit shift is applied only on emission.

use std::io::Read;

use anyhow::{Result, bail};
use log::warn;

use crate::utils::bitstream::ShnBitReader;
use crate::utils::errors::{DecodeError, HeaderError};

use super::container::{self, ContainerFormat};
use super::header::StreamHeader;
use super::{
    BITSHIFTSIZE, ENERGYSIZE, FN_BITSHIFT, FN_BLOCKSIZE, FN_DIFF0, FN_DIFF1, FN_DIFF2, FN_DIFF3,
    FN_QLPC, FN_QUIT, FN_VERBATIM, FN_ZERO, FNSIZE, LPCQSIZE, LPCQUANT, VERBATIM_BYTE_SIZE,
    VERBATIM_CKSIZE_SIZE, VERBATIM_CHUNK_MAX,
};

/// One decoded frame of planar PCM, one `Vec` per channel.
///
/// Channel lengths normally agree; they can differ for the single frame
/// during which an `FN_BLOCKSIZE` command lands between channels.
#[derive(Debug, Clone)]
pub struct DecodedBlock {
    pub channels: Vec<Vec<i32>>,
}

#[derive(Debug)]
struct ChannelState {
    /// History window followed by the current block, unshifted.
    samples: Vec<i32>,
    /// Recent block means, oldest first.
    offsets: Vec<i32>,
}

#[derive(Debug)]
pub struct ShortenDecoder<R: Read> {
    reader: ShnBitReader<R>,
    header: StreamHeader,
    container: ContainerFormat,
    channels: Vec<ChannelState>,
    blocksize: u32,
    bitshift: u32,
    nwrap: usize,
    /// Command read by `open` past the leading verbatim run.
    pending: Option<u32>,
    coeffs: Vec<i32>,
}

impl<R: Read> ShortenDecoder<R> {
    /// Parse the stream and container headers and set up per-channel state.
    pub fn open(reader: R) -> Result<Self> {
        let mut reader = ShnBitReader::new(reader);
        let header = StreamHeader::read(&mut reader)?;

        // The original file header arrives as one or more verbatim chunks
        // before any sound data.
        let first = reader.get_urice(FNSIZE)?;
        if first != FN_VERBATIM {
            bail!(HeaderError::MissingVerbatim(first));
        }
        let mut chunk = Vec::new();
        read_verbatim(&mut reader, &mut chunk)?;
        let mut pending = reader.get_urice(FNSIZE)?;
        while pending == FN_VERBATIM {
            read_verbatim(&mut reader, &mut chunk)?;
            pending = reader.get_urice(FNSIZE)?;
        }

        let container = container::sniff(&chunk)?;
        if container.bits_per_sample != header.sample_type.bits() {
            bail!(HeaderError::BitDepthMismatch {
                container: container.bits_per_sample,
                expected: header.sample_type.bits(),
            });
        }
        if container.channels != header.channels {
            warn!(
                "container reports {} channels, stream header says {}; using the stream header",
                container.channels, header.channels
            );
        }

        let nwrap = header.history_wrap() as usize;
        let midpoint = header.sample_type.midpoint();
        let channels = (0..header.channels)
            .map(|_| ChannelState {
                samples: vec![0; nwrap + header.blocksize as usize],
                offsets: vec![midpoint; header.mean_window.max(1) as usize],
            })
            .collect();

        Ok(Self {
            blocksize: header.blocksize,
            bitshift: 0,
            nwrap,
            header,
            container,
            channels,
            reader,
            pending: Some(pending),
            coeffs: Vec::new(),
        })
    }

    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    pub fn format(&self) -> ContainerFormat {
        self.container
    }

    /// Decode the next frame, or `None` once `FN_QUIT` is reached.
    ///
    /// `FN_QUIT` arriving with some channels of the frame already decoded
    /// discards the partial frame. Running off the end of the stream
    /// without an `FN_QUIT` is an error.
    pub fn decode_block(&mut self) -> Result<Option<DecodedBlock>> {
        let nchan = self.channels.len();
        let mut out: Vec<Vec<i32>> = Vec::with_capacity(nchan);

        loop {
            let cmd = match self.pending.take() {
                Some(cmd) => cmd,
                None => self.reader.get_urice(FNSIZE)?,
            };
            match cmd {
                FN_QUIT => return Ok(None),
                FN_DIFF0 | FN_DIFF1 | FN_DIFF2 | FN_DIFF3 | FN_ZERO | FN_QLPC => {
                    let chan = out.len();
                    out.push(self.decode_channel(chan, cmd)?);
                    if out.len() == nchan {
                        return Ok(Some(DecodedBlock { channels: out }));
                    }
                }
                FN_BLOCKSIZE => {
                    let blocksize = self.reader.get_ulong()?;
                    if blocksize == 0 {
                        bail!(DecodeError::ZeroBlockSize);
                    }
                    if blocksize > self.header.blocksize {
                        bail!(DecodeError::BlockSizeTooLarge {
                            read: blocksize,
                            max: self.header.blocksize,
                        });
                    }
                    self.blocksize = blocksize;
                }
                FN_BITSHIFT => {
                    let shift = self.reader.get_urice(BITSHIFTSIZE)?;
                    if shift > 32 {
                        bail!(DecodeError::BitShiftTooLarge(shift));
                    }
                    self.bitshift = shift;
                }
                FN_VERBATIM => {
                    // Trailing container chunks; the payload is irrelevant
                    // once decoding has started.
                    let mut discard = Vec::new();
                    read_verbatim(&mut self.reader, &mut discard)?;
                }
                other => bail!(DecodeError::UnknownCommand(other)),
            }
        }
    }

    fn decode_channel(&mut self, chan: usize, cmd: u32) -> Result<Vec<i32>> {
        let bs = self.blocksize as usize;
        let nwrap = self.nwrap;
        let version = self.header.version;
        let coffset = self.coffset(chan);

        match cmd {
            FN_ZERO => {
                let state = &mut self.channels[chan];
                state.samples[nwrap..nwrap + bs].fill(0);
            }
            FN_DIFF0 => {
                let energy = self.reader.get_urice(ENERGYSIZE)?;
                let state = &mut self.channels[chan];
                for i in 0..bs {
                    let residual = self.reader.get_srice(energy)?;
                    state.samples[nwrap + i] = residual.wrapping_add(coffset);
                }
            }
            FN_DIFF1 | FN_DIFF2 | FN_DIFF3 => {
                let energy = self.reader.get_urice(ENERGYSIZE)?;
                let state = &mut self.channels[chan];
                for i in 0..bs {
                    let residual = self.reader.get_srice(energy)?;
                    let at = nwrap + i;
                    let buf = &state.samples;
                    let prediction = match cmd {
                        FN_DIFF1 => buf[at - 1],
                        FN_DIFF2 => buf[at - 1].wrapping_mul(2).wrapping_sub(buf[at - 2]),
                        _ => buf[at - 1]
                            .wrapping_sub(buf[at - 2])
                            .wrapping_mul(3)
                            .wrapping_add(buf[at - 3]),
                    };
                    state.samples[at] = residual.wrapping_add(prediction);
                }
            }
            _ => {
                let energy = self.reader.get_urice(ENERGYSIZE)?;
                let order = self.reader.get_urice(LPCQSIZE)?;
                if order > self.header.max_lpc_order {
                    bail!(DecodeError::LpcOrderTooHigh {
                        read: order,
                        max: self.header.max_lpc_order,
                    });
                }
                let order = order as usize;
                self.coeffs.clear();
                for _ in 0..order {
                    let coeff = self.reader.get_srice(LPCQUANT)?;
                    self.coeffs.push(coeff);
                }
                let lpcqoffset: i64 = if version >= 2 { 1 << LPCQUANT } else { 0 };

                let state = &mut self.channels[chan];
                if coffset != 0 {
                    for sample in &mut state.samples[nwrap - order..nwrap] {
                        *sample = sample.wrapping_sub(coffset);
                    }
                }
                for i in 0..bs {
                    let residual = self.reader.get_srice(energy)?;
                    let mut sum = lpcqoffset;
                    for (j, &coeff) in self.coeffs.iter().enumerate() {
                        sum += coeff as i64 * state.samples[nwrap + i - j - 1] as i64;
                    }
                    state.samples[nwrap + i] = residual.wrapping_add((sum >> LPCQUANT) as i32);
                }
                if coffset != 0 {
                    for sample in &mut state.samples[nwrap..nwrap + bs] {
                        *sample = sample.wrapping_add(coffset);
                    }
                }
            }
        }

        Ok(self.finish_channel_block(chan, bs))
    }

    /// DC offset derived from the running mean window.
    fn coffset(&self, chan: usize) -> i32 {
        let nmean = self.header.mean_window;
        let offsets = &self.channels[chan].offsets;
        if nmean == 0 {
            return offsets[0];
        }
        let bias: i64 = if self.header.version < 2 {
            0
        } else {
            (nmean / 2) as i64
        };
        let sum: i64 = bias + offsets.iter().map(|&o| o as i64).sum::<i64>();
        let mean = (sum / nmean as i64) as i32;
        if self.header.version >= 2 {
            rounded_shift_down(mean, self.bitshift)
        } else {
            mean
        }
    }

    /// Update the mean window, slide the history, and emit the shifted and
    /// clipped block.
    fn finish_channel_block(&mut self, chan: usize, bs: usize) -> Vec<i32> {
        let nwrap = self.nwrap;
        let version = self.header.version;
        let nmean = self.header.mean_window;
        let bitshift = self.bitshift;
        let sample_type = self.header.sample_type;
        let state = &mut self.channels[chan];

        if nmean > 0 {
            let bias: i64 = if version < 2 { 0 } else { (bs / 2) as i64 };
            let sum: i64 = bias
                + state.samples[nwrap..nwrap + bs]
                    .iter()
                    .map(|&s| s as i64)
                    .sum::<i64>();
            let mut mean = sum / bs as i64;
            if version >= 2 {
                mean <<= bitshift;
            }
            state.offsets.rotate_left(1);
            let last = state.offsets.len() - 1;
            state.offsets[last] = mean as i32;
        }

        for j in 0..nwrap {
            state.samples[j] = state.samples[bs + j];
        }

        state.samples[nwrap..nwrap + bs]
            .iter()
            .map(|&s| sample_type.clip((s as i64) << bitshift))
            .collect()
    }
}

fn read_verbatim<R: Read>(reader: &mut ShnBitReader<R>, out: &mut Vec<u8>) -> Result<()> {
    let len = reader.get_urice(VERBATIM_CKSIZE_SIZE)?;
    if len > VERBATIM_CHUNK_MAX {
        bail!(DecodeError::VerbatimTooLong(len));
    }
    out.reserve(len as usize);
    for _ in 0..len {
        let byte = reader.get_urice(VERBATIM_BYTE_SIZE)?;
        out.push(byte as u8);
    }
    Ok(())
}

/// Shift down with round-to-nearest, matching the reference coder.
///
/// Widened to 64 bits internally so the full shift range of 0 to 32 is
/// valid.
fn rounded_shift_down(value: i32, shift: u32) -> i32 {
    if shift == 0 {
        value
    } else {
        ((value as i64 + (1i64 << (shift - 1))) >> shift) as i32
    }
}
