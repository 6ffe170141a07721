//! Stream header parsing.
//!
//! Every Shorten stream starts with the four magic bytes `ajkg`, a raw
//! 8-bit version, and then a run of `ulong` coded fields describing the
//! sample format and the coder parameters. Versions 1 through 3 are
//! supported; version 0 used a different fixed layout and is rejected.

use std::io::Read;

use anyhow::{Result, bail};
use log::debug;

use crate::utils::bitstream::ShnBitReader;
use crate::utils::errors::HeaderError;

use super::XBYTESIZE;

pub const MAGIC: [u8; 4] = *b"ajkg";

pub const MAX_CHANNELS: u32 = 8;
pub const MAX_BLOCKSIZE: u32 = 65535;
pub const MAX_LPC_ORDER: u32 = 1024;
pub const MAX_MEAN_WINDOW: u32 = 32768;

/// Sample format of the decoded stream.
///
/// Only the linear PCM types are supported; the historical mu-law and
/// a-law codes are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    Signed8,
    Unsigned8,
    Signed16Be,
    Unsigned16Be,
    Signed16Le,
    Unsigned16Le,
}

impl SampleType {
    pub fn from_code(code: u32) -> Result<Self> {
        Ok(match code {
            1 => Self::Signed8,
            2 => Self::Unsigned8,
            3 => Self::Signed16Be,
            4 => Self::Unsigned16Be,
            5 => Self::Signed16Le,
            6 => Self::Unsigned16Le,
            _ => bail!(HeaderError::UnsupportedSampleType(code)),
        })
    }

    /// Bits per sample of the output PCM.
    pub fn bits(self) -> u32 {
        match self {
            Self::Signed8 | Self::Unsigned8 => 8,
            _ => 16,
        }
    }

    /// Initial value of the running-mean window for this type.
    pub fn midpoint(self) -> i32 {
        match self {
            Self::Unsigned8 => 0x80,
            Self::Unsigned16Be | Self::Unsigned16Le => 0x8000,
            _ => 0,
        }
    }

    /// Clamp a reconstructed sample into the representable range.
    ///
    /// Unsigned 16-bit streams clip to the signed range as well, matching
    /// the reference coder.
    pub fn clip(self, sample: i64) -> i32 {
        match self {
            Self::Unsigned8 => sample.clamp(0, 255) as i32,
            _ => sample.clamp(-32768, 32767) as i32,
        }
    }
}

/// Parsed Shorten stream header.
#[derive(Debug, Clone)]
pub struct StreamHeader {
    pub version: u8,
    pub sample_type: SampleType,
    pub channels: u32,
    pub blocksize: u32,
    pub max_lpc_order: u32,
    pub mean_window: u32,
    pub skip_bytes: u32,
}

impl StreamHeader {
    pub fn read<R: Read>(reader: &mut ShnBitReader<R>) -> Result<Self> {
        let mut magic = [0u8; 4];
        for byte in &mut magic {
            *byte = reader.get_n(8)?;
        }
        if magic != MAGIC {
            bail!(HeaderError::InvalidMagic(magic));
        }

        let version: u8 = reader.get_n(8)?;
        if !(1..=3).contains(&version) {
            bail!(HeaderError::UnsupportedVersion(version));
        }

        let sample_type = SampleType::from_code(reader.get_ulong()?)?;

        let channels = reader.get_ulong()?;
        if channels == 0 || channels > MAX_CHANNELS {
            bail!(HeaderError::InvalidChannelCount(channels));
        }

        let blocksize = reader.get_ulong()?;
        if blocksize == 0 || blocksize > MAX_BLOCKSIZE {
            bail!(HeaderError::InvalidBlockSize(blocksize));
        }

        let max_lpc_order = reader.get_ulong()?;
        if max_lpc_order > MAX_LPC_ORDER {
            bail!(HeaderError::MaxLpcOrderTooHigh(max_lpc_order));
        }

        let mean_window = reader.get_ulong()?;
        if mean_window > MAX_MEAN_WINDOW {
            bail!(HeaderError::MeanWindowTooLong(mean_window));
        }

        // Skip bytes are uvar coded like everything else past the version
        // byte, not raw octets.
        let skip_bytes = reader.get_ulong()?;
        for _ in 0..skip_bytes {
            reader.get_urice(XBYTESIZE)?;
        }

        debug!(
            "shorten header: v{version} {sample_type:?} channels={channels} \
             blocksize={blocksize} maxnlpc={max_lpc_order} nmean={mean_window}"
        );

        Ok(Self {
            version,
            sample_type,
            channels,
            blocksize,
            max_lpc_order,
            mean_window,
            skip_bytes,
        })
    }

    /// Number of history samples carried between blocks.
    pub fn history_wrap(&self) -> u32 {
        self.max_lpc_order.max(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream::testkit::RiceWriter;

    fn header_bytes(version: u8, fields: &[u32]) -> Vec<u8> {
        let mut w = RiceWriter::new();
        for byte in MAGIC {
            w.put_n(8, byte as u32);
        }
        w.put_n(8, version as u32);
        for &f in fields {
            w.put_ulong(f);
        }
        w.finish()
    }

    #[test]
    fn parses_typical_header() {
        let bytes = header_bytes(2, &[5, 2, 256, 0, 4, 0]);
        let mut reader = ShnBitReader::new(bytes.as_slice());
        let header = StreamHeader::read(&mut reader).unwrap();

        assert_eq!(header.version, 2);
        assert_eq!(header.sample_type, SampleType::Signed16Le);
        assert_eq!(header.channels, 2);
        assert_eq!(header.blocksize, 256);
        assert_eq!(header.max_lpc_order, 0);
        assert_eq!(header.mean_window, 4);
        assert_eq!(header.skip_bytes, 0);
        assert_eq!(header.history_wrap(), 3);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = header_bytes(2, &[5, 2, 256, 0, 4, 0]);
        bytes[0] = b'x';
        let mut reader = ShnBitReader::new(bytes.as_slice());
        let err = StreamHeader::read(&mut reader).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HeaderError>(),
            Some(HeaderError::InvalidMagic(_))
        ));
    }

    #[test]
    fn rejects_unsupported_versions() {
        for version in [0u8, 4, 255] {
            let bytes = header_bytes(version, &[5, 2, 256, 0, 4, 0]);
            let mut reader = ShnBitReader::new(bytes.as_slice());
            let err = StreamHeader::read(&mut reader).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<HeaderError>(),
                Some(HeaderError::UnsupportedVersion(v)) if *v == version
            ));
        }
        for version in [1u8, 2, 3] {
            let bytes = header_bytes(version, &[5, 2, 256, 0, 4, 0]);
            let mut reader = ShnBitReader::new(bytes.as_slice());
            assert!(StreamHeader::read(&mut reader).is_ok());
        }
    }

    #[test]
    fn rejects_mulaw_and_alaw_types() {
        for code in [0u32, 7, 8, 9, 10] {
            let bytes = header_bytes(2, &[code, 2, 256, 0, 4, 0]);
            let mut reader = ShnBitReader::new(bytes.as_slice());
            let err = StreamHeader::read(&mut reader).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<HeaderError>(),
                Some(HeaderError::UnsupportedSampleType(c)) if *c == code
            ));
        }
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let cases: [(&[u32], HeaderError); 4] = [
            (&[5, 0, 256, 0, 4, 0], HeaderError::InvalidChannelCount(0)),
            (&[5, 2, 0, 0, 4, 0], HeaderError::InvalidBlockSize(0)),
            (&[5, 2, 256, 2048, 4, 0], HeaderError::MaxLpcOrderTooHigh(2048)),
            (&[5, 2, 256, 0, 65536, 0], HeaderError::MeanWindowTooLong(65536)),
        ];
        for (fields, expected) in cases {
            let bytes = header_bytes(2, fields);
            let mut reader = ShnBitReader::new(bytes.as_slice());
            let err = StreamHeader::read(&mut reader).unwrap_err();
            assert_eq!(
                std::mem::discriminant(err.downcast_ref::<HeaderError>().unwrap()),
                std::mem::discriminant(&expected)
            );
        }
    }

    #[test]
    fn consumes_skip_bytes() {
        let mut w = RiceWriter::new();
        for byte in MAGIC {
            w.put_n(8, byte as u32);
        }
        w.put_n(8, 2);
        for f in [5u32, 1, 256, 0, 0, 3] {
            w.put_ulong(f);
        }
        for pad in [0xDEu32, 0xAD, 0xBE] {
            w.put_urice(XBYTESIZE, pad);
        }
        // Marker after the padding so lockstep can be checked.
        w.put_n(8, 0xA5);
        let bytes = w.finish();

        let mut reader = ShnBitReader::new(bytes.as_slice());
        let header = StreamHeader::read(&mut reader).unwrap();
        assert_eq!(header.skip_bytes, 3);
        let marker: u8 = reader.get_n(8).unwrap();
        assert_eq!(marker, 0xA5);
    }
}
