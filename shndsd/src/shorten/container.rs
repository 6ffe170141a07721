//! Embedded container header sniffing.
//!
//! The first verbatim chunk of a Shorten stream carries the original file
//! header byte for byte, so the sample rate and bit depth survive the
//! compression round trip. Both RIFF/WAVE (little endian `fmt ` chunk)
//! and FORM/AIFF or AIFC (big endian `COMM` chunk with an 80-bit extended
//! float sample rate) are recognized.

use anyhow::{Result, bail};

use crate::utils::errors::ContainerError;

/// Format information recovered from the embedded container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u32,
    pub channels: u32,
}

/// Parse the embedded container header out of the first verbatim chunk.
pub fn sniff(chunk: &[u8]) -> Result<ContainerFormat> {
    if chunk.len() < 12 {
        bail!(ContainerError::ChunkTooShort(chunk.len()));
    }
    match &chunk[..4] {
        b"RIFF" => sniff_wave(chunk),
        b"FORM" => sniff_aiff(chunk),
        other => {
            let mut tag = [0u8; 4];
            tag.copy_from_slice(other);
            bail!(ContainerError::UnknownContainer(tag));
        }
    }
}

fn u16_le(bytes: &[u8], at: usize) -> u32 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]]) as u32
}

fn u32_le(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn u32_be(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn sniff_wave(chunk: &[u8]) -> Result<ContainerFormat> {
    if &chunk[8..12] != b"WAVE" {
        bail!(ContainerError::NotWave);
    }

    let mut at = 12;
    while at + 8 <= chunk.len() {
        let size = u32_le(chunk, at + 4) as usize;
        if &chunk[at..at + 4] == b"fmt " {
            let body = &chunk[at + 8..];
            if size < 16 || body.len() < 16 {
                bail!(ContainerError::MalformedFmt(body.len().min(size)));
            }
            let channels = u16_le(body, 2);
            let sample_rate = u32_le(body, 4);
            let bits_per_sample = u16_le(body, 14);
            if sample_rate == 0 {
                bail!(ContainerError::InvalidSampleRate);
            }
            return Ok(ContainerFormat {
                sample_rate,
                bits_per_sample,
                channels,
            });
        }
        at += 8 + size + (size & 1);
    }

    bail!(ContainerError::MissingFmt)
}

fn sniff_aiff(chunk: &[u8]) -> Result<ContainerFormat> {
    if &chunk[8..12] != b"AIFF" && &chunk[8..12] != b"AIFC" {
        bail!(ContainerError::NotAiff);
    }

    let mut at = 12;
    while at + 8 <= chunk.len() {
        let size = u32_be(chunk, at + 4) as usize;
        if &chunk[at..at + 4] == b"COMM" {
            let body = &chunk[at + 8..];
            if size < 18 || body.len() < 18 {
                bail!(ContainerError::MalformedComm(body.len().min(size)));
            }
            let channels = u16::from_be_bytes([body[0], body[1]]) as u32;
            let bits_per_sample = u16::from_be_bytes([body[6], body[7]]) as u32;
            let sample_rate = extended_to_u32(&body[8..18])?;
            return Ok(ContainerFormat {
                sample_rate,
                bits_per_sample,
                channels,
            });
        }
        at += 8 + size + (size & 1);
    }

    bail!(ContainerError::MissingComm)
}

/// Decode an 80-bit IEEE 754 extended float into an integer sample rate.
fn extended_to_u32(bytes: &[u8]) -> Result<u32> {
    let exponent = (((bytes[0] & 0x7F) as i32) << 8) | bytes[1] as i32;
    let mantissa = u64::from_be_bytes([
        bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7], bytes[8], bytes[9],
    ]);
    if bytes[0] & 0x80 != 0 || mantissa == 0 {
        bail!(ContainerError::InvalidSampleRate);
    }

    let shift = exponent - 16383 - 63;
    let value = if shift >= 0 {
        if shift >= 32 {
            bail!(ContainerError::InvalidSampleRate);
        }
        mantissa.checked_shl(shift as u32)
    } else {
        mantissa.checked_shr((-shift) as u32)
    };

    match value {
        Some(rate) if rate > 0 && rate <= u32::MAX as u64 => Ok(rate as u32),
        _ => bail!(ContainerError::InvalidSampleRate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shorten::testkit::wave_header;

    fn aiff_header(channels: u16, frames: u32, bits: u16, extended: [u8; 10]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"FORM");
        out.extend_from_slice(&30u32.to_be_bytes());
        out.extend_from_slice(b"AIFF");
        out.extend_from_slice(b"COMM");
        out.extend_from_slice(&18u32.to_be_bytes());
        out.extend_from_slice(&channels.to_be_bytes());
        out.extend_from_slice(&frames.to_be_bytes());
        out.extend_from_slice(&bits.to_be_bytes());
        out.extend_from_slice(&extended);
        out
    }

    #[test]
    fn reads_wave_fmt_fields() {
        let fmt = sniff(&wave_header(2, 44100, 16)).unwrap();
        assert_eq!(fmt.sample_rate, 44100);
        assert_eq!(fmt.bits_per_sample, 16);
        assert_eq!(fmt.channels, 2);
    }

    #[test]
    fn skips_leading_chunks_before_fmt() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&5u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 0]); // odd size gets a pad byte
        bytes.extend_from_slice(&wave_header(1, 48000, 8)[12..]);
        let fmt = sniff(&bytes).unwrap();
        assert_eq!(fmt.sample_rate, 48000);
        assert_eq!(fmt.bits_per_sample, 8);
        assert_eq!(fmt.channels, 1);
    }

    #[test]
    fn reads_aiff_comm_fields() {
        // 44100 in 80-bit extended: exponent 16398, mantissa 0xAC44 << 48.
        let extended = [0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0];
        let fmt = sniff(&aiff_header(2, 1000, 16, extended)).unwrap();
        assert_eq!(fmt.sample_rate, 44100);
        assert_eq!(fmt.bits_per_sample, 16);
        assert_eq!(fmt.channels, 2);
    }

    #[test]
    fn decodes_extended_rates() {
        for (rate, bytes) in [
            (44100u32, [0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]),
            (48000, [0x40, 0x0E, 0xBB, 0x80, 0, 0, 0, 0, 0, 0]),
            (8000, [0x40, 0x0B, 0xFA, 0x00, 0, 0, 0, 0, 0, 0]),
            (96000, [0x40, 0x0F, 0xBB, 0x80, 0, 0, 0, 0, 0, 0]),
        ] {
            assert_eq!(extended_to_u32(&bytes).unwrap(), rate, "rate {rate}");
        }
    }

    #[test]
    fn rejects_garbage_headers() {
        assert!(matches!(
            sniff(b"ajkg").unwrap_err().downcast_ref::<ContainerError>(),
            Some(ContainerError::ChunkTooShort(4))
        ));
        assert!(matches!(
            sniff(b"OggS\0\0\0\0\0\0\0\0")
                .unwrap_err()
                .downcast_ref::<ContainerError>(),
            Some(ContainerError::UnknownContainer(_))
        ));

        let mut bytes = wave_header(2, 44100, 16);
        bytes[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(
            sniff(&bytes).unwrap_err().downcast_ref::<ContainerError>(),
            Some(ContainerError::NotWave)
        ));

        let zero_rate = wave_header(2, 0, 16);
        assert!(matches!(
            sniff(&zero_rate)
                .unwrap_err()
                .downcast_ref::<ContainerError>(),
            Some(ContainerError::InvalidSampleRate)
        ));
    }
}
