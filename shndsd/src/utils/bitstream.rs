//! Bitstream I/O for Shorten parsing.
//!
//! Shorten packs everything MSB-first. On top of plain bit reads the format
//! layers Golomb-Rice codes: an unsigned value is a run of 0 bits terminated
//! by a 1 (the unary high part) followed by `k` raw low bits. Signed values
//! fold the sign into the lowest bit of a `k + 1` bit unsigned code, and
//! "ulong" values prefix the code with a 2-bit-resolution width so the
//! precision is self-describing.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, UnsignedInteger};

/// Suffix width of the width prefix in a ulong code.
pub const ULONGSIZE: u32 = 2;

/// MSB-first Golomb-Rice reader over a byte source.
///
/// Truncated input surfaces as an `UnexpectedEof` error from the read that
/// discovered it; bits are never silently invented past the end of the
/// source.
#[derive(Debug)]
pub struct ShnBitReader<R: io::Read> {
    bs: BitReader<R, BigEndian>,
    position: u64,
}

impl<R: io::Read> ShnBitReader<R> {
    pub fn new(read: R) -> Self {
        Self {
            bs: BitReader::new(read),
            position: 0,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        let bit = self.bs.read_bit()?;
        self.position += 1;
        Ok(bit)
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        match self.bs.read_unsigned_var(n) {
            Ok(val) => {
                self.position += n as u64;
                Ok(val)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("get_n({n}): out of bounds bits at {}", self.position),
            )),
            Err(e) => Err(e),
        }
    }

    /// Reads an unsigned Rice code with suffix width `k`.
    #[inline(always)]
    pub fn get_urice(&mut self, k: u32) -> io::Result<u32> {
        let mut high = 0u64;
        while !self.get()? {
            high += 1;
        }

        let low = if k > 0 { self.get_n::<u32>(k)? } else { 0 };

        let value = (high << k) | low as u64;
        if value > u32::MAX as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "get_urice({k}): unary prefix exceeds 32-bit range at {}",
                    self.position
                ),
            ));
        }

        Ok(value as u32)
    }

    /// Reads a signed Rice code with suffix width `k`.
    ///
    /// The underlying unsigned code carries `k + 1` suffix bits; the lowest
    /// bit selects the sign, odd values mapping to the one's complement of
    /// the remaining magnitude (0, -1, 1, -2, 2, ...).
    #[inline(always)]
    pub fn get_srice(&mut self, k: u32) -> io::Result<i32> {
        let uvar = self.get_urice(k + 1)?;
        let magnitude = (uvar >> 1) as i32;

        Ok(if uvar & 1 != 0 { !magnitude } else { magnitude })
    }

    /// Reads a self-describing unsigned value: a Rice-coded suffix width
    /// first, then the value at that width.
    #[inline(always)]
    pub fn get_ulong(&mut self) -> io::Result<u32> {
        let nbits = self.get_urice(ULONGSIZE)?;
        if nbits > 31 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("get_ulong: width {nbits} exceeds 31 bits at {}", self.position),
            ));
        }

        self.get_urice(nbits)
    }

    /// Bits consumed so far.
    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.position
    }
}

#[cfg(test)]
pub(crate) mod testkit {
    //! Reference Rice encoder used to synthesize Shorten bitstreams in tests.

    use bitstream_io::{BigEndian, BitWrite, BitWriter};

    pub struct RiceWriter {
        bs: BitWriter<Vec<u8>, BigEndian>,
    }

    impl RiceWriter {
        pub fn new() -> Self {
            Self {
                bs: BitWriter::new(Vec::new()),
            }
        }

        pub fn put_n(&mut self, n: u32, value: u32) {
            self.bs.write_unsigned_var(n, value).unwrap();
        }

        pub fn put_urice(&mut self, k: u32, value: u32) {
            let high = value >> k;
            for _ in 0..high {
                self.bs.write_bit(false).unwrap();
            }
            self.bs.write_bit(true).unwrap();
            if k > 0 {
                self.bs.write_unsigned_var(k, value & ((1 << k) - 1)).unwrap();
            }
        }

        pub fn put_srice(&mut self, k: u32, value: i32) {
            let folded = if value >= 0 {
                (value as u32) << 1
            } else {
                (((!value) as u32) << 1) | 1
            };
            self.put_urice(k + 1, folded);
        }

        pub fn put_ulong(&mut self, value: u32) {
            let nbits = 32 - value.leading_zeros();
            self.put_urice(super::ULONGSIZE, nbits);
            self.put_urice(nbits, value);
        }

        pub fn finish(mut self) -> Vec<u8> {
            self.bs.byte_align().unwrap();
            self.bs.into_writer()
        }
    }
}
