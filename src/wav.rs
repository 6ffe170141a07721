use std::io::{self, BufWriter, Seek, SeekFrom, Write};

/// RIFF/WAVE file writer for integer PCM audio.
///
/// The RIFF and `data` chunk sizes are written as zero up front and
/// patched by [`WavWriter::finish`], so the target must be seekable.
pub struct WavWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    sample_rate: u32,
    channels: u32,
    bits_per_sample: u32,
    riff_size_position: u64,
    data_size_position: u64,
    data_written: u64,
}

impl<W: Write + Seek> WavWriter<W> {
    /// Create a writer and emit the header for the given format.
    pub fn new(writer: W, sample_rate: u32, channels: u32, bits_per_sample: u32) -> io::Result<Self> {
        let mut this = Self {
            writer: BufWriter::new(writer),
            sample_rate,
            channels,
            bits_per_sample,
            riff_size_position: 0,
            data_size_position: 0,
            data_written: 0,
        };
        this.write_header()?;
        Ok(this)
    }

    fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(b"RIFF")?;
        self.riff_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?; // File size (to be updated later)
        self.writer.write_all(b"WAVE")?;

        self.writer.write_all(b"fmt ")?;
        self.writer.write_all(&16u32.to_le_bytes())?;
        self.writer.write_all(&1u16.to_le_bytes())?; // PCM format
        self.writer
            .write_all(&(self.channels as u16).to_le_bytes())?;
        self.writer.write_all(&self.sample_rate.to_le_bytes())?;

        let byte_rate = self.sample_rate * self.channels * (self.bits_per_sample / 8);
        self.writer.write_all(&byte_rate.to_le_bytes())?;

        let block_align = self.channels * (self.bits_per_sample / 8);
        self.writer.write_all(&(block_align as u16).to_le_bytes())?;
        self.writer
            .write_all(&(self.bits_per_sample as u16).to_le_bytes())?;

        self.writer.write_all(b"data")?;
        self.data_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?; // Data size (to be updated later)

        Ok(())
    }

    /// Write interleaved samples at the configured bit depth.
    ///
    /// Samples must already be in container range: 0..=255 for 8-bit
    /// (stored unsigned), signed 16- or 24-bit otherwise.
    pub fn write_samples(&mut self, samples: &[i32]) -> io::Result<()> {
        match self.bits_per_sample {
            8 => {
                for &sample in samples {
                    self.writer.write_all(&[sample as u8])?;
                    self.data_written += 1;
                }
            }
            16 => {
                for &sample in samples {
                    self.writer.write_all(&(sample as i16).to_le_bytes())?;
                    self.data_written += 2;
                }
            }
            24 => {
                for &sample in samples {
                    let bytes = sample.to_le_bytes();
                    self.writer.write_all(&bytes[0..3])?;
                    self.data_written += 3;
                }
            }
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unsupported bit depth: {other}"),
                ));
            }
        }
        Ok(())
    }

    /// Finish writing and patch the chunk sizes in the header.
    pub fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()?;

        let current_pos = self.writer.stream_position()?;

        self.writer.seek(SeekFrom::Start(self.data_size_position))?;
        self.writer
            .write_all(&(self.data_written as u32).to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(self.riff_size_position))?;
        self.writer
            .write_all(&((current_pos - 8) as u32).to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(current_pos))?;
        self.writer.flush()?;

        Ok(())
    }

    pub fn data_written(&self) -> u64 {
        self.data_written
    }

    /// Get the underlying writer
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}
