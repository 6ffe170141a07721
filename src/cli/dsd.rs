use std::fs::File;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use shndsd::dsd::DsdDecoder;

use super::command::{Cli, DsdArgs, PcmBits};
use super::decode::create_path_with_extension;
use crate::input::InputReader;
use crate::wav::WavWriter;

pub fn cmd_dsd(args: &DsdArgs, _cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    if args.channels == 0 {
        return Err(anyhow!("channel count must be at least 1"));
    }
    if !args.rate.is_multiple_of(8) {
        return Err(anyhow!("DSD rate must be a multiple of 8, got {}", args.rate));
    }

    let pcm_rate = args.rate / 8;
    log::info!(
        "Decimating DSD stream: {} ({} ch, {} Hz -> {pcm_rate} Hz PCM)",
        args.input.display(),
        args.channels,
        args.rate
    );

    let is_pipe = args.input.to_string_lossy() == "-";
    let output_path = match &args.output {
        Some(path) => path.clone(),
        None if is_pipe => PathBuf::from("out.wav"),
        None => create_path_with_extension(&args.input, "wav"),
    };

    let pb = multi.map(|multi| {
        let pb = multi.add(ProgressBar::new_spinner());
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} {msg} | elapsed: {elapsed_precise}")
        {
            pb.set_style(style);
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    });

    let channels = args.channels as usize;
    let mut decoder = DsdDecoder::new(channels);

    let file = File::create(&output_path)?;
    let mut writer = WavWriter::new(file, pcm_rate, args.channels, args.bits.bits())?;

    let mut input = InputReader::new(&args.input)?;
    let mut carry: Vec<u8> = Vec::new();
    let mut pcm = Vec::new();
    let mut total_bytes = 0u64;

    input.process_chunks(64 * 1024, |chunk| {
        carry.extend_from_slice(chunk);
        let whole = carry.len() - carry.len() % channels;
        if whole == 0 {
            return Ok(true);
        }

        pcm.resize(whole, 0.0f32);
        decoder.process_interleaved(&carry[..whole], args.lsb_first, &mut pcm);
        let samples: Vec<i32> = pcm.iter().map(|&s| quantize(s, args.bits)).collect();
        writer.write_samples(&samples)?;
        carry.drain(..whole);

        total_bytes += whole as u64;
        if let Some(ref pb) = pb {
            pb.set_message(format!("{:.1} MB", total_bytes as f64 / 1_000_000.0));
        }
        Ok(true)
    })?;

    if !carry.is_empty() {
        log::warn!("dropping {} trailing byte(s) of a partial frame", carry.len());
    }

    writer.finish()?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let frames = total_bytes / channels as u64;
    let duration = frames as f64 / pcm_rate as f64;
    log::info!(
        "Wrote {} ({frames} samples/channel, {duration:.3}s)",
        output_path.display()
    );

    Ok(())
}

/// Convert a normalized float sample to the integer PCM range, clipping
/// at full scale.
fn quantize(sample: f32, bits: PcmBits) -> i32 {
    match bits {
        PcmBits::B16 => {
            let scaled = (sample * 32768.0).round() as i64;
            scaled.clamp(-32768, 32767) as i32
        }
        PcmBits::B24 => {
            let scaled = (sample * 8_388_608.0).round() as i64;
            scaled.clamp(-8_388_608, 8_388_607) as i32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_clips_at_full_scale() {
        assert_eq!(quantize(0.0, PcmBits::B16), 0);
        assert_eq!(quantize(0.5, PcmBits::B16), 16384);
        assert_eq!(quantize(1.5, PcmBits::B16), 32767);
        assert_eq!(quantize(-1.5, PcmBits::B16), -32768);
        assert_eq!(quantize(0.5, PcmBits::B24), 4_194_304);
        assert_eq!(quantize(2.0, PcmBits::B24), 8_388_607);
        assert_eq!(quantize(-2.0, PcmBits::B24), -8_388_608);
    }
}
