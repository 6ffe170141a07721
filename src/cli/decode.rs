use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use shndsd::shorten::decode::ShortenDecoder;
use shndsd::shorten::header::SampleType;

use super::command::{Cli, DecodeArgs};
use crate::input::InputReader;
use crate::wav::WavWriter;

pub(crate) fn create_path_with_extension(base_path: &Path, expected_ext: &str) -> PathBuf {
    if let Some(existing_ext) = base_path.extension() {
        if existing_ext == expected_ext {
            base_path.to_path_buf()
        } else {
            let mut path = base_path.to_path_buf();
            path.set_extension(expected_ext);
            path
        }
    } else {
        let mut path = base_path.to_path_buf();
        path.set_extension(expected_ext);
        path
    }
}

pub fn cmd_decode(args: &DecodeArgs, _cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Decoding Shorten stream: {}", args.input.display());

    let is_pipe = args.input.to_string_lossy() == "-";

    let output_path = match &args.output {
        Some(path) => path.clone(),
        None if is_pipe => PathBuf::from("out.wav"),
        None => create_path_with_extension(&args.input, "wav"),
    };

    let input = InputReader::new(&args.input)?;
    let mut decoder = ShortenDecoder::open(input)?;

    let format = decoder.format();
    let channels = decoder.header().channels;
    let sample_type = decoder.header().sample_type;
    log::info!(
        "{} Hz, {} bit, {channels} channel(s)",
        format.sample_rate,
        format.bits_per_sample
    );

    let pb = multi.map(|multi| {
        let pb = multi.add(ProgressBar::new_spinner());
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} {pos} blocks\n{msg} | elapsed: {elapsed_precise}")
        {
            pb.set_style(style);
        }
        pb.set_message("decoding");
        pb
    });

    let file = File::create(&output_path)?;
    let mut writer = WavWriter::new(file, format.sample_rate, channels, sample_type.bits())?;

    let mut interleaved = Vec::new();
    let mut block_count = 0u64;
    let mut total_samples = 0u64;

    while let Some(block) = decoder.decode_block()? {
        let frames = block.channels.iter().map(Vec::len).max().unwrap_or(0);
        interleaved.clear();
        for i in 0..frames {
            for channel in &block.channels {
                let sample = channel.get(i).copied().unwrap_or(0);
                interleaved.push(to_container(sample_type, sample));
            }
        }
        writer.write_samples(&interleaved)?;

        total_samples += frames as u64;
        block_count += 1;
        if let Some(ref pb) = pb {
            pb.set_position(block_count);
        }
    }

    writer.finish()?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let duration = total_samples as f64 / format.sample_rate as f64;
    log::info!(
        "Wrote {} ({block_count} blocks, {total_samples} samples/channel, {duration:.3}s)",
        output_path.display()
    );

    Ok(())
}

/// Map a decoded sample to the value stored in the WAVE container.
///
/// 8-bit WAVE data is unsigned, so signed 8-bit streams are rebased.
fn to_container(sample_type: SampleType, sample: i32) -> i32 {
    match sample_type {
        SampleType::Signed8 => sample + 128,
        _ => sample,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_replaces_extension() {
        assert_eq!(
            create_path_with_extension(Path::new("track.shn"), "wav"),
            PathBuf::from("track.wav")
        );
        assert_eq!(
            create_path_with_extension(Path::new("track.wav"), "wav"),
            PathBuf::from("track.wav")
        );
        assert_eq!(
            create_path_with_extension(Path::new("track"), "wav"),
            PathBuf::from("track.wav")
        );
    }

    #[test]
    fn signed_8_bit_is_rebased_for_wave() {
        assert_eq!(to_container(SampleType::Signed8, -128), 0);
        assert_eq!(to_container(SampleType::Signed8, 127), 255);
        assert_eq!(to_container(SampleType::Unsigned8, 200), 200);
        assert_eq!(to_container(SampleType::Signed16Le, -5), -5);
    }
}
