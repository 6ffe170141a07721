use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;

use shndsd::shorten::decode::ShortenDecoder;
use shndsd::shorten::header::SampleType;

use super::command::{Cli, InfoArgs};
use crate::input::InputReader;

#[derive(Debug, Serialize)]
struct StreamInfo {
    version: u8,
    sample_type: &'static str,
    channels: u32,
    sample_rate: u32,
    bits_per_sample: u32,
    blocksize: u32,
    max_lpc_order: u32,
    mean_window: u32,
    blocks: u64,
    samples_per_channel: u64,
    duration_secs: f64,
}

fn sample_type_name(sample_type: SampleType) -> &'static str {
    match sample_type {
        SampleType::Signed8 => "s8",
        SampleType::Unsigned8 => "u8",
        SampleType::Signed16Be => "s16be",
        SampleType::Unsigned16Be => "u16be",
        SampleType::Signed16Le => "s16le",
        SampleType::Unsigned16Le => "u16le",
    }
}

pub fn cmd_info(args: &InfoArgs, _cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing Shorten stream: {}", args.input.display());

    let input = InputReader::new(&args.input)?;
    let mut decoder = ShortenDecoder::open(input)?;

    let pb = multi.map(|multi| {
        let pb = multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Scanning blocks...");
        pb
    });

    let mut blocks = 0u64;
    let mut samples = 0u64;
    while let Some(block) = decoder.decode_block()? {
        samples += block.channels.iter().map(Vec::len).max().unwrap_or(0) as u64;
        blocks += 1;
        if blocks.is_multiple_of(100) {
            if let Some(ref pb) = pb {
                pb.set_message(format!("Scanning blocks...       {blocks}"));
            }
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let header = decoder.header();
    let format = decoder.format();
    let info = StreamInfo {
        version: header.version,
        sample_type: sample_type_name(header.sample_type),
        channels: header.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bits_per_sample,
        blocksize: header.blocksize,
        max_lpc_order: header.max_lpc_order,
        mean_window: header.mean_window,
        blocks,
        samples_per_channel: samples,
        duration_secs: samples as f64 / format.sample_rate as f64,
    };

    print!("{}", serde_yaml_ng::to_string(&info)?);

    Ok(())
}
