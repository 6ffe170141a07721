use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = env!("CARGO_PKG_VERSION"),
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Tools for decoding Shorten (.shn) streams and DSD audio",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode the specified Shorten stream into a WAVE file.
    Decode(DecodeArgs),

    /// Decimate raw DSD input into a PCM WAVE file.
    Dsd(DsdArgs),

    /// Print stream information
    Info(InfoArgs),
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Input Shorten bitstream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path for the decoded WAVE file.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DsdArgs {
    /// Input raw DSD stream, channel-interleaved octets (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path for the decimated WAVE file.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Number of interleaved channels.
    #[arg(long, value_name = "COUNT", default_value_t = 2)]
    pub channels: u32,

    /// DSD bit rate in Hz (DSD64 by default).
    #[arg(long, value_name = "HZ", default_value_t = 2_822_400)]
    pub rate: u32,

    /// Output PCM bit depth.
    #[arg(long, value_enum, default_value_t = PcmBits::B24)]
    pub bits: PcmBits,

    /// Input octets carry the oldest bit in the least significant position.
    #[arg(long)]
    pub lsb_first: bool,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input Shorten bitstream.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum PcmBits {
    /// 16-bit little-endian.
    #[value(name = "16")]
    B16,
    /// 24-bit little-endian.
    #[value(name = "24")]
    B24,
}

impl PcmBits {
    pub fn bits(self) -> u32 {
        match self {
            PcmBits::B16 => 16,
            PcmBits::B24 => 24,
        }
    }
}
