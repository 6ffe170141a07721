#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    #[error("Invalid magic, expected \"ajkg\", read {0:02X?}")]
    InvalidMagic([u8; 4]),

    #[error("Unsupported Shorten version {0}, expected 1-3")]
    UnsupportedVersion(u8),

    #[error("Unsupported internal sample type {0}")]
    UnsupportedSampleType(u32),

    #[error("Channel count must be between 1 and 8. Read {0}")]
    InvalidChannelCount(u32),

    #[error("Block size must be between 1 and 65535. Read {0}")]
    InvalidBlockSize(u32),

    #[error("Max LPC order must be <= 1024. Read {0}")]
    MaxLpcOrderTooHigh(u32),

    #[error("Mean window length must be <= 32768. Read {0}")]
    MeanWindowTooLong(u32),

    #[error("Stream must begin with a verbatim container header, read command {0}")]
    MissingVerbatim(u32),

    #[error("Container bit depth {container} does not match the {expected}-bit sample type")]
    BitDepthMismatch { container: u32, expected: u32 },
}

#[derive(thiserror::Error, Debug)]
pub enum ContainerError {
    #[error("Verbatim chunk too short for a container header: {0} bytes")]
    ChunkTooShort(usize),

    #[error("Unrecognized container tag {0:02X?}")]
    UnknownContainer([u8; 4]),

    #[error("RIFF chunk does not carry a WAVE form")]
    NotWave,

    #[error("No fmt sub-chunk in the embedded WAVE header")]
    MissingFmt,

    #[error("fmt sub-chunk truncated: {0} bytes")]
    MalformedFmt(usize),

    #[error("FORM chunk does not carry an AIFF or AIFC form")]
    NotAiff,

    #[error("No COMM sub-chunk in the embedded AIFF header")]
    MissingComm,

    #[error("COMM sub-chunk truncated: {0} bytes")]
    MalformedComm(usize),

    #[error("Extended-precision sample rate is not a representable positive integer")]
    InvalidSampleRate,
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("Unknown command token {0}")]
    UnknownCommand(u32),

    #[error("Block size {read} exceeds the declared maximum {max}")]
    BlockSizeTooLarge { read: u32, max: u32 },

    #[error("Block size must be nonzero")]
    ZeroBlockSize,

    #[error("Bit shift must be <= 32. Read {0}")]
    BitShiftTooLarge(u32),

    #[error("LPC order {read} exceeds the declared maximum {max}")]
    LpcOrderTooHigh { read: u32, max: u32 },

    #[error("Verbatim chunk length {0} exceeds the 256-byte limit")]
    VerbatimTooLong(u32),
}
