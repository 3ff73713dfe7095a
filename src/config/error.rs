use thiserror::Error;

/// Errors that abort a profile load.
///
/// Every variant is fatal to the load in progress but recoverable at the
/// process level: the caller reports it and leaves no profile active.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading {field}: premature EOF (End Of File)")]
    PrematureEof { field: &'static str },

    #[error("error reading {field}: line longer than {max} characters: {line:?}")]
    LineTooLong {
        field: &'static str,
        line: String,
        max: usize,
    },

    #[error("error reading {field} (line {line_no}): {value:?} is not a valid number")]
    BadNumber {
        field: &'static str,
        line_no: usize,
        value: String,
    },

    #[error("invalid SoapySDR device index {value} (line {line_no}), must be 0-8")]
    InvalidDeviceIndex { value: i64, line_no: usize },

    #[error("invalid manual gain setting {value} (line {line_no}), assuming a value of 100%")]
    InvalidTunerGain { value: f64, line_no: usize },

    #[error("invalid frequency correction factor {value} (line {line_no})")]
    InvalidFreqCorrection { value: i32, line_no: usize },

    #[error("invalid roofing filter bandwidth {value} Hz, must be {min}-{max} Hz")]
    InvalidBandwidth { value: u32, min: u32, max: u32 },

    #[error("channel number {value} for combined color image out of range (line {line_no})")]
    InvalidColorChannel { value: u8, line_no: usize },

    #[error("normalization range {line:?} has no '-' separator (line {line_no})")]
    MissingSeparator { line: String, line_no: usize },

    #[error("failed to open profile {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("stream error reading {field}: {source}")]
    Io {
        field: &'static str,
        source: std::io::Error,
    },
}

/// Profile discovery failures, reported to the user without aborting the
/// process; with no profile found the load step is skipped.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no configuration file(s) found in {dir}")]
    NoProfiles { dir: String },

    #[error("cannot read profile directory {dir}: {source}")]
    ReadDir {
        dir: String,
        source: std::io::Error,
    },
}
