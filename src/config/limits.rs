/// Profile grammar and validation limits

/// Maximum length of a logical profile line, excluding the terminator
pub const MAX_LINE_LEN: usize = 80;

/// Comment marker for profile files
pub const COMMENT_CHAR: u8 = b'#';

/// Profile file name suffix
pub const PROFILE_SUFFIX: &str = ".cfg";

/// Subdirectory of the home directory holding profile files
pub const PROFILE_SUBDIR: &str = "glrpt";

/// Roofing filter bandwidth bounds
pub mod bandwidth {
    /// Minimum usable filter bandwidth (100 kHz)
    pub const MIN_BANDWIDTH: u32 = 100_000;

    /// Maximum usable filter bandwidth (200 kHz)
    pub const MAX_BANDWIDTH: u32 = 200_000;
}

/// Hard validation bounds for radio fields
pub mod radio {
    /// Highest selectable SoapySDR device index
    pub const MAX_DEVICE_INDEX: u32 = 8;

    /// Tuner gain ceiling, percent
    pub const MAX_TUNER_GAIN: f64 = 100.0;

    /// Frequency correction magnitude limit
    pub const MAX_FREQ_CORRECTION: i32 = 100;
}

/// Session timing limits
pub mod timing {
    /// A decode duration beyond this draws a warning; a Meteor-M pass
    /// over the horizon lasts around 15 minutes
    pub const MAX_OPERATION_TIME: u32 = 900;
}

/// Decoder parameter limits
pub mod decoder {
    /// Highest valid rectify-function selector
    pub const MAX_RECTIFY_FUNCTION: u8 = 2;

    /// Selector substituted when the profile value is out of range
    pub const DEFAULT_RECTIFY_FUNCTION: u8 = 1;
}

/// Device driver name that enables SDR auto-detection
pub const AUTO_DRIVER: &str = "auto";

/// Multiplier deriving the PLL unlock threshold from the lock threshold
pub const PLL_UNLOCK_FACTOR: f64 = 1.03;
