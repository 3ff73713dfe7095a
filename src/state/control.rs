use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared control state accessible from all threads
pub type SharedState = Arc<RwLock<ControlState>>;

/// Number of LRPT image channels (red, green, blue)
pub const CHANNEL_IMAGE_NUM: usize = 3;

/// Runtime control state.
///
/// Populated in bulk by the config loader; the session controller owns
/// the `receiving` flag and the armed duration. Everything else reads.
#[derive(Debug)]
pub struct ControlState {
    /// Active satellite profile name (file stem of the .cfg file)
    pub satellite_name: String,
    /// Directory holding the per-satellite profile files
    pub profile_dir: PathBuf,

    pub radio: RadioState,
    pub session: SessionTiming,
    pub demod: DemodParams,
    pub decoder: DecoderParams,
    pub flags: Flags,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            satellite_name: String::new(),
            profile_dir: PathBuf::new(),
            radio: RadioState::default(),
            session: SessionTiming::default(),
            demod: DemodParams::default(),
            decoder: DecoderParams::default(),
            flags: Flags::default(),
        }
    }
}

impl ControlState {
    /// Create a new shared state wrapped in Arc<RwLock>
    pub fn new_shared() -> SharedState {
        Arc::new(RwLock::new(Self::default()))
    }
}

/// SDR front-end parameters
#[derive(Debug)]
pub struct RadioState {
    /// SoapySDR device driver name ("auto" selects auto-detection)
    pub device_driver: String,
    /// Device index (0-8)
    pub device_index: u32,
    /// Roofing filter bandwidth in Hz
    pub sdr_filter_bw: u32,
    /// Tuner gain as a percentage (0-100, 0 = automatic)
    pub tuner_gain: f64,
    /// Frequency correction factor in ppm-like percent units
    pub freq_correction: i32,
    /// Center frequency in Hz
    pub sdr_center_freq: u32,
}

impl Default for RadioState {
    fn default() -> Self {
        Self {
            device_driver: String::new(),
            device_index: 0,
            sdr_filter_bw: 0,
            tuner_gain: 0.0,
            freq_correction: 0,
            sdr_center_freq: 0,
        }
    }
}

/// Receive session timing
#[derive(Debug, Default)]
pub struct SessionTiming {
    /// Default session duration from the profile, in seconds
    pub default_timer: u32,
    /// Currently armed duration in seconds (0 = unset, falls back to default)
    pub decode_timer: u32,
    /// When the running session started
    pub receiving_since: Option<DateTime<Utc>>,
}

/// QPSK demodulator parameters, consumed by the external backend
#[derive(Debug, Default)]
pub struct DemodParams {
    /// RRC filter order
    pub rrc_order: u32,
    /// RRC filter roll-off factor
    pub rrc_alpha: f64,
    /// Costas PLL loop bandwidth
    pub costas_bandwidth: f64,
    /// Costas PLL locked threshold
    pub pll_locked: f64,
    /// Derived unlock threshold (locked x 1.03 hysteresis band)
    pub pll_unlocked: f64,
    /// Transmitter modulation mode code
    pub psk_mode: u8,
    /// QPSK symbol rate
    pub symbol_rate: u32,
    /// Demodulator interpolation factor
    pub interp_factor: u32,
}

/// Per-channel normalization range (black and white points)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormRange {
    pub black: u8,
    pub white: u8,
}

/// LRPT decoder and image-output parameters
#[derive(Debug, Default)]
pub struct DecoderParams {
    /// Image scale divisor for the display pixbuf
    pub image_scale: u32,
    /// JPEG compression quality factor
    pub jpeg_quality: f64,
    /// Rectification function selector (0 = off, 1-2 = algorithm)
    pub rectify_function: u8,
    /// APID assigned to each image channel
    pub apid: [u8; CHANNEL_IMAGE_NUM],
    /// Channel numbers used for the combined color image (each < 3)
    pub color_channel: [u8; CHANNEL_IMAGE_NUM],
    /// APIDs whose palette is inverted
    pub invert_palette: [u32; CHANNEL_IMAGE_NUM],
    /// Normalization ranges for red, green, blue
    pub norm_range: [NormRange; CHANNEL_IMAGE_NUM],
    /// Blue channel minimum pixel value in the pseudo-color image
    pub colorize_blue_min: u8,
    /// Blue channel maximum pixel value to enhance
    pub colorize_blue_max: u8,
    /// Pixel value above which a blue-channel area counts as cloud
    pub clouds_threshold: u8,
}

/// Named boolean flags.
///
/// The loader sets everything except `receiving`, which belongs to the
/// session lifecycle and the abnormal-termination path.
#[derive(Debug, Default)]
pub struct Flags {
    /// Auto-detect the SDR device instead of using a named driver
    pub auto_detect_sdr: bool,
    /// A receive session is running
    pub receiving: bool,
    /// Tuner gain is under automatic control
    pub tuner_gain_auto: bool,
    /// Produce the combined color image
    pub image_out_combo: bool,
    /// Produce per-channel split images
    pub image_out_split: bool,
    /// Save images as JPEG
    pub image_save_jpeg: bool,
    /// Save images as raw grayscale PGM
    pub image_save_pgm: bool,
    /// Keep unprocessed raw images
    pub image_raw: bool,
    /// Normalize image levels
    pub image_normalize: bool,
    /// Apply histogram equalization
    pub image_clahe: bool,
    /// Rectify image geometry
    pub image_rectify: bool,
    /// Produce the pseudo-color image
    pub image_colorize: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_state_starts_idle() {
        let state = ControlState::new_shared();
        let guard = state.read();
        assert!(!guard.flags.receiving);
        assert_eq!(guard.session.decode_timer, 0);
        assert!(guard.satellite_name.is_empty());
    }
}
