use super::error::ConfigError;
use super::lexer::{Line, LineReader};
use super::limits::{self, bandwidth, decoder, radio, timing};
use crate::state::{SharedState, CHANNEL_IMAGE_NUM};
use crate::types::{GainSelection, Notification};
use crossbeam::channel::Sender;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Image output mode codes as they appear in the profile
const OUT_COMBO: i64 = 0;
const OUT_SPLIT: i64 = 1;
const OUT_BOTH: i64 = 2;

/// Save-as file type codes
const SAVEAS_JPEG: i64 = 0;
const SAVEAS_PGM: i64 = 1;
const SAVEAS_BOTH: i64 = 2;

/// Load the profile at `path` into the shared control state.
///
/// The read is a single linear pass over a fixed positional grammar; any
/// lexer or hard validation failure aborts the load and leaves the state
/// partially populated, so the caller must not arm a session on error.
pub fn load_profile(
    path: &Path,
    state: &SharedState,
    notify: &Sender<Notification>,
) -> Result<(), ConfigError> {
    let file = File::open(path).map_err(|e| ConfigError::Open {
        path: path.display().to_string(),
        source: e,
    })?;
    load_from(BufReader::new(file), state, notify)
}

/// Worker behind [`load_profile`], generic over the byte stream.
pub fn load_from<R: BufRead>(
    reader: R,
    state: &SharedState,
    notify: &Sender<Notification>,
) -> Result<(), ConfigError> {
    let mut lines = LineReader::new(reader);
    let mut st = state.write();

    // SDR receiver configuration
    let line = lines.next_line("SoapySDR device driver")?;
    st.radio.device_driver = line.text.clone();
    st.flags.auto_detect_sdr = line.text == limits::AUTO_DRIVER;

    let line = lines.next_line("SDR device index")?;
    let idx = parse_int(&line, "SDR device index")?;
    if idx < 0 || idx > radio::MAX_DEVICE_INDEX as i64 {
        return Err(ConfigError::InvalidDeviceIndex {
            value: idx,
            line_no: line.line_no,
        });
    }
    st.radio.device_index = idx as u32;

    // Bound-checked only after the full pass
    let line = lines.next_line("roofing filter bandwidth")?;
    st.radio.sdr_filter_bw = parse_u32(&line, "roofing filter bandwidth")?;

    let line = lines.next_line("manual gain setting")?;
    let gain = parse_float(&line, "manual gain setting")?;
    if gain > radio::MAX_TUNER_GAIN {
        // The clamped value is recorded even though the load aborts
        st.radio.tuner_gain = radio::MAX_TUNER_GAIN;
        log::warn!("invalid manual gain setting {gain}, assuming a value of 100%");
        return Err(ConfigError::InvalidTunerGain {
            value: gain,
            line_no: line.line_no,
        });
    }
    st.radio.tuner_gain = gain;

    let line = lines.next_line("frequency correction factor")?;
    let corr = parse_int(&line, "frequency correction factor")?;
    if corr.abs() > radio::MAX_FREQ_CORRECTION as i64 {
        return Err(ConfigError::InvalidFreqCorrection {
            value: corr as i32,
            line_no: line.line_no,
        });
    }
    st.radio.freq_correction = corr as i32;

    let line = lines.next_line("satellite frequency kHz")?;
    st.radio.sdr_center_freq =
        parse_u32(&line, "satellite frequency kHz")?.saturating_mul(1000);

    // Session timing
    let line = lines.next_line("image decoding duration")?;
    st.session.default_timer = parse_u32(&line, "image decoding duration")?;
    if st.session.decode_timer == 0 {
        st.session.decode_timer = st.session.default_timer;
    }
    if st.session.decode_timer > timing::MAX_OPERATION_TIME {
        log::warn!(
            "decoding duration {} sec seems excessive",
            st.session.decode_timer
        );
    }

    let line = lines.next_line("image scale factor")?;
    st.decoder.image_scale = parse_u32(&line, "image scale factor")?;

    // LRPT demodulator parameters
    let line = lines.next_line("RRC filter order")?;
    st.demod.rrc_order = parse_u32(&line, "RRC filter order")?;

    let line = lines.next_line("RRC filter alpha factor")?;
    st.demod.rrc_alpha = parse_float(&line, "RRC filter alpha factor")?;

    let line = lines.next_line("Costas PLL loop bandwidth")?;
    st.demod.costas_bandwidth = parse_float(&line, "Costas PLL loop bandwidth")?;

    let line = lines.next_line("Costas PLL locked threshold")?;
    st.demod.pll_locked = parse_float(&line, "Costas PLL locked threshold")?;
    st.demod.pll_unlocked = st.demod.pll_locked * limits::PLL_UNLOCK_FACTOR;

    let line = lines.next_line("transmitter modulation mode")?;
    st.demod.psk_mode = parse_u8(&line, "transmitter modulation mode")?;

    let line = lines.next_line("transmitter QPSK symbol rate")?;
    st.demod.symbol_rate = parse_u32(&line, "transmitter QPSK symbol rate")?;

    let line = lines.next_line("demodulator interpolation factor")?;
    st.demod.interp_factor = parse_u32(&line, "demodulator interpolation factor")?;

    // LRPT decoder output configuration
    let line = lines.next_line("LRPT decoder output mode")?;
    match parse_int(&line, "LRPT decoder output mode")? {
        OUT_COMBO => st.flags.image_out_combo = true,
        OUT_SPLIT => st.flags.image_out_split = true,
        OUT_BOTH => {
            st.flags.image_out_combo = true;
            st.flags.image_out_split = true;
        }
        other => {
            st.flags.image_out_combo = true;
            st.flags.image_out_split = true;
            log::warn!("image output mode {other} invalid, assuming both (split and combo)");
        }
    }

    let line = lines.next_line("save-as image file type")?;
    match parse_int(&line, "save-as image file type")? {
        SAVEAS_JPEG => st.flags.image_save_jpeg = true,
        SAVEAS_PGM => st.flags.image_save_pgm = true,
        SAVEAS_BOTH => {
            st.flags.image_save_jpeg = true;
            st.flags.image_save_pgm = true;
        }
        other => {
            // Only the PGM flag is set here, despite the message;
            // existing profiles depend on this exact default
            st.flags.image_save_pgm = true;
            log::warn!("image save-as type {other} invalid, assuming both (JPEG and PGM)");
        }
    }

    let line = lines.next_line("JPEG quality factor")?;
    st.decoder.jpeg_quality = parse_float(&line, "JPEG quality factor")?;

    let line = lines.next_line("image raw flag")?;
    st.flags.image_raw = parse_int(&line, "image raw flag")? != 0;

    let line = lines.next_line("image normalize flag")?;
    st.flags.image_normalize = parse_int(&line, "image normalize flag")? != 0;

    let line = lines.next_line("image CLAHE flag")?;
    st.flags.image_clahe = parse_int(&line, "image CLAHE flag")? != 0;

    let line = lines.next_line("image rectify function")?;
    let mut rectify = parse_u8(&line, "image rectify function")?;
    if rectify > decoder::MAX_RECTIFY_FUNCTION {
        log::warn!(
            "invalid rectify function {rectify}, assuming {}",
            decoder::DEFAULT_RECTIFY_FUNCTION
        );
        rectify = decoder::DEFAULT_RECTIFY_FUNCTION;
    }
    st.decoder.rectify_function = rectify;
    st.flags.image_rectify = rectify != 0;

    let line = lines.next_line("image colorize flag")?;
    st.flags.image_colorize = parse_int(&line, "image colorize flag")? != 0;

    let line = lines.next_line("red channel APID")?;
    st.decoder.apid[0] = parse_u8(&line, "red channel APID")?;
    let line = lines.next_line("green channel APID")?;
    st.decoder.apid[1] = parse_u8(&line, "green channel APID")?;
    let line = lines.next_line("blue channel APID")?;
    st.decoder.apid[2] = parse_u8(&line, "blue channel APID")?;

    // Channel numbers for the combined color image: three short fields
    // on one line; each must be a valid channel index
    let line = lines.next_line("combined color image channels")?;
    let mut fields = line.text.split_whitespace();
    for idx in 0..CHANNEL_IMAGE_NUM {
        let text = fields
            .next()
            .ok_or_else(|| bad_number(&line, "combined color image channels", &line.text))?;
        let chan = text
            .parse::<u8>()
            .map_err(|_| bad_number(&line, "combined color image channels", text))?;
        if chan as usize >= CHANNEL_IMAGE_NUM {
            return Err(ConfigError::InvalidColorChannel {
                value: chan,
                line_no: line.line_no,
            });
        }
        st.decoder.color_channel[idx] = chan;
    }

    // Invert-palette APIDs: three numeric tokens separated by single
    // delimiter characters
    let line = lines.next_line("invert palette APIDs")?;
    st.decoder.invert_palette = parse_delimited(&line, "invert palette APIDs")?;

    for (idx, field) in [
        "red channel normalization range",
        "green channel normalization range",
        "blue channel normalization range",
    ]
    .into_iter()
    .enumerate()
    {
        let line = lines.next_line(field)?;
        st.decoder.norm_range[idx] = parse_norm_range(&line, field)?;
    }

    let line = lines.next_line("colorize blue channel minimum")?;
    st.decoder.colorize_blue_min = parse_u8(&line, "colorize blue channel minimum")?;

    let line = lines.next_line("colorize blue channel maximum")?;
    st.decoder.colorize_blue_max = parse_u8(&line, "colorize blue channel maximum")?;

    let line = lines.next_line("cloud area threshold")?;
    st.decoder.clouds_threshold = parse_u8(&line, "cloud area threshold")?;

    // Deferred bandwidth bound check
    if st.radio.sdr_filter_bw < bandwidth::MIN_BANDWIDTH
        || st.radio.sdr_filter_bw > bandwidth::MAX_BANDWIDTH
    {
        return Err(ConfigError::InvalidBandwidth {
            value: st.radio.sdr_filter_bw,
            min: bandwidth::MIN_BANDWIDTH,
            max: bandwidth::MAX_BANDWIDTH,
        });
    }

    // Gain-derived frontend selection
    let selection = if st.radio.tuner_gain > 0.0 {
        st.flags.tuner_gain_auto = false;
        GainSelection::Manual
    } else {
        st.flags.tuner_gain_auto = true;
        GainSelection::Auto
    };

    let satellite = st.satellite_name.clone();
    drop(st);

    let _ = notify.send(Notification::GainMode(selection));
    let _ = notify.send(Notification::ProfileActivated { satellite });

    Ok(())
}

fn bad_number(line: &Line, field: &'static str, value: &str) -> ConfigError {
    ConfigError::BadNumber {
        field,
        line_no: line.line_no,
        value: value.to_string(),
    }
}

fn parse_int(line: &Line, field: &'static str) -> Result<i64, ConfigError> {
    let text = line.text.trim();
    text.parse::<i64>()
        .map_err(|_| bad_number(line, field, text))
}

fn parse_u32(line: &Line, field: &'static str) -> Result<u32, ConfigError> {
    let text = line.text.trim();
    text.parse::<u32>()
        .map_err(|_| bad_number(line, field, text))
}

fn parse_u8(line: &Line, field: &'static str) -> Result<u8, ConfigError> {
    let text = line.text.trim();
    text.parse::<u8>()
        .map_err(|_| bad_number(line, field, text))
}

fn parse_float(line: &Line, field: &'static str) -> Result<f64, ConfigError> {
    let text = line.text.trim();
    text.parse::<f64>()
        .map_err(|_| bad_number(line, field, text))
}

/// Parse three integers separated by single delimiter characters, e.g.
/// "66-65-64". Scans a digit run, skips exactly one delimiter, repeats.
fn parse_delimited(
    line: &Line,
    field: &'static str,
) -> Result<[u32; CHANNEL_IMAGE_NUM], ConfigError> {
    let bytes = line.text.as_bytes();
    let mut out = [0u32; CHANNEL_IMAGE_NUM];
    let mut pos = 0usize;

    for slot in out.iter_mut() {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if start == pos {
            return Err(bad_number(line, field, &line.text));
        }
        *slot = line.text[start..pos]
            .parse::<u32>()
            .map_err(|_| bad_number(line, field, &line.text[start..pos]))?;
        // Skip the single delimiter character, if any
        if pos < bytes.len() {
            pos += 1;
        }
    }

    Ok(out)
}

/// Parse a "black-white" normalization range. The separator is required;
/// its absence fails the load instead of scanning off the end of the line.
fn parse_norm_range(
    line: &Line,
    field: &'static str,
) -> Result<crate::state::NormRange, ConfigError> {
    let (black, white) = line
        .text
        .split_once('-')
        .ok_or_else(|| ConfigError::MissingSeparator {
            line: line.text.clone(),
            line_no: line.line_no,
        })?;
    let black = black.trim();
    let white = white.trim();
    Ok(crate::state::NormRange {
        black: black.parse::<u8>().map_err(|_| bad_number(line, field, black))?,
        white: white.parse::<u8>().map_err(|_| bad_number(line, field, white))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ControlState;
    use crate::types::Notification;
    use crossbeam::channel::{unbounded, Receiver};
    use std::io::Cursor;

    /// Content lines of a well-formed Meteor-M2 profile, in grammar order
    fn profile_lines() -> Vec<String> {
        [
            "auto",    // device driver
            "0",       // device index
            "120000",  // filter bandwidth
            "7.5",     // tuner gain
            "0",       // frequency correction
            "137100",  // center frequency kHz
            "780",     // decode duration
            "4",       // image scale
            "32",      // rrc order
            "0.6",     // rrc alpha
            "100.0",   // costas bandwidth
            "0.8",     // pll locked threshold
            "1",       // psk mode
            "72000",   // symbol rate
            "4",       // interpolation factor
            "2",       // output mode (both)
            "2",       // save-as (both)
            "85.0",    // jpeg quality
            "0",       // raw flag
            "1",       // normalize flag
            "1",       // clahe flag
            "1",       // rectify function
            "1",       // colorize flag
            "66",      // red apid
            "65",      // green apid
            "64",      // blue apid
            "0 1 2",   // combined image channels
            "66-65-64", // invert palette apids
            "60-190",  // norm range red
            "60-190",  // norm range green
            "60-190",  // norm range blue
            "60",      // colorize blue min
            "190",     // colorize blue max
            "210",     // clouds threshold
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn profile_with(index: usize, value: &str) -> String {
        let mut lines = profile_lines();
        lines[index] = value.to_string();
        lines.join("\n") + "\n"
    }

    fn load(text: &str) -> (Result<(), ConfigError>, SharedState, Receiver<Notification>) {
        let state = ControlState::new_shared();
        let (tx, rx) = unbounded();
        let result = load_from(Cursor::new(text.as_bytes().to_vec()), &state, &tx);
        (result, state, rx)
    }

    #[test]
    fn full_profile_loads() {
        let text = format!("# Meteor-M2 LRPT profile\n{}\n", profile_lines().join("\n"));
        let (result, state, rx) = load(&text);
        result.unwrap();

        let st = state.read();
        assert!(st.flags.auto_detect_sdr);
        assert_eq!(st.radio.device_index, 0);
        assert_eq!(st.radio.sdr_filter_bw, 120_000);
        assert_eq!(st.radio.tuner_gain, 7.5);
        assert_eq!(st.radio.sdr_center_freq, 137_100_000);
        assert_eq!(st.session.default_timer, 780);
        assert_eq!(st.session.decode_timer, 780);
        assert_eq!(st.demod.rrc_order, 32);
        assert_eq!(st.demod.symbol_rate, 72_000);
        assert!((st.demod.pll_unlocked - 0.8 * 1.03).abs() < 1e-9);
        assert!(st.flags.image_out_combo && st.flags.image_out_split);
        assert!(st.flags.image_save_jpeg && st.flags.image_save_pgm);
        assert!(st.flags.image_normalize && st.flags.image_clahe);
        assert!(!st.flags.image_raw);
        assert_eq!(st.decoder.rectify_function, 1);
        assert!(st.flags.image_rectify);
        assert_eq!(st.decoder.apid, [66, 65, 64]);
        assert_eq!(st.decoder.color_channel, [0, 1, 2]);
        assert_eq!(st.decoder.invert_palette, [66, 65, 64]);
        assert_eq!(st.decoder.norm_range[0].black, 60);
        assert_eq!(st.decoder.norm_range[0].white, 190);
        assert_eq!(st.decoder.clouds_threshold, 210);
        assert!(!st.flags.tuner_gain_auto);
        drop(st);

        assert_eq!(rx.recv().unwrap(), Notification::GainMode(GainSelection::Manual));
        assert!(matches!(
            rx.recv().unwrap(),
            Notification::ProfileActivated { .. }
        ));
    }

    #[test]
    fn loading_twice_is_idempotent() {
        let text = profile_lines().join("\n") + "\n";
        let (first, state, _rx) = load(&text);
        first.unwrap();
        let (tx, _rx2) = unbounded();
        load_from(Cursor::new(text.as_bytes().to_vec()), &state, &tx).unwrap();

        let st = state.read();
        assert_eq!(st.radio.sdr_filter_bw, 120_000);
        assert_eq!(st.session.decode_timer, 780);
        assert_eq!(st.decoder.color_channel, [0, 1, 2]);
    }

    #[test]
    fn truncation_after_any_field_is_premature_eof() {
        let lines = profile_lines();
        for n in 0..lines.len() {
            let text = lines[..n].join("\n") + "\n";
            let (result, _, _) = load(&text);
            assert!(
                matches!(result, Err(ConfigError::PrematureEof { .. })),
                "prefix of {n} fields should fail with premature EOF"
            );
        }
    }

    #[test]
    fn device_index_bounds() {
        let (result, _, _) = load(&profile_with(1, "8"));
        result.unwrap();

        let (result, _, _) = load(&profile_with(1, "9"));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidDeviceIndex { value: 9, .. })
        ));
    }

    #[test]
    fn excessive_gain_clamps_then_fails() {
        let (result, state, _) = load(&profile_with(3, "150.0"));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTunerGain { .. })
        ));
        // The clamp is recorded even though the load aborts
        assert_eq!(state.read().radio.tuner_gain, 100.0);
    }

    #[test]
    fn zero_gain_selects_auto() {
        let (result, state, rx) = load(&profile_with(3, "0"));
        result.unwrap();
        assert!(state.read().flags.tuner_gain_auto);
        assert_eq!(rx.recv().unwrap(), Notification::GainMode(GainSelection::Auto));
    }

    #[test]
    fn freq_correction_bounds() {
        let (result, _, _) = load(&profile_with(4, "100"));
        result.unwrap();

        let (result, _, _) = load(&profile_with(4, "-150"));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidFreqCorrection { value: -150, .. })
        ));
    }

    #[test]
    fn bandwidth_checked_after_full_pass() {
        let (result, state, _) = load(&profile_with(2, "50000"));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidBandwidth { value: 50_000, .. })
        ));
        // The pass completed; later fields were populated before the check
        assert_eq!(state.read().decoder.clouds_threshold, 210);
    }

    #[test]
    fn unknown_output_mode_defaults_to_both() {
        let (result, state, _) = load(&profile_with(15, "7"));
        result.unwrap();
        let st = state.read();
        assert!(st.flags.image_out_combo && st.flags.image_out_split);
    }

    #[test]
    fn unknown_save_as_defaults_to_pgm_only() {
        let (result, state, _) = load(&profile_with(16, "9"));
        result.unwrap();
        let st = state.read();
        assert!(st.flags.image_save_pgm);
        assert!(!st.flags.image_save_jpeg);
    }

    #[test]
    fn rectify_selector_clamps_to_one() {
        let (result, state, _) = load(&profile_with(21, "5"));
        result.unwrap();
        let st = state.read();
        assert_eq!(st.decoder.rectify_function, 1);
        assert!(st.flags.image_rectify);
    }

    #[test]
    fn rectify_zero_disables_flag() {
        let (result, state, _) = load(&profile_with(21, "0"));
        result.unwrap();
        let st = state.read();
        assert_eq!(st.decoder.rectify_function, 0);
        assert!(!st.flags.image_rectify);
    }

    #[test]
    fn channel_reorder_out_of_range_fails() {
        let (result, _, _) = load(&profile_with(26, "00 01 05"));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidColorChannel { value: 5, .. })
        ));
    }

    #[test]
    fn channel_reorder_accepts_valid_indices() {
        let (result, state, _) = load(&profile_with(26, "02 01 00"));
        result.unwrap();
        assert_eq!(state.read().decoder.color_channel, [2, 1, 0]);
    }

    #[test]
    fn norm_range_parses_black_and_white() {
        let (result, state, _) = load(&profile_with(28, "10-200"));
        result.unwrap();
        let range = state.read().decoder.norm_range[0];
        assert_eq!(range.black, 10);
        assert_eq!(range.white, 200);
    }

    #[test]
    fn norm_range_without_separator_fails() {
        let (result, _, _) = load(&profile_with(29, "10 200"));
        assert!(matches!(
            result,
            Err(ConfigError::MissingSeparator { .. })
        ));
    }

    #[test]
    fn invert_palette_scans_three_tokens() {
        let (result, state, _) = load(&profile_with(27, "70 71 72"));
        result.unwrap();
        assert_eq!(state.read().decoder.invert_palette, [70, 71, 72]);
    }

    #[test]
    fn armed_duration_survives_reload() {
        let text = profile_lines().join("\n") + "\n";
        let state = ControlState::new_shared();
        state.write().session.decode_timer = 300;
        let (tx, _rx) = unbounded();
        load_from(Cursor::new(text.as_bytes().to_vec()), &state, &tx).unwrap();

        let st = state.read();
        assert_eq!(st.session.default_timer, 780);
        assert_eq!(st.session.decode_timer, 300);
    }

    #[test]
    fn garbage_number_is_rejected() {
        let (result, _, _) = load(&profile_with(2, "fast"));
        assert!(matches!(result, Err(ConfigError::BadNumber { .. })));
    }
}
