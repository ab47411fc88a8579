//! Command packet encoders.
//!
//! Every builder is pure and infallible. Numeric inputs wider than the
//! firmware field are clamped to it instead of rejected.

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::protocol::constants::*;

/// Clamp an integer into one byte.
pub fn clamp_byte(value: u32) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

/// Seconds to 10 ms ticks, rounded and clamped to `0..=255`.
///
/// Negative and NaN inputs encode as 0.
pub fn duration_to_byte(seconds: f32) -> u8 {
    let ticks = (seconds / DURATION_STEP_SECS).round();
    if ticks.is_nan() || ticks <= 0.0 {
        0
    } else if ticks >= 255.0 {
        u8::MAX
    } else {
        ticks as u8
    }
}

/// 10 ms ticks back to seconds.
pub fn duration_from_byte(ticks: u8) -> f32 {
    f32::from(ticks) * DURATION_STEP_SECS
}

/// 24-bit LED color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// From `0xRRGGBB`. Values above `0xFFFFFF` clamp to white.
    pub fn from_hex(value: u32) -> Self {
        let mut buf = [0u8; 3];
        BigEndian::write_u24(&mut buf, value.min(0xFF_FFFF));
        Self::new(buf[0], buf[1], buf[2])
    }

    pub fn to_hex(self) -> u32 {
        BigEndian::read_u24(&self.to_bytes())
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

impl From<u32> for Rgb {
    fn from(value: u32) -> Self {
        Rgb::from_hex(value)
    }
}

impl From<Rgb> for u32 {
    fn from(rgb: Rgb) -> Self {
        rgb.to_hex()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BlinkMode {
    /// LED1 and LED2 alternate.
    #[default]
    OneByOne = 0,
    /// LEDs blink together, restricted by the selector.
    Parallel = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LedSelector {
    #[default]
    Both = 0,
    Led1 = 1,
    Led2 = 2,
}

/// LED blink pattern shared by the init and toggle commands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkPattern {
    /// Number of blinks, `BLINKS_INFINITE` to run until closed.
    pub blinks: u32,
    /// Light on duration in seconds (0.0 - 2.55).
    pub on_secs: f32,
    /// Light off duration in seconds (0.0 - 2.55).
    pub off_secs: f32,
    pub color: Rgb,
    pub mode: BlinkMode,
    pub leds: LedSelector,
}

impl Default for BlinkPattern {
    fn default() -> Self {
        Self {
            blinks: 1,
            on_secs: 0.5,
            off_secs: 0.5,
            color: Rgb::new(0x00, 0xFF, 0x00),
            mode: BlinkMode::OneByOne,
            leds: LedSelector::Both,
        }
    }
}

impl BlinkPattern {
    /// Wire form: blinks, on, off, r, g, b, mode, selector.
    fn to_bytes(self) -> [u8; 8] {
        let [r, g, b] = self.color.to_bytes();
        [
            clamp_byte(self.blinks),
            duration_to_byte(self.on_secs),
            duration_to_byte(self.off_secs),
            r,
            g,
            b,
            self.mode as u8,
            self.leds as u8,
        ]
    }
}

/// On-die motion classifier tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub samples_count: u32,
    pub movement_count: u32,
    pub face_count: u32,
    pub min_flat_deg: u32,
    pub max_flat_deg: u32,
    pub weak_stable: u32,
    pub movement_deg: u32,
    pub roll_threshold: u32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            samples_count: SAMPLES_COUNT_DEFAULT.into(),
            movement_count: MOVEMENT_COUNT_DEFAULT.into(),
            face_count: FACE_COUNT_DEFAULT.into(),
            min_flat_deg: MIN_FLAT_DEG_DEFAULT.into(),
            max_flat_deg: MAX_FLAT_DEG_DEFAULT.into(),
            weak_stable: WEAK_STABLE_DEFAULT.into(),
            movement_deg: MOVEMENT_DEG_DEFAULT.into(),
            roll_threshold: ROLL_THRESHOLD_DEFAULT.into(),
        }
    }
}

impl DetectionSettings {
    fn to_bytes(self) -> [u8; 8] {
        [
            self.samples_count,
            self.movement_count,
            self.face_count,
            self.min_flat_deg,
            self.max_flat_deg,
            self.weak_stable,
            self.movement_deg,
            self.roll_threshold,
        ]
        .map(clamp_byte)
    }
}

// ============================================================================
// Builders
// ============================================================================

/// First packet after connecting: sets sensitivity, reports state and
/// runs the blink pattern.
pub fn build_initialization(sensitivity: u32, pattern: &BlinkPattern) -> Vec<u8> {
    let mut buf = Vec::with_capacity(INIT_PACKET_SIZE);
    buf.push(OPCODE_INIT);
    buf.push(clamp_byte(sensitivity));
    buf.extend_from_slice(&pattern.to_bytes());
    buf
}

/// Light both LEDs with fixed colors.
pub fn build_open_leds(led1: Rgb, led2: Rgb) -> Vec<u8> {
    let mut buf = Vec::with_capacity(OPEN_LEDS_PACKET_SIZE);
    buf.push(OPCODE_OPEN_LEDS);
    buf.extend_from_slice(&led1.to_bytes());
    buf.extend_from_slice(&led2.to_bytes());
    buf
}

pub fn build_toggle_leds(pattern: &BlinkPattern) -> Vec<u8> {
    let mut buf = Vec::with_capacity(TOGGLE_LEDS_PACKET_SIZE);
    buf.push(OPCODE_TOGGLE_LEDS);
    buf.extend_from_slice(&pattern.to_bytes());
    buf
}

pub fn build_close_toggle_leds() -> Vec<u8> {
    vec![OPCODE_CLOSE_TOGGLE_LEDS]
}

pub fn build_get_color() -> Vec<u8> {
    vec![OPCODE_GET_COLOR]
}

pub fn build_get_charge_level() -> Vec<u8> {
    vec![OPCODE_GET_CHARGE_LEVEL]
}

pub fn build_detection_settings_update(settings: &DetectionSettings) -> Vec<u8> {
    let mut buf = Vec::with_capacity(DETECTION_SETTINGS_UPDATE_PACKET_SIZE);
    buf.push(OPCODE_DETECTION_SETTINGS_UPDATE);
    buf.extend_from_slice(&settings.to_bytes());
    buf
}

/// Any outgoing command, for callers that queue or log commands before
/// encoding them.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Initialize {
        sensitivity: u32,
        pattern: BlinkPattern,
    },
    OpenLeds {
        led1: Rgb,
        led2: Rgb,
    },
    ToggleLeds(BlinkPattern),
    CloseToggleLeds,
    GetColor,
    GetChargeLevel,
    UpdateDetectionSettings(DetectionSettings),
}

impl Command {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::Initialize {
                sensitivity,
                pattern,
            } => build_initialization(*sensitivity, pattern),
            Command::OpenLeds { led1, led2 } => build_open_leds(*led1, *led2),
            Command::ToggleLeds(pattern) => build_toggle_leds(pattern),
            Command::CloseToggleLeds => build_close_toggle_leds(),
            Command::GetColor => build_get_color(),
            Command::GetChargeLevel => build_get_charge_level(),
            Command::UpdateDetectionSettings(settings) => {
                build_detection_settings_update(settings)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Initialize { .. } => "Initialize",
            Command::OpenLeds { .. } => "OpenLeds",
            Command::ToggleLeds(_) => "ToggleLeds",
            Command::CloseToggleLeds => "CloseToggleLeds",
            Command::GetColor => "GetColor",
            Command::GetChargeLevel => "GetChargeLevel",
            Command::UpdateDetectionSettings(_) => "UpdateDetectionSettings",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden_pattern() -> BlinkPattern {
        BlinkPattern {
            blinks: BLINKS_INFINITE.into(),
            on_secs: 1.0,
            off_secs: 0.5,
            color: Rgb::from_hex(0xFF0000),
            mode: BlinkMode::OneByOne,
            leds: LedSelector::Both,
        }
    }

    #[test]
    fn test_init_golden() {
        let packet = build_initialization(SENSITIVITY_DEFAULT.into(), &golden_pattern());
        assert_eq!(
            packet,
            vec![0x19, 30, 255, 100, 50, 0xFF, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(packet.len(), INIT_PACKET_SIZE);
    }

    #[test]
    fn test_init_deterministic() {
        let pattern = golden_pattern();
        assert_eq!(
            build_initialization(42, &pattern),
            build_initialization(42, &pattern)
        );
    }

    #[test]
    fn test_init_clamps() {
        let pattern = BlinkPattern {
            blinks: 1000,
            on_secs: 9.0,
            off_secs: -1.0,
            color: Rgb::from_hex(0x1234_5678),
            mode: BlinkMode::Parallel,
            leds: LedSelector::Led2,
        };
        let packet = build_initialization(300, &pattern);
        assert_eq!(
            packet,
            vec![0x19, 255, 255, 255, 0, 0xFF, 0xFF, 0xFF, 0x01, 0x02]
        );
    }

    #[test]
    fn test_open_leds() {
        let packet = build_open_leds(Rgb::from_hex(0x112233), Rgb::from_hex(0xAABBCC));
        assert_eq!(packet, vec![0x08, 0x11, 0x22, 0x33, 0xAA, 0xBB, 0xCC]);
        assert_eq!(packet.len(), OPEN_LEDS_PACKET_SIZE);
    }

    #[test]
    fn test_toggle_leds() {
        let pattern = BlinkPattern {
            blinks: 3,
            on_secs: 0.25,
            off_secs: 2.55,
            color: Rgb::new(1, 2, 3),
            mode: BlinkMode::Parallel,
            leds: LedSelector::Led1,
        };
        let packet = build_toggle_leds(&pattern);
        assert_eq!(packet, vec![0x10, 3, 25, 255, 1, 2, 3, 1, 1]);
        assert_eq!(packet.len(), TOGGLE_LEDS_PACKET_SIZE);
    }

    #[test]
    fn test_single_byte_commands() {
        assert_eq!(build_close_toggle_leds(), vec![0x14]);
        assert_eq!(build_get_color(), vec![0x17]);
        assert_eq!(build_get_charge_level(), vec![0x03]);
    }

    #[test]
    fn test_detection_defaults() {
        let packet = build_detection_settings_update(&DetectionSettings::default());
        assert_eq!(packet, vec![0x65, 4, 2, 1, 10, 54, 20, 50, 30]);
        assert_eq!(packet.len(), DETECTION_SETTINGS_UPDATE_PACKET_SIZE);
    }

    #[test]
    fn test_detection_clamps() {
        let settings = DetectionSettings {
            roll_threshold: 4096,
            samples_count: 256,
            ..Default::default()
        };
        let packet = build_detection_settings_update(&settings);
        assert_eq!(packet[1], 255);
        assert_eq!(packet[8], 255);
        assert_eq!(packet[2], MOVEMENT_COUNT_DEFAULT);
    }

    #[test]
    fn test_duration_quantization() {
        for ticks in 0..=255u8 {
            let secs = duration_from_byte(ticks);
            assert_eq!(duration_to_byte(secs), ticks);
        }
        // Arbitrary values land within one step.
        let mut secs = 0.0f32;
        while secs <= DURATION_MAX_SECS {
            let back = duration_from_byte(duration_to_byte(secs));
            assert!((back - secs).abs() <= DURATION_STEP_SECS / 2.0 + 1e-4);
            secs += 0.0037;
        }
    }

    #[test]
    fn test_duration_edges() {
        assert_eq!(duration_to_byte(f32::NAN), 0);
        assert_eq!(duration_to_byte(-0.3), 0);
        assert_eq!(duration_to_byte(100.0), 255);
        assert_eq!(duration_to_byte(0.004), 0);
        assert_eq!(duration_to_byte(0.006), 1);
    }

    #[test]
    fn test_rgb_hex() {
        let rgb = Rgb::from_hex(0xFFA500);
        assert_eq!(rgb, Rgb::new(0xFF, 0xA5, 0x00));
        assert_eq!(rgb.to_hex(), 0xFFA500);
        assert_eq!(Rgb::from_hex(0x0100_0000), Rgb::new(0xFF, 0xFF, 0xFF));
    }

    #[test]
    fn test_command_encode_matches_builders() {
        let pattern = golden_pattern();
        assert_eq!(
            Command::Initialize {
                sensitivity: 30,
                pattern
            }
            .encode(),
            build_initialization(30, &pattern)
        );
        assert_eq!(Command::GetChargeLevel.encode(), build_get_charge_level());
        assert_eq!(
            Command::UpdateDetectionSettings(DetectionSettings::default()).encode(),
            build_detection_settings_update(&DetectionSettings::default())
        );
    }
}
