//! Protocol constants for the GoDice firmware.
//!
//! Outgoing commands are keyed by a single opcode byte. Incoming
//! notifications are keyed by a short ASCII prefix.

// ============================================================================
// Command Opcodes (Host -> Die)
// ============================================================================

/// Initialize: sensitivity plus the blink pattern shown on connect.
pub const OPCODE_INIT: u8 = 0x19;

/// Open LEDs with two fixed colors.
pub const OPCODE_OPEN_LEDS: u8 = 0x08;

/// Start a blink pattern.
pub const OPCODE_TOGGLE_LEDS: u8 = 0x10;

/// Stop any running blink pattern.
pub const OPCODE_CLOSE_TOGGLE_LEDS: u8 = 0x14;

/// Request the shell color. Answered with a `Col` notification.
pub const OPCODE_GET_COLOR: u8 = 0x17;

/// Request the battery level. Answered with a `Bat` notification.
pub const OPCODE_GET_CHARGE_LEVEL: u8 = 0x03;

/// Replace the on-die motion classifier settings.
pub const OPCODE_DETECTION_SETTINGS_UPDATE: u8 = 0x65;

// ============================================================================
// Packet Sizes (opcode included)
// ============================================================================

pub const INIT_PACKET_SIZE: usize = 10;
pub const OPEN_LEDS_PACKET_SIZE: usize = 7;
pub const TOGGLE_LEDS_PACKET_SIZE: usize = 9;
pub const CLOSE_TOGGLE_LEDS_PACKET_SIZE: usize = 1;
pub const GET_COLOR_PACKET_SIZE: usize = 1;
pub const GET_CHARGE_LEVEL_PACKET_SIZE: usize = 1;
pub const DETECTION_SETTINGS_UPDATE_PACKET_SIZE: usize = 9;

// ============================================================================
// Notification Keys (Die -> Host)
// ============================================================================

pub const KEY_BATTERY: &[u8] = b"Bat";
pub const KEY_ROLL: &[u8] = b"R";
pub const KEY_STABLE: &[u8] = b"S";
pub const KEY_FAKE_STABLE: &[u8] = b"FS";
pub const KEY_MOVE_STABLE: &[u8] = b"MS";
pub const KEY_TILT_STABLE: &[u8] = b"TS";
pub const KEY_TAP: &[u8] = b"Tap";
pub const KEY_DOUBLE_TAP: &[u8] = b"DTap";
pub const KEY_CHARGING: &[u8] = b"Char";
pub const KEY_COLOR: &[u8] = b"Col";

/// Accelerometer reading carried by every stable notification (x, y, z).
pub const AXIS_SIZE: usize = 3;

/// Highest charge level the die reports.
pub const CHARGE_LEVEL_MAX: u8 = 100;

// ============================================================================
// Defaults
// ============================================================================

pub const SENSITIVITY_DEFAULT: u8 = 30;

/// Blink count that keeps the pattern running until closed.
pub const BLINKS_INFINITE: u8 = 255;

pub const SAMPLES_COUNT_DEFAULT: u8 = 4;
pub const MOVEMENT_COUNT_DEFAULT: u8 = 2;
pub const FACE_COUNT_DEFAULT: u8 = 1;
pub const MIN_FLAT_DEG_DEFAULT: u8 = 10;
pub const MAX_FLAT_DEG_DEFAULT: u8 = 54;
pub const WEAK_STABLE_DEFAULT: u8 = 20;
pub const MOVEMENT_DEG_DEFAULT: u8 = 50;
pub const ROLL_THRESHOLD_DEFAULT: u8 = 30;

/// LED durations travel as multiples of 10 ms.
pub const DURATION_STEP_SECS: f32 = 0.01;

/// Longest LED duration a single byte can carry (2.55 s).
pub const DURATION_MAX_SECS: f32 = 2.55;
