//! Notification key matching.
//!
//! The firmware prefixes every notification with a short ASCII key
//! (`R`, `S`, `Bat`, ...) followed by a key-specific body.

use std::fmt;

use super::constants::*;

/// Parsed notification key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKey {
    Roll,
    Tap,
    DoubleTap,
    Battery,
    Charging,
    Stable,
    FakeStable,
    TiltStable,
    MoveStable,
    Color,
}

/// Match order. No key is a prefix of another, so the first hit is the
/// only hit; keep it that way when adding keys.
const MATCH_ORDER: &[(NotificationKey, &[u8])] = &[
    (NotificationKey::Roll, KEY_ROLL),
    (NotificationKey::Tap, KEY_TAP),
    (NotificationKey::DoubleTap, KEY_DOUBLE_TAP),
    (NotificationKey::Battery, KEY_BATTERY),
    (NotificationKey::Charging, KEY_CHARGING),
    (NotificationKey::Stable, KEY_STABLE),
    (NotificationKey::FakeStable, KEY_FAKE_STABLE),
    (NotificationKey::TiltStable, KEY_TILT_STABLE),
    (NotificationKey::MoveStable, KEY_MOVE_STABLE),
    (NotificationKey::Color, KEY_COLOR),
];

impl NotificationKey {
    /// Find the key a packet starts with.
    ///
    /// Returns the key and the body that follows it.
    pub fn split(packet: &[u8]) -> Option<(Self, &[u8])> {
        MATCH_ORDER
            .iter()
            .find(|(_, prefix)| packet.starts_with(prefix))
            .map(|(key, prefix)| (*key, &packet[prefix.len()..]))
    }

    /// Raw prefix bytes.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            NotificationKey::Roll => KEY_ROLL,
            NotificationKey::Tap => KEY_TAP,
            NotificationKey::DoubleTap => KEY_DOUBLE_TAP,
            NotificationKey::Battery => KEY_BATTERY,
            NotificationKey::Charging => KEY_CHARGING,
            NotificationKey::Stable => KEY_STABLE,
            NotificationKey::FakeStable => KEY_FAKE_STABLE,
            NotificationKey::TiltStable => KEY_TILT_STABLE,
            NotificationKey::MoveStable => KEY_MOVE_STABLE,
            NotificationKey::Color => KEY_COLOR,
        }
    }

    /// ASCII form of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKey::Roll => "R",
            NotificationKey::Tap => "Tap",
            NotificationKey::DoubleTap => "DTap",
            NotificationKey::Battery => "Bat",
            NotificationKey::Charging => "Char",
            NotificationKey::Stable => "S",
            NotificationKey::FakeStable => "FS",
            NotificationKey::TiltStable => "TS",
            NotificationKey::MoveStable => "MS",
            NotificationKey::Color => "Col",
        }
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Printable form of an unrecognized prefix, for logs and errors.
pub fn printable_prefix(packet: &[u8]) -> String {
    packet
        .iter()
        .take(4)
        .map(|&b| {
            if b.is_ascii_graphic() {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_roll() {
        let (key, body) = NotificationKey::split(b"R").unwrap();
        assert_eq!(key, NotificationKey::Roll);
        assert!(body.is_empty());
    }

    #[test]
    fn test_split_battery_body() {
        let (key, body) = NotificationKey::split(&[b'B', b'a', b't', 57]).unwrap();
        assert_eq!(key, NotificationKey::Battery);
        assert_eq!(body, &[57]);
    }

    #[test]
    fn test_stable_variants() {
        assert_eq!(
            NotificationKey::split(b"FS\x01\x02\x03").unwrap().0,
            NotificationKey::FakeStable
        );
        assert_eq!(
            NotificationKey::split(b"TS\x01\x02\x03").unwrap().0,
            NotificationKey::TiltStable
        );
        assert_eq!(
            NotificationKey::split(b"MS\x01\x02\x03").unwrap().0,
            NotificationKey::MoveStable
        );
        assert_eq!(
            NotificationKey::split(b"S\x01\x02\x03").unwrap().0,
            NotificationKey::Stable
        );
    }

    #[test]
    fn test_tap_is_not_tilt_stable() {
        assert_eq!(NotificationKey::split(b"Tap").unwrap().0, NotificationKey::Tap);
        assert_eq!(
            NotificationKey::split(b"DTap").unwrap().0,
            NotificationKey::DoubleTap
        );
    }

    #[test]
    fn test_no_key_prefixes_another() {
        for (a, pa) in MATCH_ORDER {
            for (b, pb) in MATCH_ORDER {
                if a != b {
                    assert!(!pb.starts_with(pa), "{} prefixes {}", a, b);
                }
            }
            assert_eq!(a.as_bytes(), *pa);
            assert_eq!(a.as_str().as_bytes(), *pa);
        }
    }

    #[test]
    fn test_unknown() {
        assert!(NotificationKey::split(&[0xEE, 0x01]).is_none());
        assert!(NotificationKey::split(&[]).is_none());
        assert!(NotificationKey::split(b"Co").is_none());
    }

    #[test]
    fn test_printable_prefix() {
        assert_eq!(printable_prefix(&[0xEE, b'X']), ".X");
        assert_eq!(printable_prefix(b"Hello"), "Hell");
    }
}
