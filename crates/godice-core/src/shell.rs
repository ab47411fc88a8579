//! Die shell profiles.
//!
//! A GoDice reports the gravity vector of its resting position, not a face
//! number. Each shell carries a table of reference vectors (one per
//! physical face the sensor can distinguish) and a face map that turns the
//! 1-based index of the nearest reference into the number printed on the
//! shell.

use std::borrow::Cow;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shell variant fitted to the die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellType {
    D4,
    #[default]
    D6,
    D8,
    D10,
    D12,
    D20,
    /// Percentile shell (00, 10, ... 90).
    D10X,
}

impl ShellType {
    pub const ALL: [ShellType; 7] = [
        ShellType::D4,
        ShellType::D6,
        ShellType::D8,
        ShellType::D10,
        ShellType::D12,
        ShellType::D20,
        ShellType::D10X,
    ];

    /// Highest face value of the shell.
    pub fn max_face(self) -> u8 {
        match self {
            ShellType::D4 => 4,
            ShellType::D6 => 6,
            ShellType::D8 => 8,
            ShellType::D10 => 10,
            ShellType::D12 => 12,
            ShellType::D20 => 20,
            ShellType::D10X => 100,
        }
    }

    /// Values a stable report may carry for this shell.
    pub fn value_range(self) -> RangeInclusive<u8> {
        match self {
            ShellType::D10X => 0..=99,
            other => 1..=other.max_face(),
        }
    }

    pub fn is_percentile(self) -> bool {
        self == ShellType::D10X
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ShellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShellType::D4 => "d4",
            ShellType::D6 => "d6",
            ShellType::D8 => "d8",
            ShellType::D10 => "d10",
            ShellType::D12 => "d12",
            ShellType::D20 => "d20",
            ShellType::D10X => "d10x",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown shell type: {0}")]
pub struct UnknownShell(pub String);

impl FromStr for ShellType {
    type Err = UnknownShell;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "d4" => Ok(ShellType::D4),
            "d6" => Ok(ShellType::D6),
            "d8" => Ok(ShellType::D8),
            "d10" => Ok(ShellType::D10),
            "d12" => Ok(ShellType::D12),
            "d20" => Ok(ShellType::D20),
            "d10x" | "d100" | "percentile" => Ok(ShellType::D10X),
            _ => Err(UnknownShell(s.to_string())),
        }
    }
}

/// Accelerometer reading, one signed byte per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Axis {
    pub x: i8,
    pub y: i8,
    pub z: i8,
}

impl Axis {
    pub const fn new(x: i8, y: i8, z: i8) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance. Orders the same as the true distance.
    pub fn distance_sq(&self, other: &Axis) -> i32 {
        let dx = i32::from(other.x) - i32::from(self.x);
        let dy = i32::from(other.y) - i32::from(self.y);
        let dz = i32::from(other.z) - i32::from(self.z);
        dx * dx + dy * dy + dz * dz
    }
}

// ============================================================================
// Reference Vectors
// ============================================================================

const fn ax(x: i8, y: i8, z: i8) -> Axis {
    Axis::new(x, y, z)
}

pub const D6_ANCHORS: [Axis; 6] = [
    ax(-64, 0, 0),
    ax(0, 0, 64),
    ax(0, 64, 0),
    ax(0, -64, 0),
    ax(0, 0, -64),
    ax(64, 0, 0),
];

pub const D20_ANCHORS: [Axis; 20] = [
    ax(-64, 0, -22),
    ax(42, -42, 40),
    ax(0, 22, -64),
    ax(0, 22, 64),
    ax(-42, -42, 42),
    ax(22, 64, 0),
    ax(-42, -42, -42),
    ax(64, 0, -22),
    ax(-22, 64, 0),
    ax(42, -42, -42),
    ax(-42, 42, 42),
    ax(22, -64, 0),
    ax(-64, 0, 22),
    ax(42, 42, 42),
    ax(-22, -64, 0),
    ax(42, 42, -42),
    ax(0, -22, -64),
    ax(0, -22, 64),
    ax(-42, 42, -42),
    ax(64, 0, 22),
];

/// Shared by the D4, D8 and D12 shells.
pub const D24_ANCHORS: [Axis; 24] = [
    ax(20, -60, -20),
    ax(20, 0, 60),
    ax(-40, -40, 40),
    ax(-60, 0, 20),
    ax(40, 20, 40),
    ax(-20, -60, -20),
    ax(20, 60, 20),
    ax(-40, 20, -40),
    ax(-40, 40, 40),
    ax(-20, 0, 60),
    ax(-20, -60, 20),
    ax(60, 0, 20),
    ax(-60, 0, -20),
    ax(20, 60, -20),
    ax(20, 0, -60),
    ax(40, -20, -40),
    ax(-20, 60, -20),
    ax(-40, -40, -40),
    ax(40, -20, 40),
    ax(20, -60, 20),
    ax(60, 0, -20),
    ax(40, 20, -40),
    ax(-20, 0, -60),
    ax(-20, 60, 20),
];

// ============================================================================
// Face Maps (indexed by raw code - 1)
// ============================================================================

pub const D4_FACES: [u8; 24] = [
    3, 1, 4, 1, 4, 4, 1, 4, 2, 3, 1, 1, 1, 4, 2, 3, 3, 2, 2, 2, 4, 1, 3, 2,
];

pub const D8_FACES: [u8; 24] = [
    3, 3, 6, 1, 2, 8, 1, 1, 4, 7, 5, 5, 4, 4, 2, 5, 7, 7, 8, 2, 8, 3, 6, 6,
];

/// Printed digit of each D10 anchor. The face printed "0" is read as 10.
pub const D10_DIGITS: [u8; 20] = [8, 2, 6, 1, 4, 3, 9, 0, 7, 5, 5, 7, 0, 9, 3, 4, 1, 6, 2, 8];

pub const D12_FACES: [u8; 24] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
];

/// How a raw code becomes a face value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaceMap {
    /// Raw code is the face value.
    Identity,
    /// `table[code - 1]`.
    Lookup(Cow<'static, [u8]>),
    /// `table[code - 1]`, with `zero_as` substituted for a 0 entry.
    LookupZeroAs {
        table: Cow<'static, [u8]>,
        zero_as: u8,
    },
    /// `table[code - 1] * factor`.
    Scaled {
        table: Cow<'static, [u8]>,
        factor: u8,
    },
}

impl FaceMap {
    /// Map a 1-based raw code. `None` if the code falls outside the table.
    pub fn apply(&self, code: u8) -> Option<u8> {
        let idx = usize::from(code.checked_sub(1)?);
        match self {
            FaceMap::Identity => Some(code),
            FaceMap::Lookup(table) => table.get(idx).copied(),
            FaceMap::LookupZeroAs { table, zero_as } => match table.get(idx).copied()? {
                0 => Some(*zero_as),
                v => Some(v),
            },
            FaceMap::Scaled { table, factor } => table.get(idx)?.checked_mul(*factor),
        }
    }
}

/// Decoding rule for one shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellProfile {
    pub shell: ShellType,
    pub anchors: Cow<'static, [Axis]>,
    pub faces: FaceMap,
}

impl ShellProfile {
    pub fn new(shell: ShellType, anchors: Cow<'static, [Axis]>, faces: FaceMap) -> Self {
        Self {
            shell,
            anchors,
            faces,
        }
    }

    /// Built-in profile matching current die firmware.
    pub fn builtin(shell: ShellType) -> Self {
        let (anchors, faces): (&'static [Axis], FaceMap) = match shell {
            ShellType::D4 => (&D24_ANCHORS[..], FaceMap::Lookup(Cow::Borrowed(&D4_FACES[..]))),
            ShellType::D6 => (&D6_ANCHORS[..], FaceMap::Identity),
            ShellType::D8 => (&D24_ANCHORS[..], FaceMap::Lookup(Cow::Borrowed(&D8_FACES[..]))),
            ShellType::D10 => (
                &D20_ANCHORS,
                FaceMap::LookupZeroAs {
                    table: Cow::Borrowed(&D10_DIGITS[..]),
                    zero_as: 10,
                },
            ),
            ShellType::D12 => (&D24_ANCHORS[..], FaceMap::Lookup(Cow::Borrowed(&D12_FACES[..]))),
            ShellType::D20 => (&D20_ANCHORS[..], FaceMap::Identity),
            ShellType::D10X => (
                &D20_ANCHORS,
                FaceMap::Scaled {
                    table: Cow::Borrowed(&D10_DIGITS[..]),
                    factor: 10,
                },
            ),
        };
        Self::new(shell, Cow::Borrowed(anchors), faces)
    }

    /// 1-based index of the closest reference vector. First wins on ties.
    pub fn raw_code(&self, axis: &Axis) -> Option<u8> {
        let mut best: Option<(usize, i32)> = None;
        for (i, anchor) in self.anchors.iter().enumerate() {
            let dist = axis.distance_sq(anchor);
            if best.is_none_or(|(_, min)| dist < min) {
                best = Some((i, dist));
            }
        }
        best.and_then(|(i, _)| u8::try_from(i + 1).ok())
    }

    /// Face value for an accelerometer reading.
    pub fn resolve(&self, axis: &Axis) -> Option<u8> {
        self.faces.apply(self.raw_code(axis)?)
    }

    pub fn max_face(&self) -> u8 {
        self.shell.max_face()
    }
}

/// Profile table keyed by shell. Individual entries can be replaced to
/// carry a different calibration.
#[derive(Debug, Clone)]
pub struct ShellProfiles {
    profiles: [ShellProfile; 7],
}

impl Default for ShellProfiles {
    fn default() -> Self {
        Self {
            profiles: ShellType::ALL.map(ShellProfile::builtin),
        }
    }
}

impl ShellProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, shell: ShellType) -> &ShellProfile {
        &self.profiles[shell.index()]
    }

    /// Replace the profile for `profile.shell`.
    pub fn with_profile(mut self, profile: ShellProfile) -> Self {
        let idx = profile.shell.index();
        self.profiles[idx] = profile;
        self
    }
}
