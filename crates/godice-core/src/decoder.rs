//! Notification decoder.
//!
//! Turns a raw notify-characteristic value into a [`DieEvent`]. Decoding
//! is pure: it never touches die state, so a rejected packet cannot leave
//! a partial update behind.

use std::io::Cursor;
use std::sync::LazyLock;

use byteorder::ReadBytesExt;
use thiserror::Error;
use tracing::trace;

use crate::events::{DieColor, DieEvent, DieId, StableKind};
use crate::protocol::constants::{AXIS_SIZE, CHARGE_LEVEL_MAX};
use crate::protocol::key::{NotificationKey, printable_prefix};
use crate::shell::{Axis, ShellProfiles, ShellType};

/// What was wrong with the body of a recognized notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadFault {
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("value {0} out of range")]
    OutOfRange(u8),
    #[error("reading does not map to a {0} face")]
    UnresolvedFace(ShellType),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty packet")]
    Empty,
    #[error("Unknown opcode 0x{opcode:02X} ('{prefix}')")]
    UnknownOpcode { opcode: u8, prefix: String },
    #[error("Malformed {key} payload: {fault}")]
    MalformedPayload {
        key: NotificationKey,
        fault: PayloadFault,
    },
}

impl DecodeError {
    fn malformed(key: NotificationKey, fault: PayloadFault) -> Self {
        DecodeError::MalformedPayload { key, fault }
    }
}

static BUILTIN_DECODER: LazyLock<Decoder> = LazyLock::new(Decoder::new);

/// Decode with the built-in shell profiles.
pub fn decode(die: DieId, shell: ShellType, packet: &[u8]) -> Result<DieEvent, DecodeError> {
    BUILTIN_DECODER.decode(die, shell, packet)
}

/// Decoder holding the shell profile table used for stable reports.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    profiles: ShellProfiles,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: ShellProfiles) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &ShellProfiles {
        &self.profiles
    }

    /// Decode one notification from `die`, fitted with `shell`.
    pub fn decode(
        &self,
        die: DieId,
        shell: ShellType,
        packet: &[u8],
    ) -> Result<DieEvent, DecodeError> {
        trace!(die = %die, shell = %shell, len = packet.len(), data = ?packet, "RX packet");

        let Some(&opcode) = packet.first() else {
            return Err(DecodeError::Empty);
        };
        let Some((key, body)) = NotificationKey::split(packet) else {
            return Err(DecodeError::UnknownOpcode {
                opcode,
                prefix: printable_prefix(packet),
            });
        };

        match key {
            NotificationKey::Roll => Ok(DieEvent::Rolling),
            NotificationKey::Tap => Ok(DieEvent::Tap),
            NotificationKey::DoubleTap => Ok(DieEvent::DoubleTap),
            NotificationKey::Battery => {
                let level = single_byte(key, body)?;
                if level > CHARGE_LEVEL_MAX {
                    return Err(DecodeError::malformed(key, PayloadFault::OutOfRange(level)));
                }
                Ok(DieEvent::ChargeLevelReported { level })
            }
            NotificationKey::Charging => {
                let charging = single_byte(key, body)? != 0;
                Ok(DieEvent::ChargingStateChanged { charging })
            }
            NotificationKey::Color => {
                let code = single_byte(key, body)?;
                let color = DieColor::try_from(code)
                    .map_err(|_| DecodeError::malformed(key, PayloadFault::OutOfRange(code)))?;
                Ok(DieEvent::ColorReported { color })
            }
            NotificationKey::Stable => self.stable(key, StableKind::Stable, shell, body),
            NotificationKey::FakeStable => self.stable(key, StableKind::Fake, shell, body),
            NotificationKey::TiltStable => self.stable(key, StableKind::Tilt, shell, body),
            NotificationKey::MoveStable => self.stable(key, StableKind::Move, shell, body),
        }
    }

    fn stable(
        &self,
        key: NotificationKey,
        kind: StableKind,
        shell: ShellType,
        body: &[u8],
    ) -> Result<DieEvent, DecodeError> {
        let axis = read_axis(key, body)?;
        let profile = self.profiles.get(shell);
        let value = profile
            .resolve(&axis)
            .ok_or_else(|| DecodeError::malformed(key, PayloadFault::UnresolvedFace(shell)))?;
        if !shell.value_range().contains(&value) {
            return Err(DecodeError::malformed(key, PayloadFault::OutOfRange(value)));
        }
        trace!(?axis, value, "Resolved face");
        Ok(DieEvent::StableReported { value, kind })
    }
}

fn single_byte(key: NotificationKey, body: &[u8]) -> Result<u8, DecodeError> {
    match body {
        [value] => Ok(*value),
        _ => Err(DecodeError::malformed(
            key,
            PayloadFault::Length {
                expected: 1,
                actual: body.len(),
            },
        )),
    }
}

fn read_axis(key: NotificationKey, body: &[u8]) -> Result<Axis, DecodeError> {
    let length_fault = || {
        DecodeError::malformed(
            key,
            PayloadFault::Length {
                expected: AXIS_SIZE,
                actual: body.len(),
            },
        )
    };
    if body.len() != AXIS_SIZE {
        return Err(length_fault());
    }
    let mut cursor = Cursor::new(body);
    let mut next = || cursor.read_i8().map_err(|_| length_fault());
    Ok(Axis::new(next()?, next()?, next()?))
}
