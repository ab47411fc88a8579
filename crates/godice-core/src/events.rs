//! Die events and observer dispatch.
//!
//! The host application registers one observer with a [`Dispatcher`];
//! decoded events are routed to the matching callback synchronously.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

/// Caller-assigned die identifier, stable for the lifetime of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DieId(pub u32);

impl fmt::Display for DieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "die#{}", self.0)
    }
}

impl From<u32> for DieId {
    fn from(id: u32) -> Self {
        DieId(id)
    }
}

/// Shell color reported by the die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DieColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Blue = 3,
    Yellow = 4,
    Orange = 5,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid color code: {0}")]
pub struct InvalidColor(pub u8);

impl TryFrom<u8> for DieColor {
    type Error = InvalidColor;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(DieColor::Black),
            1 => Ok(DieColor::Red),
            2 => Ok(DieColor::Green),
            3 => Ok(DieColor::Blue),
            4 => Ok(DieColor::Yellow),
            5 => Ok(DieColor::Orange),
            other => Err(InvalidColor(other)),
        }
    }
}

impl fmt::Display for DieColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DieColor::Black => write!(f, "Black"),
            DieColor::Red => write!(f, "Red"),
            DieColor::Green => write!(f, "Green"),
            DieColor::Blue => write!(f, "Blue"),
            DieColor::Yellow => write!(f, "Yellow"),
            DieColor::Orange => write!(f, "Orange"),
        }
    }
}

/// Which classifier path settled the die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StableKind {
    #[default]
    Stable,
    /// Settled without a detected roll.
    Fake,
    /// Settled after being tilted onto a new face.
    Tilt,
    /// Settled after being moved without rolling.
    Move,
}

impl fmt::Display for StableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StableKind::Stable => write!(f, "Stable"),
            StableKind::Fake => write!(f, "FakeStable"),
            StableKind::Tilt => write!(f, "TiltStable"),
            StableKind::Move => write!(f, "MoveStable"),
        }
    }
}

/// Decoded die notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DieEvent {
    /// Die started moving.
    Rolling,
    /// Die came to rest showing `value`.
    StableReported { value: u8, kind: StableKind },
    ChargingStateChanged { charging: bool },
    /// Battery level, 0-100.
    ChargeLevelReported { level: u8 },
    ColorReported { color: DieColor },
    Tap,
    DoubleTap,
}

impl fmt::Display for DieEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DieEvent::Rolling => write!(f, "Rolling"),
            DieEvent::StableReported { value, kind } => write!(f, "{} ({})", kind, value),
            DieEvent::ChargingStateChanged { charging } => {
                write!(f, "Charging {}", if *charging { "started" } else { "stopped" })
            }
            DieEvent::ChargeLevelReported { level } => write!(f, "Charge level {}%", level),
            DieEvent::ColorReported { color } => write!(f, "Color {}", color),
            DieEvent::Tap => write!(f, "Tap"),
            DieEvent::DoubleTap => write!(f, "Double tap"),
        }
    }
}

/// Callbacks for die events.
///
/// Implement this in the host application. Callbacks run on the thread
/// that delivered the packet and should return quickly.
pub trait DieObserver: Send + Sync {
    /// Response to a color query.
    fn on_color(&self, die: DieId, color: DieColor);

    /// Die settled showing `value`.
    fn on_stable(&self, die: DieId, value: u8);

    fn on_roll(&self, die: DieId);

    fn on_charging_state_changed(&self, die: DieId, charging: bool);

    /// Response to a charge level query.
    fn on_charge_level(&self, die: DieId, level: u8);

    fn on_tap(&self, _die: DieId) {}

    fn on_double_tap(&self, _die: DieId) {}
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl DieObserver for NullObserver {
    fn on_color(&self, _die: DieId, _color: DieColor) {}
    fn on_stable(&self, _die: DieId, _value: u8) {}
    fn on_roll(&self, _die: DieId) {}
    fn on_charging_state_changed(&self, _die: DieId, _charging: bool) {}
    fn on_charge_level(&self, _die: DieId, _level: u8) {}
}

/// Observer that logs events using tracing.
pub struct TracingObserver;

impl DieObserver for TracingObserver {
    fn on_color(&self, die: DieId, color: DieColor) {
        tracing::info!(die = %die, color = %color, "Color reported");
    }

    fn on_stable(&self, die: DieId, value: u8) {
        tracing::info!(die = %die, value, "Die stable");
    }

    fn on_roll(&self, die: DieId) {
        tracing::info!(die = %die, "Die rolling");
    }

    fn on_charging_state_changed(&self, die: DieId, charging: bool) {
        tracing::info!(die = %die, charging, "Charging state changed");
    }

    fn on_charge_level(&self, die: DieId, level: u8) {
        tracing::info!(die = %die, level = %format!("{}%", level), "Charge level");
    }

    fn on_tap(&self, die: DieId) {
        tracing::debug!(die = %die, "Tap");
    }

    fn on_double_tap(&self, die: DieId) {
        tracing::debug!(die = %die, "Double tap");
    }
}

/// Routes events to the single registered observer.
///
/// Registering replaces the previous observer. Events arriving with no
/// observer are dropped.
#[derive(Default)]
pub struct Dispatcher {
    observer: RwLock<Option<Arc<dyn DieObserver>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: Arc<dyn DieObserver>) -> Self {
        Self {
            observer: RwLock::new(Some(observer)),
        }
    }

    /// Register `observer`, replacing any previous one.
    pub fn register(&self, observer: Arc<dyn DieObserver>) {
        *self.observer.write() = Some(observer);
    }

    /// Remove the observer. Returns the one that was registered.
    pub fn clear(&self) -> Option<Arc<dyn DieObserver>> {
        self.observer.write().take()
    }

    pub fn has_observer(&self) -> bool {
        self.observer.read().is_some()
    }

    /// Invoke the callback matching `event`.
    pub fn notify(&self, die: DieId, event: &DieEvent) {
        // Clone out so the observer can re-register without deadlocking.
        let Some(observer) = self.observer.read().clone() else {
            tracing::trace!(die = %die, event = %event, "No observer, event dropped");
            return;
        };

        match *event {
            DieEvent::Rolling => observer.on_roll(die),
            DieEvent::StableReported { value, .. } => observer.on_stable(die, value),
            DieEvent::ChargingStateChanged { charging } => {
                observer.on_charging_state_changed(die, charging)
            }
            DieEvent::ChargeLevelReported { level } => observer.on_charge_level(die, level),
            DieEvent::ColorReported { color } => observer.on_color(die, color),
            DieEvent::Tap => observer.on_tap(die),
            DieEvent::DoubleTap => observer.on_double_tap(die),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("has_observer", &self.has_observer())
            .finish()
    }
}
