//! GoDice-Core: packet codec and per-die state for GoDice Bluetooth dice.
//!
//! The Bluetooth link itself is left to the host platform. This crate
//! turns commands into the bytes written to the die's write
//! characteristic, and the bytes received on its notify characteristic
//! into typed events.
//!
//! # Architecture
//!
//! - **Protocol**: Opcodes, notification keys, firmware defaults
//! - **Shell**: Face-resolution tables for each die shell
//! - **Encoder**: Pure builders for every outgoing command
//! - **Decoder**: Notification parsing into [`DieEvent`]s
//! - **Registry**: Per-die session state
//! - **Events**: Observer trait and single-observer dispatcher
//! - **Transport**: Write-side seam to the host's Bluetooth stack (plus mock)
//! - **Session**: [`GoDiceHub`], tying the pieces together
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use godice_core::{DieId, GoDiceHub, HubConfig, ShellType, TracingObserver};
//!
//! let hub = GoDiceHub::with_observer(HubConfig::default(), Arc::new(TracingObserver));
//! hub.connect(DieId(1), ShellType::D20);
//!
//! // Bytes from the notify characteristic.
//! let event = hub.deliver(DieId(1), ShellType::D20, b"Bat\x39").unwrap();
//! assert_eq!(hub.state(DieId(1)).charge_level, Some(57));
//! # let _ = event;
//! ```

pub mod decoder;
pub mod encoder;
pub mod events;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod shell;
pub mod transport;

// Re-exports for convenience
pub use decoder::{DecodeError, Decoder, PayloadFault, decode};
pub use encoder::{
    BlinkMode, BlinkPattern, Command, DetectionSettings, LedSelector, Rgb, build_close_toggle_leds,
    build_detection_settings_update, build_get_charge_level, build_get_color,
    build_initialization, build_open_leds, build_toggle_leds,
};
pub use events::{
    DieColor, DieEvent, DieId, DieObserver, Dispatcher, NullObserver, StableKind, TracingObserver,
};
pub use protocol::{BLINKS_INFINITE, NotificationKey, SENSITIVITY_DEFAULT};
pub use registry::{DieSession, DieState, SessionRegistry};
pub use session::{GoDiceHub, HubConfig};
pub use shell::{Axis, FaceMap, ShellProfile, ShellProfiles, ShellType};
pub use transport::{DieTransport, MockTransport, TransportError};
