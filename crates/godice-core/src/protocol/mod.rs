//! Protocol module - GoDice wire definitions.

pub mod constants;
pub mod key;

pub use constants::*;
pub use key::NotificationKey;
