//! GoDice hub - ties the decoder, the session registry and the observer
//! together behind the two transport entry points (`deliver` and `send`).

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::decoder::{DecodeError, Decoder};
use crate::encoder::{BlinkPattern, Command, DetectionSettings};
use crate::events::{DieEvent, DieId, DieObserver, Dispatcher};
use crate::protocol::constants::SENSITIVITY_DEFAULT;
use crate::registry::{DieSession, DieState, SessionRegistry};
use crate::shell::ShellType;
use crate::transport::{DieTransport, TransportError};

/// Hub configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Shell assumed for dice that report before being opened.
    pub default_shell: ShellType,
    /// Sensitivity sent in the init packet. Useful values vary by shell.
    pub sensitivity: u32,
    /// Blink pattern shown when a die is initialized.
    pub init_pattern: BlinkPattern,
    /// Motion classifier settings.
    pub detection: DetectionSettings,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            default_shell: ShellType::D6,
            sensitivity: SENSITIVITY_DEFAULT.into(),
            init_pattern: BlinkPattern::default(),
            detection: DetectionSettings::default(),
        }
    }
}

impl HubConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HubConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn init_command(&self) -> Command {
        Command::Initialize {
            sensitivity: self.sensitivity,
            pattern: self.init_pattern,
        }
    }

    pub fn detection_command(&self) -> Command {
        Command::UpdateDetectionSettings(self.detection)
    }
}

/// Entry point for a host application managing one or more dice.
#[derive(Debug)]
pub struct GoDiceHub {
    config: HubConfig,
    decoder: Decoder,
    registry: SessionRegistry,
    dispatcher: Dispatcher,
}

impl GoDiceHub {
    /// Hub with no observer registered.
    pub fn new(config: HubConfig) -> Self {
        Self::with_decoder(config, Decoder::new())
    }

    pub fn with_observer(config: HubConfig, observer: Arc<dyn DieObserver>) -> Self {
        let hub = Self::new(config);
        hub.dispatcher.register(observer);
        hub
    }

    /// Hub with a custom shell profile table.
    pub fn with_decoder(config: HubConfig, decoder: Decoder) -> Self {
        Self {
            registry: SessionRegistry::new(config.default_shell),
            dispatcher: Dispatcher::new(),
            decoder,
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Replace the observer.
    pub fn set_observer(&self, observer: Arc<dyn DieObserver>) {
        self.dispatcher.register(observer);
    }

    pub fn clear_observer(&self) {
        self.dispatcher.clear();
    }

    /// Register a newly connected die.
    pub fn connect(&self, die: DieId, shell: ShellType) -> DieSession {
        self.registry.open(die, shell)
    }

    /// Drop all state for `die`. Call on disconnect.
    pub fn forget(&self, die: DieId) -> bool {
        self.registry.forget(die)
    }

    pub fn state(&self, die: DieId) -> DieState {
        self.registry.get(die)
    }

    pub fn session(&self, die: DieId) -> Option<DieSession> {
        self.registry.session(die)
    }

    /// Handle one notification from `die` fitted with `shell`.
    ///
    /// On success the die state is updated and the observer notified. On
    /// error the registry is left untouched, including the recorded shell.
    #[instrument(level = "debug", skip(self, payload), fields(die = %die))]
    pub fn deliver(
        &self,
        die: DieId,
        shell: ShellType,
        payload: &[u8],
    ) -> Result<DieEvent, DecodeError> {
        let event = self.decoder.decode(die, shell, payload).inspect_err(|e| {
            warn!(error = %e, data = ?payload, "Rejected packet");
        })?;
        {
            let entry = self.registry.entry(die, Some(shell));
            let mut session = entry.lock();
            if session.shell != shell {
                debug!(from = %session.shell, to = %shell, "Shell changed");
                session.shell = shell;
            }
            session.state.apply(&event);
        }
        debug!(event = %event, "Decoded");
        self.dispatcher.notify(die, &event);
        Ok(event)
    }

    /// Handle a notification using the shell already recorded for `die`.
    pub fn deliver_known(&self, die: DieId, payload: &[u8]) -> Result<DieEvent, DecodeError> {
        let shell = self.registry.shell(die);
        self.deliver(die, shell, payload)
    }

    /// Encode `command` and write it to `die`.
    pub fn send<T: DieTransport + ?Sized>(
        &self,
        transport: &T,
        die: DieId,
        command: &Command,
    ) -> Result<usize, TransportError> {
        let packet = command.encode();
        debug!(die = %die, command = command.name(), data = ?packet, "TX packet");
        transport.write(die, &packet)
    }

    /// Send the configured init packet followed by the detection settings.
    pub fn initialize<T: DieTransport + ?Sized>(
        &self,
        transport: &T,
        die: DieId,
    ) -> Result<(), TransportError> {
        self.send(transport, die, &self.config.init_command())?;
        self.send(transport, die, &self.config.detection_command())?;
        Ok(())
    }
}
