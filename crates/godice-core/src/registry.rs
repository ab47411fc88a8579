//! Per-die session registry.
//!
//! Each connected die has a [`DieSession`] holding its shell and the last
//! state reported by the firmware. Sessions sit behind their own lock, so
//! packets for different dice never contend beyond the map lookup.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::events::{DieColor, DieEvent, DieId, StableKind};
use crate::shell::ShellType;

/// Last known state of one die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DieState {
    /// Face shown after the last settle. `None` until the first report.
    pub stable_value: Option<u8>,
    /// Classifier path of the last settle.
    pub stable_kind: Option<StableKind>,
    pub rolling: bool,
    pub charging: bool,
    /// `None` until a charge level response arrives.
    pub charge_level: Option<u8>,
    /// `None` until a color response arrives.
    pub color: Option<DieColor>,
}

impl DieState {
    /// Update the fields `event` concerns. Returns whether anything changed.
    pub fn apply(&mut self, event: &DieEvent) -> bool {
        let before = *self;
        match *event {
            DieEvent::Rolling => self.rolling = true,
            DieEvent::StableReported { value, kind } => {
                self.stable_value = Some(value);
                self.stable_kind = Some(kind);
                self.rolling = false;
            }
            DieEvent::ChargingStateChanged { charging } => self.charging = charging,
            DieEvent::ChargeLevelReported { level } => self.charge_level = Some(level),
            DieEvent::ColorReported { color } => self.color = Some(color),
            DieEvent::Tap | DieEvent::DoubleTap => {}
        }
        *self != before
    }
}

/// A die known to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DieSession {
    pub id: DieId,
    pub shell: ShellType,
    pub state: DieState,
}

impl DieSession {
    pub fn new(id: DieId, shell: ShellType) -> Self {
        Self {
            id,
            shell,
            state: DieState::default(),
        }
    }
}

/// Map of die identifier to session.
///
/// Entries are created on first access and live until [`forget`] is
/// called; the transport owns connection teardown.
///
/// [`forget`]: SessionRegistry::forget
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<DieId, Arc<Mutex<DieSession>>>>,
    default_shell: ShellType,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(ShellType::default())
    }
}

impl SessionRegistry {
    /// `default_shell` is used for dice first seen without a shell.
    pub fn new(default_shell: ShellType) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_shell,
        }
    }

    pub fn default_shell(&self) -> ShellType {
        self.default_shell
    }

    /// Session handle, created with `shell` (or the default shell) if absent.
    pub(crate) fn entry(&self, id: DieId, shell: Option<ShellType>) -> Arc<Mutex<DieSession>> {
        if let Some(entry) = self.sessions.read().get(&id) {
            return entry.clone();
        }
        self.sessions
            .write()
            .entry(id)
            .or_insert_with(|| {
                let shell = shell.unwrap_or(self.default_shell);
                debug!(die = %id, shell = %shell, "Session created");
                Arc::new(Mutex::new(DieSession::new(id, shell)))
            })
            .clone()
    }

    /// Register a die with its shell, or change the shell of a known die.
    /// Existing state is kept.
    pub fn open(&self, id: DieId, shell: ShellType) -> DieSession {
        let entry = self.entry(id, Some(shell));
        let mut session = entry.lock();
        if session.shell != shell {
            debug!(die = %id, from = %session.shell, to = %shell, "Shell changed");
            session.shell = shell;
        }
        session.clone()
    }

    /// Current state of `id`, creating an empty session on first access.
    pub fn get(&self, id: DieId) -> DieState {
        self.entry(id, None).lock().state
    }

    /// Snapshot of the session, without creating one.
    pub fn session(&self, id: DieId) -> Option<DieSession> {
        self.sessions.read().get(&id).map(|entry| entry.lock().clone())
    }

    /// Shell of `id`, or the default shell if the die is unknown.
    pub fn shell(&self, id: DieId) -> ShellType {
        self.sessions
            .read()
            .get(&id)
            .map(|entry| entry.lock().shell)
            .unwrap_or(self.default_shell)
    }

    /// Apply `event` to the state of `id`. Returns whether the state changed.
    pub fn apply(&self, id: DieId, event: &DieEvent) -> bool {
        let entry = self.entry(id, None);
        let changed = entry.lock().state.apply(event);
        if changed {
            debug!(die = %id, event = %event, "State updated");
        }
        changed
    }

    /// Drop the session for `id`. Forgetting an unknown die is a no-op.
    pub fn forget(&self, id: DieId) -> bool {
        let removed = self.sessions.write().remove(&id).is_some();
        if removed {
            debug!(die = %id, "Session forgotten");
        }
        removed
    }

    pub fn contains(&self, id: DieId) -> bool {
        self.sessions.read().contains_key(&id)
    }

    /// Known die identifiers, sorted.
    pub fn ids(&self) -> Vec<DieId> {
        let mut ids: Vec<DieId> = self.sessions.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_get_creates_empty_state() {
        let registry = SessionRegistry::default();
        assert!(!registry.contains(DieId(1)));

        let state = registry.get(DieId(1));
        assert_eq!(state, DieState::default());
        assert!(registry.contains(DieId(1)));
        assert_eq!(registry.shell(DieId(1)), ShellType::D6);
    }

    #[test]
    fn test_stable_clears_rolling() {
        let registry = SessionRegistry::default();
        let id = DieId(3);
        registry.apply(id, &DieEvent::Rolling);
        assert!(registry.get(id).rolling);

        registry.apply(
            id,
            &DieEvent::StableReported {
                value: 4,
                kind: StableKind::Stable,
            },
        );
        let state = registry.get(id);
        assert_eq!(state.stable_value, Some(4));
        assert_eq!(state.stable_kind, Some(StableKind::Stable));
        assert!(!state.rolling);
    }

    #[test]
    fn test_apply_touches_only_its_field() {
        let mut state = DieState {
            stable_value: Some(2),
            charge_level: Some(10),
            ..Default::default()
        };
        assert!(state.apply(&DieEvent::ColorReported {
            color: DieColor::Red
        }));
        assert_eq!(state.color, Some(DieColor::Red));
        assert_eq!(state.stable_value, Some(2));
        assert_eq!(state.charge_level, Some(10));

        assert!(state.apply(&DieEvent::ChargingStateChanged { charging: true }));
        assert!(state.charging);
        assert!(!state.apply(&DieEvent::Tap));
        assert!(!state.apply(&DieEvent::ChargingStateChanged { charging: true }));
    }

    #[test]
    fn test_open_sets_and_changes_shell() {
        let registry = SessionRegistry::default();
        let id = DieId(9);
        registry.apply(id, &DieEvent::ChargeLevelReported { level: 40 });

        let session = registry.open(id, ShellType::D20);
        assert_eq!(session.shell, ShellType::D20);
        assert_eq!(session.state.charge_level, Some(40));
        assert_eq!(registry.shell(id), ShellType::D20);
    }

    #[test]
    fn test_forget_is_idempotent() {
        let registry = SessionRegistry::default();
        let id = DieId(5);
        registry.open(id, ShellType::D8);
        assert!(registry.forget(id));
        assert!(!registry.forget(id));
        assert!(registry.session(id).is_none());
        // Recreated fresh on next access.
        assert_eq!(registry.get(id), DieState::default());
        assert_eq!(registry.shell(id), ShellType::D6);
    }

    #[test]
    fn test_ids_sorted() {
        let registry = SessionRegistry::new(ShellType::D20);
        for id in [4, 1, 3] {
            registry.get(DieId(id));
        }
        assert_eq!(registry.ids(), vec![DieId(1), DieId(3), DieId(4)]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.shell(DieId(4)), ShellType::D20);
    }

    #[test]
    fn test_parallel_dice() {
        let registry = Arc::new(SessionRegistry::default());
        let handles: Vec<_> = (0..8u32)
            .map(|n| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for level in 0..=100u8 {
                        registry.apply(DieId(n), &DieEvent::ChargeLevelReported { level });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 8);
        for n in 0..8u32 {
            assert_eq!(registry.get(DieId(n)).charge_level, Some(100));
        }
    }
}
