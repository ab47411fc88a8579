//! Mock transport for testing.

use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;

use super::traits::{DieTransport, TransportError};
use crate::events::DieId;

/// Mock transport that records writes and replays queued notifications.
#[derive(Default)]
pub struct MockTransport {
    /// Captured writes, in order.
    write_log: Mutex<Vec<(DieId, Vec<u8>)>>,
    /// Notifications waiting to be delivered.
    notify_queue: Mutex<VecDeque<(DieId, Vec<u8>)>>,
    /// Dice simulated as disconnected.
    disconnected: Mutex<HashSet<DieId>>,
    /// Reason for the next write to fail, if armed.
    fail_next: Mutex<Option<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notification as if `die` had sent it.
    pub fn queue_notification(&self, die: DieId, packet: &[u8]) {
        self.notify_queue.lock().push_back((die, packet.to_vec()));
    }

    /// Pop the next queued notification.
    pub fn next_notification(&self) -> Option<(DieId, Vec<u8>)> {
        self.notify_queue.lock().pop_front()
    }

    /// All captured writes.
    pub fn get_writes(&self) -> Vec<(DieId, Vec<u8>)> {
        self.write_log.lock().clone()
    }

    /// Captured writes to one die.
    pub fn writes_to(&self, die: DieId) -> Vec<Vec<u8>> {
        self.write_log
            .lock()
            .iter()
            .filter(|(id, _)| *id == die)
            .map(|(_, packet)| packet.clone())
            .collect()
    }

    pub fn clear_writes(&self) {
        self.write_log.lock().clear();
    }

    /// Simulate `die` dropping its connection.
    pub fn disconnect(&self, die: DieId) {
        self.disconnected.lock().insert(die);
    }

    pub fn reconnect(&self, die: DieId) {
        self.disconnected.lock().remove(&die);
    }

    /// Make the next write fail with `reason`. Nothing is logged for it.
    pub fn fail_next_write(&self, reason: &str) {
        *self.fail_next.lock() = Some(reason.to_string());
    }
}

impl DieTransport for MockTransport {
    fn write(&self, die: DieId, packet: &[u8]) -> Result<usize, TransportError> {
        if !self.is_connected(die) {
            return Err(TransportError::NotConnected(die));
        }
        if let Some(reason) = self.fail_next.lock().take() {
            return Err(TransportError::WriteFailed(reason));
        }
        self.write_log.lock().push((die, packet.to_vec()));
        Ok(packet.len())
    }

    fn is_connected(&self, die: DieId) -> bool {
        !self.disconnected.lock().contains(&die)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_write_capture() {
        let mock = MockTransport::new();
        mock.write(DieId(1), &[0x17]).unwrap();
        mock.write(DieId(2), &[0x03]).unwrap();
        mock.write(DieId(1), &[0x14]).unwrap();

        assert_eq!(mock.get_writes().len(), 3);
        assert_eq!(mock.writes_to(DieId(1)), vec![vec![0x17], vec![0x14]]);

        mock.clear_writes();
        assert!(mock.get_writes().is_empty());
    }

    #[test]
    fn test_mock_notification_queue() {
        let mock = MockTransport::new();
        mock.queue_notification(DieId(1), b"R");
        mock.queue_notification(DieId(2), b"Bat\x32");

        assert_eq!(mock.next_notification(), Some((DieId(1), b"R".to_vec())));
        assert_eq!(mock.next_notification(), Some((DieId(2), b"Bat\x32".to_vec())));
        assert!(mock.next_notification().is_none());
    }

    #[test]
    fn test_mock_disconnect() {
        let mock = MockTransport::new();
        assert!(mock.is_connected(DieId(4)));

        mock.disconnect(DieId(4));
        assert!(!mock.is_connected(DieId(4)));
        assert!(matches!(
            mock.write(DieId(4), &[0x17]),
            Err(TransportError::NotConnected(DieId(4)))
        ));
        assert!(mock.write(DieId(5), &[0x17]).is_ok());

        mock.reconnect(DieId(4));
        assert!(mock.write(DieId(4), &[0x17]).is_ok());
    }

    #[test]
    fn test_mock_write_failure() {
        let mock = MockTransport::new();
        mock.fail_next_write("att error 0x0e");

        match mock.write(DieId(1), &[0x17]) {
            Err(TransportError::WriteFailed(reason)) => assert_eq!(reason, "att error 0x0e"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(mock.get_writes().is_empty());

        assert_eq!(mock.write(DieId(1), &[0x17]).unwrap(), 1);
        assert_eq!(mock.writes_to(DieId(1)), vec![vec![0x17]]);
    }
}
