//! Subscriber interface of the display layer
//!
//! The readers own all state and push every change to a [`Listener`]. A
//! display layer renders what it receives and talks back only through the
//! readers' operations, so it never holds state of its own.

use super::{SyncMessage, UpdateMessage};

/// Receiver of reader events
///
/// Implementations might render to a terminal, forward over a WebSocket, or
/// record messages for tests.
pub trait Listener {
    /// Delivers an incremental change
    ///
    /// # Arguments
    ///
    /// * `message` - The change that just happened
    fn send_message(&self, message: &UpdateMessage);

    /// Delivers the complete current state
    ///
    /// Used for subscribers that attach late and have no earlier messages
    /// to build on.
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Records every message as JSON
    #[derive(Debug, Default)]
    pub(crate) struct RecordingListener {
        pub(crate) messages: RefCell<Vec<String>>,
    }

    impl RecordingListener {
        pub(crate) fn count_containing(&self, needle: &str) -> usize {
            self.messages
                .borrow()
                .iter()
                .filter(|message| message.contains(needle))
                .count()
        }
    }

    impl Listener for RecordingListener {
        fn send_message(&self, message: &UpdateMessage) {
            self.messages.borrow_mut().push(message.to_message());
        }

        fn send_state(&self, state: &SyncMessage) {
            self.messages.borrow_mut().push(state.to_message());
        }
    }

    #[test]
    fn test_recording_listener() {
        let listener = RecordingListener::default();
        listener.send_message(&crate::reader::tossup::UpdateMessage::QueueExhausted.into());
        assert_eq!(listener.count_containing("QueueExhausted"), 1);
        assert_eq!(listener.count_containing("Tossup"), 1);
    }
}
