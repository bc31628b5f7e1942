//! Per-sender conversation session flags.

use courier_channels::SenderId;
use dashmap::DashMap;

/// Process-lifetime map of sender -> "session active". Absence means
/// inactive; entries are never deleted, which is acceptable at one bit per
/// sender. Set to false on an explicit exit phrase, true after a successful
/// reply is sent.
#[derive(Default)]
pub struct ConversationStore {
    active: DashMap<SenderId, bool>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sender_id: &SenderId) -> bool {
        self.active
            .get(sender_id)
            .map(|entry| *entry.value())
            .unwrap_or(false)
    }

    pub fn set(&self, sender_id: &SenderId, active: bool) {
        self.active.insert(sender_id.clone(), active);
    }
}

#[cfg(test)]
mod tests {
    use super::ConversationStore;
    use courier_channels::SenderId;

    #[test]
    fn unknown_senders_default_to_inactive() {
        let store = ConversationStore::new();
        assert!(!store.get(&SenderId::from("nobody@s.whatsapp.net")));
    }

    #[test]
    fn set_overwrites_and_is_isolated_per_sender() {
        let store = ConversationStore::new();
        let a = SenderId::from("a@s.whatsapp.net");
        let b = SenderId::from("b@s.whatsapp.net");

        store.set(&a, true);
        assert!(store.get(&a));
        assert!(!store.get(&b));

        store.set(&a, false);
        assert!(!store.get(&a));
    }
}
