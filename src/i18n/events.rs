//! Publish/subscribe channel for language change notifications.

use crate::i18n::Language;
use tokio::sync::broadcast;

/// Buffered notifications per subscriber before the slowest one starts lagging.
const CHANNEL_CAPACITY: usize = 16;

/// Emitted after a runtime language change completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageChanged {
    pub language: Language,
}

/// Fan-out publisher; every subscriber receives every notification.
#[derive(Debug, Clone)]
pub struct LanguageEvents {
    sender: broadcast::Sender<LanguageChanged>,
}

impl LanguageEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LanguageChanged> {
        self.sender.subscribe()
    }

    /// Returns the number of subscribers notified (zero is normal).
    pub fn publish(&self, language: Language) -> usize {
        self.sender
            .send(LanguageChanged { language })
            .unwrap_or_default()
    }
}

impl Default for LanguageEvents {
    fn default() -> Self {
        Self::new()
    }
}
