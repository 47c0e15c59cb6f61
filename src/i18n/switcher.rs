//! Keeps the language selection controls in step with the active language.

use crate::dom::{Document, ListenerId};
use crate::i18n::Language;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Element ids of the desktop and mobile selection controls.
pub const SWITCHER_IDS: [&str; 2] = ["language-switcher", "language-switcher-mobile"];

/// Owns the change subscriptions registered on the switchers.
#[derive(Debug, Default)]
pub struct SwitcherSync {
    subscriptions: Vec<ListenerId>,
}

impl SwitcherSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set every present control to `active`.
    pub fn sync<D: Document + ?Sized>(&self, document: &mut D, active: Language) {
        for id in SWITCHER_IDS {
            if let Some(node) = document.element_by_id(id) {
                document.set_value(node, active.code());
            }
        }
    }

    /// Subscribe every present control, forwarding selections to `requests`.
    ///
    /// Previous subscriptions are removed first, so repeated calls never stack
    /// handlers. Returns the number of controls bound.
    pub fn bind<D: Document + ?Sized>(
        &mut self,
        document: &mut D,
        requests: &mpsc::UnboundedSender<String>,
    ) -> usize {
        self.unbind(document);

        for id in SWITCHER_IDS {
            let Some(node) = document.element_by_id(id) else {
                continue;
            };
            let tx = requests.clone();
            let subscription = document.add_change_listener(
                node,
                Arc::new(move |value: &str| {
                    // Receiver gone means the controller was dropped
                    let _ = tx.send(value.to_string());
                }),
            );
            self.subscriptions.push(subscription);
        }

        debug!("Bound {} language switchers", self.subscriptions.len());
        self.subscriptions.len()
    }

    /// Remove every subscription this synchronizer registered.
    pub fn unbind<D: Document + ?Sized>(&mut self, document: &mut D) {
        for subscription in self.subscriptions.drain(..) {
            document.remove_listener(subscription);
        }
    }

    pub fn bound(&self) -> usize {
        self.subscriptions.len()
    }
}
