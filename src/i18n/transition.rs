//! Visual pacing around language swaps and page reveal.

use crate::dom::{Document, SharedDocument, LOADED_CLASS};
use crate::i18n::Language;
use crate::preferences::{PreferenceStore, LANGUAGE_KEY};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Root class hiding the page until a non-default language is painted.
pub const INITIAL_LOADING_CLASS: &str = "initial-loading";

/// Phase of the i18n state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Applying,
}

/// Begin the fade-out by hiding the body.
pub fn fade_out<D: Document + ?Sized>(document: &mut D) {
    let body = document.body();
    document.remove_class(body, LOADED_CLASS);
}

/// Reveal the body.
pub fn fade_in<D: Document + ?Sized>(document: &mut D) {
    let body = document.body();
    document.add_class(body, LOADED_CLASS);
}

/// Wait out the fade-out transition so the swap is never visible mid-fade.
pub async fn settle(fade_duration: Duration) {
    sleep(fade_duration).await;
}

/// Forces the page visible after a bounded wait, whatever loading is doing.
///
/// Aborted when disarmed or dropped.
#[derive(Debug)]
pub struct SafetyTimer {
    handle: JoinHandle<()>,
}

impl SafetyTimer {
    pub fn arm<D: Document + 'static>(document: SharedDocument<D>, after: Duration) -> Self {
        let handle = tokio::spawn(async move {
            sleep(after).await;
            let mut doc = document.lock().await;
            let body = doc.body();
            if !doc.has_class(body, LOADED_CLASS) {
                warn!("Page not ready after {:?}, forcing it visible", after);
                doc.add_class(body, LOADED_CLASS);
            }
        });
        Self { handle }
    }

    pub fn disarm(self) {
        self.handle.abort();
    }
}

impl Drop for SafetyTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Hold the first paint when a stored non-default preference exists.
///
/// Adds [`INITIAL_LOADING_CLASS`] to the root and removes it after `hold`.
/// Storage failures are ignored so the page always renders.
pub async fn hold_initial_paint<D: Document + 'static>(
    document: SharedDocument<D>,
    preferences: &dyn PreferenceStore,
    hold: Duration,
) -> Option<JoinHandle<()>> {
    let stored = preferences.get(LANGUAGE_KEY).ok().flatten()?;
    if stored == Language::default_language().code() {
        return None;
    }

    {
        let mut doc = document.lock().await;
        let root = doc.root();
        doc.add_class(root, INITIAL_LOADING_CLASS);
    }
    debug!("Holding first paint for stored preference {}", stored);

    Some(tokio::spawn(async move {
        sleep(hold).await;
        let mut doc = document.lock().await;
        let root = doc.root();
        doc.remove_class(root, INITIAL_LOADING_CLASS);
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StaticPage;
    use crate::preferences::MemoryPreferences;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn shared() -> SharedDocument<StaticPage> {
        Arc::new(Mutex::new(StaticPage::new()))
    }

    async fn is_loaded(doc: &SharedDocument<StaticPage>) -> bool {
        let page = doc.lock().await;
        page.has_class(page.body(), LOADED_CLASS)
    }

    #[test]
    fn test_fade_out_then_in() {
        let mut page = StaticPage::new();
        fade_in(&mut page);
        assert!(page.has_class(page.body(), LOADED_CLASS));
        fade_out(&mut page);
        assert!(!page.has_class(page.body(), LOADED_CLASS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_safety_timer_forces_visible() {
        let doc = shared();
        let _timer = SafetyTimer::arm(doc.clone(), Duration::from_millis(1000));

        sleep(Duration::from_millis(999)).await;
        assert!(!is_loaded(&doc).await);
        sleep(Duration::from_millis(2)).await;
        assert!(is_loaded(&doc).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_safety_timer_does_nothing() {
        let doc = shared();
        SafetyTimer::arm(doc.clone(), Duration::from_millis(1000)).disarm();

        sleep(Duration::from_millis(2000)).await;
        assert!(!is_loaded(&doc).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_initial_paint_for_non_default() {
        let doc = shared();
        let prefs = MemoryPreferences::with_value(LANGUAGE_KEY, "uk");

        let handle = hold_initial_paint(doc.clone(), &prefs, Duration::from_millis(1500))
            .await
            .expect("hold should start");
        {
            let page = doc.lock().await;
            assert!(page.has_class(page.root(), INITIAL_LOADING_CLASS));
        }

        handle.await.unwrap();
        let page = doc.lock().await;
        assert!(!page.has_class(page.root(), INITIAL_LOADING_CLASS));
    }

    #[tokio::test]
    async fn test_no_hold_for_default_or_missing() {
        let doc = shared();
        let english = MemoryPreferences::with_value(LANGUAGE_KEY, "en");
        let empty = MemoryPreferences::new();

        assert!(hold_initial_paint(doc.clone(), &english, Duration::ZERO)
            .await
            .is_none());
        assert!(hold_initial_paint(doc.clone(), &empty, Duration::ZERO)
            .await
            .is_none());
    }
}
