//! Typewriter animation for the home page hero heading.
//!
//! The translated heading lives in a hidden source element; the animator
//! types it into the visible element on load and again after every language
//! change.

use crate::config::Config;
use crate::dom::{Document, SharedDocument};
use crate::i18n::LanguageChanged;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::sleep;
use tracing::debug;

pub const DISPLAY_ID: &str = "hero-title-display";
pub const SOURCE_ID: &str = "hero-title-source";

/// Keeps the heading's height while it is empty.
pub const BLANK: &str = "&nbsp;";

/// Progressive renderings of `html`, one per visible character.
///
/// Markup tags never appear half-typed: a tag is emitted together with the
/// character that closes it.
pub fn typewriter_frames(html: &str) -> Vec<String> {
    let mut frames = Vec::new();
    let mut current = String::with_capacity(html.len());
    let mut in_tag = false;

    for ch in html.chars() {
        if ch == '<' {
            in_tag = true;
        }
        current.push(ch);
        if ch == '>' {
            in_tag = false;
        }
        if !in_tag {
            frames.push(current.clone());
        }
    }
    frames
}

#[derive(Debug, Clone, Copy)]
pub struct HeroAnimator {
    pub typing_speed: Duration,
    pub initial_delay: Duration,
    /// Gives the i18n pass time to refresh the source element.
    pub retype_delay: Duration,
}

impl HeroAnimator {
    pub fn new(typing_speed: Duration) -> Self {
        Self {
            typing_speed,
            initial_delay: Duration::from_millis(500),
            retype_delay: Duration::from_millis(100),
        }
    }

    /// Time from start until `html` is fully typed on first load.
    pub fn first_render_time(&self, html: &str) -> Duration {
        let frames = u32::try_from(typewriter_frames(html).len()).unwrap_or(u32::MAX);
        self.initial_delay + self.typing_speed.saturating_mul(frames)
    }

    /// Animate once after load, then after every language change.
    ///
    /// A change arriving mid-animation restarts it with the new text.
    /// Returns when the notification channel closes.
    pub async fn run<D: Document>(
        self,
        document: SharedDocument<D>,
        mut changes: broadcast::Receiver<LanguageChanged>,
    ) {
        let mut pending = Some(self.initial_delay);

        loop {
            let event = match pending.take() {
                Some(delay) => {
                    tokio::select! {
                        _ = self.animate_after(&document, delay) => continue,
                        event = changes.recv() => event,
                    }
                }
                None => changes.recv().await,
            };

            match event {
                Ok(_) | Err(RecvError::Lagged(_)) => {
                    let mut doc = document.lock().await;
                    if let Some(display) = doc.element_by_id(DISPLAY_ID) {
                        doc.set_inner_html(display, BLANK);
                    }
                    pending = Some(self.retype_delay);
                }
                Err(RecvError::Closed) => return,
            }
        }
    }

    async fn animate_after<D: Document>(&self, document: &SharedDocument<D>, delay: Duration) {
        sleep(delay).await;

        let (display, text) = {
            let mut doc = document.lock().await;
            let (Some(display), Some(source)) =
                (doc.element_by_id(DISPLAY_ID), doc.element_by_id(SOURCE_ID))
            else {
                return;
            };
            let text = doc.inner_html(source).unwrap_or_default();
            if text.is_empty() {
                return;
            }
            doc.set_inner_html(display, BLANK);
            (display, text)
        };
        debug!("Typing hero heading ({} chars)", text.chars().count());

        for frame in typewriter_frames(&text) {
            document.lock().await.set_inner_html(display, &frame);
            sleep(self.typing_speed).await;
        }
    }
}

impl From<&Config> for HeroAnimator {
    fn from(config: &Config) -> Self {
        Self::new(config.hero_typing_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementKind, StaticPage};
    use crate::i18n::{Language, LanguageEvents};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn hero_page(source: &str) -> (SharedDocument<StaticPage>, crate::dom::NodeId, crate::dom::NodeId) {
        let mut page = StaticPage::new();
        let display = page.insert(ElementKind::Container("h1".into()), Some(DISPLAY_ID));
        let src = page.insert(ElementKind::Container("span".into()), Some(SOURCE_ID));
        page.set_inner_html(src, source);
        (Arc::new(Mutex::new(page)), display, src)
    }

    #[test]
    fn test_frames_plain_text() {
        assert_eq!(typewriter_frames("Hi!"), vec!["H", "Hi", "Hi!"]);
    }

    #[test]
    fn test_frames_keep_tags_whole() {
        let frames = typewriter_frames("a<br>b");
        assert_eq!(frames, vec!["a", "a<br>", "a<br>b"]);
        assert!(frames.iter().all(|f| f.matches('<').count() == f.matches('>').count()));
    }

    #[test]
    fn test_first_render_time_counts_visible_frames() {
        let animator = HeroAnimator::new(Duration::from_millis(10));
        assert_eq!(
            animator.first_render_time("a<br>b"),
            Duration::from_millis(500 + 30)
        );
    }

    #[test]
    fn test_frames_empty() {
        assert!(typewriter_frames("").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_animation_types_source() {
        let (doc, display, _) = hero_page("Hey");
        let events = LanguageEvents::new();
        let animator = HeroAnimator::new(Duration::from_millis(10));
        let task = tokio::spawn(animator.run(doc.clone(), events.subscribe()));

        sleep(Duration::from_millis(505)).await;
        assert_eq!(doc.lock().await.inner_html(display).as_deref(), Some("H"));

        sleep(Duration::from_millis(100)).await;
        assert_eq!(doc.lock().await.inner_html(display).as_deref(), Some("Hey"));

        drop(events);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_language_change_restarts_with_new_text() {
        let (doc, display, source) = hero_page("Hello world");
        let events = LanguageEvents::new();
        let animator = HeroAnimator::new(Duration::from_millis(50));
        let task = tokio::spawn(animator.run(doc.clone(), events.subscribe()));

        // Mid-animation
        sleep(Duration::from_millis(600)).await;
        doc.lock().await.set_inner_html(source, "Привіт");
        events.publish(Language::from_code("uk").unwrap());
        tokio::task::yield_now().await;
        assert_eq!(doc.lock().await.inner_html(display).as_deref(), Some(BLANK));

        sleep(Duration::from_millis(2000)).await;
        assert_eq!(doc.lock().await.inner_html(display).as_deref(), Some("Привіт"));

        drop(events);
        task.await.unwrap();
    }
}
