//! The i18n façade: page-load initialization and runtime language changes.
//!
//! `I18n` is the explicit context object other page code depends on. It owns
//! the active language, the resident translation table, the switcher
//! subscriptions and the change notification channel.
//!
//! State machine: `Idle -> Loading -> Applying -> Idle`, observable through
//! [`I18n::phase`]. Runtime changes are serialized: a request waits for the
//! one in flight, and a request for the then-active language is a no-op.

use crate::config::Config;
use crate::dom::{Document, SharedDocument};
use crate::i18n::applicator::apply;
use crate::i18n::resolver::{resolve, ResolverInputs};
use crate::i18n::store::{LocaleFetcher, TranslationStore};
use crate::i18n::switcher::SwitcherSync;
use crate::i18n::transition::{
    fade_in, fade_out, hold_initial_paint, settle, Phase, SafetyTimer,
};
use crate::i18n::{I18nError, I18nMetrics, Language, LanguageChanged, LanguageEvents};
use crate::preferences::{PreferenceStore, LANGUAGE_KEY};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Request parameter carrying an explicit language (marketing links).
pub const LANG_PARAM: &str = "lang";

/// Attribute on the root element declaring the page language.
pub const LANG_ATTR: &str = "lang";

/// Timing knobs for the façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I18nOptions {
    /// Matches the CSS fade-out duration.
    pub fade_duration: Duration,
    pub safety_timeout: Duration,
    pub initial_loading_hold: Duration,
}

impl Default for I18nOptions {
    fn default() -> Self {
        Self {
            fade_duration: Duration::from_millis(250),
            safety_timeout: Duration::from_millis(1000),
            initial_loading_hold: Duration::from_millis(1500),
        }
    }
}

impl From<&Config> for I18nOptions {
    fn from(config: &Config) -> Self {
        Self {
            fade_duration: config.fade_duration,
            safety_timeout: config.safety_timeout,
            initial_loading_hold: config.initial_loading_hold,
        }
    }
}

/// Result of [`I18n::change_language`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Requested language was already active.
    Unchanged,
    Changed(Language),
    /// Requested language failed to load; the default is displayed instead.
    FellBack {
        requested: Language,
        language: Language,
    },
}

struct State<F> {
    store: TranslationStore<F>,
    switchers: SwitcherSync,
    initialized: bool,
}

pub struct I18n<D, F> {
    document: SharedDocument<D>,
    preferences: Arc<dyn PreferenceStore>,
    options: I18nOptions,
    state: Mutex<State<F>>,
    active: watch::Sender<Language>,
    phase: watch::Sender<Phase>,
    events: LanguageEvents,
    metrics: Arc<I18nMetrics>,
    requests_tx: mpsc::UnboundedSender<String>,
    requests_rx: StdMutex<Option<mpsc::UnboundedReceiver<String>>>,
    shutdown: watch::Sender<bool>,
}

impl<D, F> I18n<D, F>
where
    D: Document + 'static,
    F: LocaleFetcher + 'static,
{
    pub fn new(
        document: SharedDocument<D>,
        fetcher: F,
        preferences: Arc<dyn PreferenceStore>,
        options: I18nOptions,
    ) -> Self {
        let metrics = Arc::new(I18nMetrics::new());
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (active, _) = watch::channel(Language::default_language());
        let (phase, _) = watch::channel(Phase::Idle);
        let (shutdown, _) = watch::channel(false);

        Self {
            document,
            preferences,
            options,
            state: Mutex::new(State {
                store: TranslationStore::new(fetcher, metrics.clone()),
                switchers: SwitcherSync::new(),
                initialized: false,
            }),
            active,
            phase,
            events: LanguageEvents::new(),
            metrics,
            requests_tx,
            requests_rx: StdMutex::new(Some(requests_rx)),
            shutdown,
        }
    }

    pub fn active_language(&self) -> Language {
        *self.active.borrow()
    }

    /// Watch the active language; resolves on every completed change.
    pub fn watch_active(&self) -> watch::Receiver<Language> {
        self.active.subscribe()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LanguageChanged> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &LanguageEvents {
        &self.events
    }

    pub fn metrics(&self) -> &I18nMetrics {
        &self.metrics
    }

    pub fn document(&self) -> &SharedDocument<D> {
        &self.document
    }

    /// Hide the first paint while a stored non-default language loads.
    pub async fn pre_paint(&self) -> Option<JoinHandle<()>> {
        hold_initial_paint(
            self.document.clone(),
            self.preferences.as_ref(),
            self.options.initial_loading_hold,
        )
        .await
    }

    /// Page-load initialization. Runs once; later calls return the active
    /// language without doing anything.
    ///
    /// The page is made visible even when loading fails. An error is
    /// returned only when the default language itself could not be loaded.
    pub async fn init(&self) -> Result<Language, I18nError> {
        let mut state = self.state.lock().await;
        if state.initialized {
            return Ok(self.active_language());
        }
        state.initialized = true;

        let timer = SafetyTimer::arm(self.document.clone(), self.options.safety_timeout);
        self.phase.send_replace(Phase::Loading);

        let inputs = {
            let doc = self.document.lock().await;
            ResolverInputs {
                request_param: doc.request_param(LANG_PARAM),
                stored_preference: self.stored_preference(),
                client_locale: doc.client_locale(),
            }
        };
        let requested = resolve(&inputs);
        info!("Initializing localization with {}", requested);

        let outcome = state.store.load(requested).await;
        let language = match &outcome {
            Ok(loaded) => loaded.language,
            Err(_) => Language::default_language(),
        };

        self.phase.send_replace(Phase::Applying);
        {
            let mut doc = self.document.lock().await;
            let report = apply(&mut *doc, state.store.table());
            info!("Applied {} translations", report.applied);
            state.switchers.sync(&mut *doc, language);
            state.switchers.bind(&mut *doc, &self.requests_tx);
            let root = doc.root();
            doc.set_attribute(root, LANG_ATTR, language.code());
            fade_in(&mut *doc);
        }
        self.active.send_replace(language);

        if matches!(&outcome, Ok(loaded) if !loaded.fell_back) {
            self.persist(language);
        }

        timer.disarm();
        self.phase.send_replace(Phase::Idle);
        outcome.map(|loaded| loaded.language)
    }

    /// Switch the page to `code` without a reload.
    ///
    /// Steps run strictly in order: blur, fade out, settle, load, apply,
    /// sync, bind, persist, declare `lang`, fade in, notify.
    pub async fn change_language(&self, code: &str) -> Result<ChangeOutcome, I18nError> {
        let requested = Language::from_code(code)?;

        let mut state = self.state.lock().await;
        let previous = self.active_language();
        if requested == previous {
            return Ok(ChangeOutcome::Unchanged);
        }

        {
            let mut doc = self.document.lock().await;
            doc.blur_active();
            fade_out(&mut *doc);
        }
        settle(self.options.fade_duration).await;

        self.phase.send_replace(Phase::Loading);
        let outcome = state.store.load(requested).await;
        self.phase.send_replace(Phase::Applying);

        let result = match outcome {
            Ok(loaded) => {
                {
                    let mut doc = self.document.lock().await;
                    apply(&mut *doc, state.store.table());
                    state.switchers.sync(&mut *doc, loaded.language);
                    state.switchers.bind(&mut *doc, &self.requests_tx);
                }
                self.active.send_replace(loaded.language);

                let mut doc = self.document.lock().await;
                if !loaded.fell_back {
                    self.persist(loaded.language);
                }
                let root = doc.root();
                doc.set_attribute(root, LANG_ATTR, loaded.language.code());
                fade_in(&mut *doc);

                Ok(if loaded.fell_back {
                    ChangeOutcome::FellBack {
                        requested,
                        language: loaded.language,
                    }
                } else {
                    ChangeOutcome::Changed(loaded.language)
                })
            }
            Err(e) => {
                error!("Language change to {} failed: {}", requested, e);
                let mut doc = self.document.lock().await;
                // Controls must not claim a language that is not displayed
                state.switchers.sync(&mut *doc, previous);
                fade_in(&mut *doc);
                Err(e)
            }
        };
        self.phase.send_replace(Phase::Idle);

        let current = self.active_language();
        if current != previous {
            self.metrics.record_language_change();
            info!("Language changed from {} to {}", previous, current);
            self.events.publish(current);
        }
        result
    }

    /// Drain switcher selections, applying each in turn.
    ///
    /// Returns immediately if another task already consumes the queue, and
    /// after [`Self::teardown`]. A selection being applied when teardown
    /// happens is finished first.
    pub async fn run_switcher_events(&self) {
        let receiver = self.requests_rx.lock().ok().and_then(|mut slot| slot.take());
        let Some(mut receiver) = receiver else {
            warn!("Switcher events are already being handled");
            return;
        };
        let mut shutdown = self.shutdown.subscribe();
        let stopped = async move {
            let _ = shutdown.wait_for(|stopped| *stopped).await;
        };
        tokio::pin!(stopped);

        loop {
            let code = tokio::select! {
                _ = &mut stopped => break,
                code = receiver.recv() => match code {
                    Some(code) => code,
                    None => break,
                },
            };
            if let Err(e) = self.change_language(&code).await {
                warn!("Ignoring language selection '{}': {}", code, e);
            }
        }
        info!("Switcher event worker stopped");
    }

    /// Spawn [`Self::run_switcher_events`] on the runtime.
    pub fn spawn_switcher_events(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_switcher_events().await })
    }

    /// Remove the switcher subscriptions and stop the switcher event worker.
    pub async fn teardown(&self) {
        let mut state = self.state.lock().await;
        let mut doc = self.document.lock().await;
        state.switchers.unbind(&mut *doc);
        self.shutdown.send_replace(true);
    }

    fn stored_preference(&self) -> Option<String> {
        match self.preferences.get(LANGUAGE_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!("Could not read language preference: {}", e);
                None
            }
        }
    }

    fn persist(&self, language: Language) {
        if let Err(e) = self.preferences.set(LANGUAGE_KEY, language.code()) {
            warn!("Could not persist language preference: {}", e);
        }
    }
}
