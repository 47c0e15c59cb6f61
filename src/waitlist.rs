//! Waitlist lead capture.
//!
//! Submissions go to a third-party document store that only accepts writes
//! once authentication has completed. The store and the sign-in flow are
//! external; this module owns validation and the write contract.

use regex::Regex;
use serde::Serialize;
use std::future::Future;
use std::sync::OnceLock;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info};

pub const WAITLIST_COLLECTION: &str = "waitlist";
pub const SUBMISSION_SOURCE: &str = "landing-page";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Email is required.")]
    EmailRequired,

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("authentication never completed")]
    AuthUnavailable,

    #[error("document store rejected the submission: {0}")]
    Store(String),
}

/// Document database client.
pub trait DocumentStore: Send + Sync {
    /// Create a document in `collection`. The store stamps `createdAt` with
    /// its own clock. Returns the new document id.
    fn create_document(
        &self,
        collection: &str,
        document: serde_json::Value,
    ) -> impl Future<Output = Result<String, SubmitError>> + Send;
}

/// Signals that sign-in (anonymous or token based) has completed.
#[derive(Debug)]
pub struct AuthGate {
    sender: watch::Sender<bool>,
}

/// Awaitable side of [`AuthGate`]; cheap to clone.
#[derive(Debug, Clone)]
pub struct AuthReady {
    receiver: watch::Receiver<bool>,
}

impl AuthGate {
    pub fn new() -> (Self, AuthReady) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, AuthReady { receiver })
    }

    /// Resolve every waiter. Later calls are no-ops.
    pub fn mark_ready(&self) {
        self.sender.send_if_modified(|ready| !std::mem::replace(ready, true));
    }
}

impl AuthReady {
    pub fn is_ready(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait for sign-in. Fails if the gate is dropped before it opens.
    pub async fn wait(&mut self) -> Result<(), SubmitError> {
        self.receiver
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| SubmitError::AuthUnavailable)
    }
}

/// Raw form values.
#[derive(Debug, Clone, Default)]
pub struct WaitlistForm {
    pub email: String,
    pub name: String,
    pub comment: String,
    /// Hidden field that only bots fill in.
    pub honeypot: String,
    pub user_agent: String,
}

/// Document written to the waitlist collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub email: String,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub source: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Stored { id: String },
    /// Honeypot tripped: report success, write nothing.
    Discarded,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
        .is_match(email)
}

impl WaitlistForm {
    /// Validate and normalize the form into an entry.
    pub fn to_entry(&self) -> Result<WaitlistEntry, SubmitError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(SubmitError::EmailRequired);
        }
        if !is_valid_email(email) {
            return Err(SubmitError::InvalidEmail);
        }

        let optional = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        Ok(WaitlistEntry {
            email: email.to_string(),
            name: optional(&self.name),
            comment: optional(&self.comment),
            source: SUBMISSION_SOURCE.to_string(),
            user_agent: self.user_agent.clone(),
        })
    }
}

pub struct Waitlist<S> {
    store: S,
    auth: AuthReady,
}

impl<S: DocumentStore> Waitlist<S> {
    pub fn new(store: S, auth: AuthReady) -> Self {
        Self { store, auth }
    }

    pub async fn submit(&self, form: &WaitlistForm) -> Result<SubmitOutcome, SubmitError> {
        if !form.honeypot.is_empty() {
            return Ok(SubmitOutcome::Discarded);
        }
        let entry = form.to_entry()?;

        self.auth.clone().wait().await?;

        let document = serde_json::to_value(&entry)
            .map_err(|e| SubmitError::Store(format!("could not encode entry: {}", e)))?;
        match self.store.create_document(WAITLIST_COLLECTION, document).await {
            Ok(id) => {
                info!("Waitlist entry stored ({})", id);
                Ok(SubmitOutcome::Stored { id })
            }
            Err(e) => {
                error!("Error adding to waitlist: {}", e);
                Err(e)
            }
        }
    }
}
