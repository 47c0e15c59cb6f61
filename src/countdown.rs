//! Countdowns for the maintenance and 404 pages.

use crate::config::Config;
use crate::dom::{Document, SharedDocument};
use chrono::{DateTime, FixedOffset, Utc};
use std::time::Duration;
use tokio::time::{interval, sleep};
use tracing::info;

pub const TIMER_ID: &str = "timer";
pub const REDIRECT_COUNTDOWN_ID: &str = "redirect-countdown";

pub const FINISHED_MESSAGE: &str = "We should be back now. Please refresh the page!";

const RUNNING_CLASSES: [&str; 3] = ["text-3xl", "font-bold", "text-teal-600"];
const FINISHED_CLASSES: [&str; 3] = ["text-lg", "font-normal", "text-gray-700"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Running {
        days: i64,
        hours: i64,
        minutes: i64,
        seconds: i64,
    },
    Finished,
}

impl CountdownState {
    /// Markup written into the timer element.
    pub fn render(&self) -> String {
        match self {
            CountdownState::Running {
                days,
                hours,
                minutes,
                seconds,
            } => format!(
                "Returning in:<br>\
                 <span class=\"inline-block w-11\">{}</span>d \
                 <span class=\"inline-block w-11\">{:02}</span>h \
                 <span class=\"inline-block w-11\">{:02}</span>m \
                 <span class=\"inline-block w-11\">{:02}</span>s",
                days, hours, minutes, seconds
            ),
            CountdownState::Finished => FINISHED_MESSAGE.to_string(),
        }
    }
}

/// Counts down to the announced end of maintenance.
#[derive(Debug, Clone, Copy)]
pub struct MaintenanceCountdown {
    end: DateTime<FixedOffset>,
}

impl MaintenanceCountdown {
    pub fn new(end: DateTime<FixedOffset>) -> Self {
        Self { end }
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> CountdownState {
        let distance = self.end.with_timezone(&Utc) - now;
        if distance < chrono::Duration::zero() {
            return CountdownState::Finished;
        }

        CountdownState::Running {
            days: distance.num_days(),
            hours: distance.num_hours() % 24,
            minutes: distance.num_minutes() % 60,
            seconds: distance.num_seconds() % 60,
        }
    }

    /// Tick every second until the end time passes.
    pub async fn run<D: Document>(&self, document: SharedDocument<D>) {
        self.run_with_clock(document, Duration::from_secs(1), Utc::now)
            .await
    }

    /// Returns immediately when the page has no timer element.
    pub async fn run_with_clock<D, C>(&self, document: SharedDocument<D>, tick: Duration, clock: C)
    where
        D: Document,
        C: Fn() -> DateTime<Utc>,
    {
        let Some(node) = document.lock().await.element_by_id(TIMER_ID) else {
            return;
        };

        let mut ticker = interval(tick);
        loop {
            ticker.tick().await;
            let state = self.remaining(clock());

            let mut doc = document.lock().await;
            doc.set_inner_html(node, &state.render());
            if state == CountdownState::Finished {
                for class in RUNNING_CLASSES {
                    doc.remove_class(node, class);
                }
                for class in FINISHED_CLASSES {
                    doc.add_class(node, class);
                }
                info!("Maintenance window is over");
                return;
            }
        }
    }
}

impl From<&Config> for MaintenanceCountdown {
    fn from(config: &Config) -> Self {
        Self::new(config.maintenance_end)
    }
}

/// Sends visitors of the 404 page home after a countdown.
#[derive(Debug, Clone, Copy)]
pub struct RedirectCountdown {
    seconds: u32,
}

impl RedirectCountdown {
    pub fn new(seconds: u32) -> Self {
        Self { seconds }
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub async fn run<D: Document>(&self, document: SharedDocument<D>) {
        self.run_with_tick(document, Duration::from_secs(1)).await
    }

    /// The countdown element is optional; navigation happens either way.
    pub async fn run_with_tick<D: Document>(&self, document: SharedDocument<D>, tick: Duration) {
        let mut seconds_left = self.seconds;

        loop {
            sleep(tick).await;
            seconds_left = seconds_left.saturating_sub(1);

            let mut doc = document.lock().await;
            if let Some(node) = doc.element_by_id(REDIRECT_COUNTDOWN_ID) {
                doc.set_inner_html(node, &seconds_left.to_string());
            }
            if seconds_left == 0 {
                doc.navigate("/");
                return;
            }
        }
    }
}

impl From<&Config> for RedirectCountdown {
    fn from(config: &Config) -> Self {
        Self::new(config.redirect_seconds)
    }
}
