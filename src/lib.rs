//! Localization engine and page scripts for the landing site.

pub mod common;
pub mod config;
pub mod countdown;
pub mod dom;
pub mod hero;
pub mod i18n;
pub mod preferences;
pub mod waitlist;
