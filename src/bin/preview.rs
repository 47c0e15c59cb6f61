//! Preview binary - renders translation keys the way a page would see them
//!
//! Usage:
//!   cargo run --bin preview -- hero.title nav.home
//!   cargo run --bin preview -- --query=lang=uk hero.title
//!   cargo run --bin preview -- --locale=de-DE --switch=fr hero.title
//!   cargo run --bin preview -- --page=index --query=lang=uk
//!   cargo run --bin preview -- --page=maintenance
//!
//! The shared header and footer are injected from the site first, so their
//! keys render too. Resolution honours the stored preference in
//! PREFERENCES_FILE, and a successful run updates it exactly like a browser
//! visit would.

use anyhow::{bail, Result};
use chrono::Utc;
use landing_i18n::common::{CommonElements, FOOTER_PLACEHOLDER_ID, HEADER_PLACEHOLDER_ID};
use landing_i18n::config::Config;
use landing_i18n::countdown::{
    MaintenanceCountdown, RedirectCountdown, REDIRECT_COUNTDOWN_ID, TIMER_ID,
};
use landing_i18n::dom::{Document, ElementKind, StaticPage, TRANSLATION_ATTR};
use landing_i18n::hero::{HeroAnimator, DISPLAY_ID, SOURCE_ID};
use landing_i18n::i18n::{ChangeOutcome, HttpLocaleFetcher, I18n, I18nOptions};
use landing_i18n::preferences::FilePreferences;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Page-specific script to run alongside localization.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum PageKind {
    #[default]
    Plain,
    Index,
    Maintenance,
    NotFound,
}

impl PageKind {
    fn parse(name: &str) -> Result<Self> {
        Ok(match name {
            "plain" => PageKind::Plain,
            "index" => PageKind::Index,
            "maintenance" => PageKind::Maintenance,
            "404" => PageKind::NotFound,
            other => bail!("Unknown page '{}' (plain, index, maintenance, 404)", other),
        })
    }
}

#[derive(Debug, Default)]
struct PreviewArgs {
    query: Option<String>,
    locale: Option<String>,
    switch_to: Option<String>,
    page: PageKind,
    keys: Vec<String>,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<PreviewArgs> {
    let mut parsed = PreviewArgs::default();
    for arg in args {
        if let Some(query) = arg.strip_prefix("--query=") {
            parsed.query = Some(query.to_string());
        } else if let Some(locale) = arg.strip_prefix("--locale=") {
            parsed.locale = Some(locale.to_string());
        } else if let Some(code) = arg.strip_prefix("--switch=") {
            parsed.switch_to = Some(code.to_string());
        } else if let Some(page) = arg.strip_prefix("--page=") {
            parsed.page = PageKind::parse(page)?;
        } else {
            parsed.keys.push(arg);
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("landing_i18n=info".parse()?),
        )
        .init();

    // Load environment from .env file
    dotenvy::dotenv().ok();

    let args = parse_args(std::env::args().skip(1))?;
    let config = Config::from_env()?;

    let mut page = StaticPage::new();
    if let Some(query) = &args.query {
        page = page.with_query(query);
    }
    if let Some(locale) = &args.locale {
        page = page.with_locale(locale);
    }
    page.insert(ElementKind::Container("div".into()), Some(HEADER_PLACEHOLDER_ID));
    let nodes: Vec<_> = args
        .keys
        .iter()
        .map(|key| {
            let node = page.insert_translatable(ElementKind::Container("div".into()), key, "");
            (key.clone(), node)
        })
        .collect();
    match args.page {
        PageKind::Index => {
            page.insert(ElementKind::Container("h1".into()), Some(DISPLAY_ID));
            let source = page.insert(ElementKind::Container("span".into()), Some(SOURCE_ID));
            page.set_attribute(source, TRANSLATION_ATTR, "hero.title");
        }
        PageKind::Maintenance => {
            page.insert(ElementKind::Container("div".into()), Some(TIMER_ID));
        }
        PageKind::NotFound => {
            page.insert(ElementKind::Container("span".into()), Some(REDIRECT_COUNTDOWN_ID));
        }
        PageKind::Plain => {}
    }
    page.insert(ElementKind::Container("footer".into()), Some(FOOTER_PLACEHOLDER_ID));

    let client = reqwest::Client::new();
    let document = Arc::new(Mutex::new(page));
    let i18n = I18n::new(
        document.clone(),
        HttpLocaleFetcher::new(client.clone(), &config.site_base_url),
        Arc::new(FilePreferences::new(&config.preferences_file)),
        I18nOptions::from(&config),
    );

    let _hold = i18n.pre_paint().await;
    CommonElements::new(client, &config.site_base_url)
        .load(&document)
        .await;

    let hero = (args.page == PageKind::Index).then(|| {
        let animator = HeroAnimator::from(&config);
        (animator, tokio::spawn(animator.run(document.clone(), i18n.subscribe())))
    });

    match i18n.init().await {
        Ok(language) => info!("Rendered in {}", language.display_name()),
        Err(e) => warn!("Rendering untranslated page: {}", e),
    }

    if let Some(code) = &args.switch_to {
        match i18n.change_language(code).await? {
            ChangeOutcome::Unchanged => info!("{} was already active", code),
            ChangeOutcome::Changed(language) => info!("Switched to {}", language),
            ChangeOutcome::FellBack { requested, language } => {
                warn!("{} unavailable, showing {}", requested, language)
            }
        }
    }

    if let Some((animator, task)) = hero {
        let source = {
            let doc = document.lock().await;
            doc.element_by_id(SOURCE_ID)
                .and_then(|node| doc.inner_html(node))
                .unwrap_or_default()
        };
        tokio::time::sleep(animator.first_render_time(&source)).await;
        task.abort();
    }

    let doc = document.lock().await;
    println!("lang: {}", i18n.active_language());
    for (key, node) in nodes {
        match doc.inner_html(node).filter(|html| !html.is_empty()) {
            Some(html) => println!("{} = {}", key, html),
            None => println!("{} = <missing>", key),
        }
    }

    match args.page {
        PageKind::Index => {
            if let Some(display) = doc.element_by_id(DISPLAY_ID) {
                println!("hero: {}", doc.inner_html(display).unwrap_or_default());
            }
        }
        PageKind::Maintenance => {
            let countdown = MaintenanceCountdown::from(&config);
            println!("timer: {}", countdown.remaining(Utc::now()).render());
        }
        PageKind::NotFound => {
            let redirect = RedirectCountdown::from(&config);
            println!("redirect: / in {}s", redirect.seconds());
        }
        PageKind::Plain => {}
    }
    drop(doc);

    i18n.teardown().await;
    info!("{}", serde_json::to_string(&i18n.metrics().report())?);
    Ok(())
}
