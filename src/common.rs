//! Markup shared by every page: the injected header and footer, and the
//! mobile navigation menu that lives in the header.
//!
//! Pages call [`CommonElements::load`] before initializing localization so
//! the translatable elements and language switchers of the header exist by
//! the time the first translation pass runs.

use crate::dom::{Document, ListenerId, SharedDocument};
use crate::i18n::LoadError;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const HEADER_PLACEHOLDER_ID: &str = "header-placeholder";
pub const FOOTER_PLACEHOLDER_ID: &str = "footer-placeholder";
pub const HEADER_PATH: &str = "/components/header.html";
pub const FOOTER_PATH: &str = "/components/footer.html";

pub const MOBILE_MENU_ID: &str = "mobile-menu";
pub const MOBILE_MENU_BUTTON_ID: &str = "mobile-menu-button";
pub const HIDDEN_CLASS: &str = "hidden";

/// Which shared fragments made it into the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Injected {
    pub header: bool,
    pub footer: bool,
    /// Listeners registered by the mobile menu.
    pub menu_listeners: usize,
}

/// Fetches the shared header and footer fragments from the site.
#[derive(Debug, Clone)]
pub struct CommonElements {
    client: reqwest::Client,
    base_url: String,
}

impl CommonElements {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Inject the header in place of its placeholder and the footer inside
    /// its placeholder. A fragment is only requested when its placeholder
    /// exists, and a failed request leaves the placeholder untouched.
    pub async fn load<D: Document>(&self, document: &SharedDocument<D>) -> Injected {
        let (header_slot, footer_slot) = {
            let doc = document.lock().await;
            (
                doc.element_by_id(HEADER_PLACEHOLDER_ID),
                doc.element_by_id(FOOTER_PLACEHOLDER_ID),
            )
        };

        let (header, footer) = tokio::join!(
            async {
                match header_slot {
                    Some(_) => Some(self.fetch_fragment(HEADER_PATH).await),
                    None => None,
                }
            },
            async {
                match footer_slot {
                    Some(_) => Some(self.fetch_fragment(FOOTER_PATH).await),
                    None => None,
                }
            }
        );

        let mut injected = Injected::default();
        let mut doc = document.lock().await;

        if let (Some(slot), Some(result)) = (header_slot, header) {
            match result {
                Ok(html) => {
                    doc.replace_with_html(slot, &html);
                    injected.header = true;
                    injected.menu_listeners = setup_mobile_menu(&mut *doc).len();
                }
                Err(e) => warn!("Header not injected: {}", e),
            }
        }

        if let (Some(slot), Some(result)) = (footer_slot, footer) {
            match result {
                Ok(html) => {
                    doc.set_inner_html(slot, &html);
                    injected.footer = true;
                }
                Err(e) => warn!("Footer not injected: {}", e),
            }
        }

        info!(
            "Shared elements loaded (header: {}, footer: {})",
            injected.header, injected.footer
        );
        injected
    }

    async fn fetch_fragment(&self, path: &str) -> Result<String, LoadError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| LoadError::Network {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(LoadError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|source| LoadError::Network { url, source })
    }
}

/// Wire the mobile menu: the button toggles it, any link inside closes it.
///
/// Returns the registered listeners; empty when either element is missing.
pub fn setup_mobile_menu<D: Document + ?Sized>(document: &mut D) -> Vec<ListenerId> {
    let (Some(button), Some(menu)) = (
        document.element_by_id(MOBILE_MENU_BUTTON_ID),
        document.element_by_id(MOBILE_MENU_ID),
    ) else {
        return Vec::new();
    };

    let mut listeners = vec![document.add_click_listener(
        button,
        Arc::new(move |doc: &mut dyn Document| {
            if doc.has_class(menu, HIDDEN_CLASS) {
                doc.remove_class(menu, HIDDEN_CLASS);
            } else {
                doc.add_class(menu, HIDDEN_CLASS);
            }
        }),
    )];

    for link in document.descendants_by_tag(menu, "a") {
        listeners.push(document.add_click_listener(
            link,
            Arc::new(move |doc: &mut dyn Document| doc.add_class(menu, HIDDEN_CLASS)),
        ));
    }

    debug!("Mobile menu wired with {} listeners", listeners.len());
    listeners
}
