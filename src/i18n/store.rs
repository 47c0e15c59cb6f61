//! Translation store: fetches locale dictionaries and owns the resident table.

use crate::i18n::{I18nError, I18nMetrics, Language, LoadError, TranslationTable};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Source of per-language dictionaries.
pub trait LocaleFetcher: Send + Sync {
    fn fetch(
        &self,
        language: Language,
    ) -> impl Future<Output = Result<TranslationTable, LoadError>> + Send;
}

/// Fetches `GET {base}/locales/{code}.json` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLocaleFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLocaleFetcher {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resource URL without the cache-busting parameter.
    pub fn locale_url(&self, language: Language) -> String {
        format!("{}/locales/{}.json", self.base_url, language.code())
    }
}

impl LocaleFetcher for HttpLocaleFetcher {
    async fn fetch(&self, language: Language) -> Result<TranslationTable, LoadError> {
        let url = self.locale_url(language);

        // Timestamp bypasses any intermediate cache
        let response = self
            .client
            .get(&url)
            .query(&[("v", Utc::now().timestamp_millis().to_string())])
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

        let body = response.text().await.map_err(|source| LoadError::Network {
            url: url.clone(),
            source,
        })?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| LoadError::Parse {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        TranslationTable::from_value(value).ok_or(LoadError::NotAnObject { url })
    }
}

/// Result of a successful [`TranslationStore::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loaded {
    pub requested: Language,
    /// Language whose table is now resident.
    pub language: Language,
    pub fell_back: bool,
}

/// Holds exactly one translation table at a time.
pub struct TranslationStore<F> {
    fetcher: F,
    table: TranslationTable,
    metrics: Arc<I18nMetrics>,
}

impl<F: LocaleFetcher> TranslationStore<F> {
    pub fn new(fetcher: F, metrics: Arc<I18nMetrics>) -> Self {
        Self {
            fetcher,
            table: TranslationTable::default(),
            metrics,
        }
    }

    pub fn table(&self) -> &TranslationTable {
        &self.table
    }

    /// Load `requested`, falling back once to the default language.
    ///
    /// On total failure the previously resident table is left in place.
    pub async fn load(&mut self, requested: Language) -> Result<Loaded, I18nError> {
        let default = Language::default_language();

        let err = match self.fetch(requested).await {
            Ok(table) => {
                self.table = table;
                return Ok(Loaded {
                    requested,
                    language: requested,
                    fell_back: false,
                });
            }
            Err(e) => e,
        };

        error!("Could not load translations for {}: {}", requested, err);
        if requested == default {
            return Err(I18nError::LoadFailed {
                code: requested,
                source: err,
            });
        }

        warn!("Falling back to {} translations", default);
        self.metrics.record_fallback();
        match self.fetch(default).await {
            Ok(table) => {
                self.table = table;
                Ok(Loaded {
                    requested,
                    language: default,
                    fell_back: true,
                })
            }
            Err(source) => {
                error!("Could not load translations for {}: {}", default, source);
                Err(I18nError::LoadFailed {
                    code: default,
                    source,
                })
            }
        }
    }

    async fn fetch(&self, language: Language) -> Result<TranslationTable, LoadError> {
        self.metrics.record_load();
        debug!("Fetching translations for {}", language);
        let result = self.fetcher.fetch(language).await;
        if result.is_err() {
            self.metrics.record_load_failure();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param_is_missing},
        Mock, MockServer, ResponseTemplate,
    };

    fn fetcher(server: &MockServer) -> HttpLocaleFetcher {
        HttpLocaleFetcher::new(reqwest::Client::new(), &server.uri())
    }

    fn uk() -> Language {
        Language::from_code("uk").unwrap()
    }

    async fn mount_locale(server: &MockServer, code: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/locales/{}.json", code)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    // ==================== HttpLocaleFetcher Tests ====================

    #[test]
    fn test_locale_url_trims_trailing_slash() {
        let f = HttpLocaleFetcher::new(reqwest::Client::new(), "https://hearme.tech/");
        assert_eq!(f.locale_url(uk()), "https://hearme.tech/locales/uk.json");
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        mount_locale(&server, "uk", json!({"hero": {"title": "Привіт"}})).await;

        let table = fetcher(&server).fetch(uk()).await.unwrap();
        assert_eq!(table.lookup("hero.title"), Some("Привіт"));
    }

    #[tokio::test]
    async fn test_fetch_sends_cache_buster() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locales/en.json"))
            .and(query_param_is_missing("v"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_locale(&server, "en", json!({"a": "b"})).await;

        let table = fetcher(&server).fetch(Language::ENGLISH).await.unwrap();
        assert_eq!(table.lookup("a"), Some("b"));

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].url.query().unwrap_or_default().starts_with("v="));
    }

    #[tokio::test]
    async fn test_fetch_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch(uk()).await.unwrap_err();
        assert!(matches!(err, LoadError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch(uk()).await.unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_fetch_non_object() {
        let server = MockServer::start().await;
        mount_locale(&server, "uk", json!(["x"])).await;

        let err = fetcher(&server).fetch(uk()).await.unwrap_err();
        assert!(matches!(err, LoadError::NotAnObject { .. }));
    }

    // ==================== TranslationStore Tests ====================

    #[tokio::test]
    async fn test_load_requested_language() {
        let server = MockServer::start().await;
        mount_locale(&server, "uk", json!({"k": "uk"})).await;
        let metrics = Arc::new(I18nMetrics::new());
        let mut store = TranslationStore::new(fetcher(&server), metrics.clone());

        let loaded = store.load(uk()).await.unwrap();
        assert_eq!(loaded.language, uk());
        assert!(!loaded.fell_back);
        assert_eq!(store.table().lookup("k"), Some("uk"));
        assert_eq!(metrics.loads(), 1);
    }

    #[tokio::test]
    async fn test_load_falls_back_to_default() {
        let server = MockServer::start().await;
        mount_locale(&server, "en", json!({"k": "en"})).await;
        let metrics = Arc::new(I18nMetrics::new());
        let mut store = TranslationStore::new(fetcher(&server), metrics.clone());

        let loaded = store.load(uk()).await.unwrap();
        assert_eq!(loaded.requested, uk());
        assert_eq!(loaded.language, Language::ENGLISH);
        assert!(loaded.fell_back);
        assert_eq!(store.table().lookup("k"), Some("en"));
        assert_eq!(metrics.loads(), 2);
        assert_eq!(metrics.load_failures(), 1);
        assert_eq!(metrics.fallbacks(), 1);
    }

    #[tokio::test]
    async fn test_default_failure_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
        let mut store = TranslationStore::new(fetcher(&server), Arc::new(I18nMetrics::new()));

        let err = store.load(Language::ENGLISH).await.unwrap_err();
        assert!(matches!(err, I18nError::LoadFailed { code, .. } if code == Language::ENGLISH));
        assert!(store.table().is_empty());
    }

    #[tokio::test]
    async fn test_total_failure_keeps_previous_table() {
        let server = MockServer::start().await;
        mount_locale(&server, "de", json!({"k": "de"})).await;
        let mut store = TranslationStore::new(fetcher(&server), Arc::new(I18nMetrics::new()));
        store.load(Language::from_code("de").unwrap()).await.unwrap();

        let err = store.load(uk()).await.unwrap_err();
        assert!(matches!(err, I18nError::LoadFailed { .. }));
        assert_eq!(store.table().lookup("k"), Some("de"));
    }
}
