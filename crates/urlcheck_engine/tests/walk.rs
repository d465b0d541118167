use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use urlcheck_core::{CounterRegistry, DomainRules, RedirectType};
use urlcheck_engine::{
    FailureKind, FetchError, FetchOutput, FetchSettings, Fetcher, HistoryWalker,
    RedirectClassifier, ReqwestFetcher,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Answers from a fixed script; unknown URLs get an empty 200 page.
#[derive(Default)]
struct ScriptedFetcher {
    responses: HashMap<String, Result<FetchOutput, FetchError>>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn page(mut self, url: &str, content: &str) -> Self {
        self.responses.insert(url.to_string(), Ok(output(200, content, None)));
        self
    }

    fn redirect(mut self, url: &str, location: &str) -> Self {
        self.responses
            .insert(url.to_string(), Ok(output(302, "", Some(location))));
        self
    }

    fn redirect_with_body(mut self, url: &str, location: &str, content: &str) -> Self {
        self.responses
            .insert(url.to_string(), Ok(output(302, content, Some(location))));
        self
    }

    fn failure(mut self, url: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            Err(FetchError::new(FailureKind::Network, "connection refused")),
        );
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

fn output(status: u16, content: &str, location: Option<&str>) -> FetchOutput {
    FetchOutput {
        status,
        content: content.to_string(),
        location: location.map(str::to_string),
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Ok(output(200, "", None)))
    }
}

fn walker(fetcher: Arc<ScriptedFetcher>, max_hops: usize) -> HistoryWalker {
    let domains = Arc::new(DomainRules::builtin().unwrap());
    let classifier = RedirectClassifier::new(fetcher, domains);
    let counters = Arc::new(CounterRegistry::builtin().unwrap());
    HistoryWalker::new(classifier, counters, max_hops)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[tokio::test]
async fn page_without_redirect_yields_single_url() {
    let fetcher = Arc::new(ScriptedFetcher::default().page("http://url.ru", "<html></html>"));
    let history = walker(fetcher, 30).walk("http://url.ru").await;

    assert_eq!(history.types(), &[] as &[RedirectType]);
    assert_eq!(history.urls(), strings(&["http://url.ru"]).as_slice());
    assert!(history.counters().is_empty());
}

#[tokio::test]
async fn self_redirect_stops_at_max_hops() {
    let fetcher =
        Arc::new(ScriptedFetcher::default().redirect("http://loop.ru", "http://loop.ru"));
    let history = walker(fetcher.clone(), 5).walk("http://loop.ru").await;

    assert_eq!(history.types(), &[RedirectType::Http; 5]);
    assert_eq!(history.urls().len(), 6);
    assert_eq!(fetcher.requested().len(), 5);
}

#[tokio::test]
async fn failure_on_first_hop_records_error() {
    let fetcher = Arc::new(ScriptedFetcher::default().failure("http://down.ru"));
    let history = walker(fetcher, 30).walk("http://down.ru").await;

    assert_eq!(history.types(), &[RedirectType::Error]);
    assert_eq!(history.urls(), strings(&["http://down.ru", "http://down.ru"]).as_slice());
    assert!(history.has_error());
}

#[tokio::test]
async fn failure_mid_chain_ends_the_walk() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .redirect("http://a.ru", "http://b.ru")
            .failure("http://b.ru"),
    );
    let history = walker(fetcher.clone(), 30).walk("http://a.ru").await;

    assert_eq!(history.types(), &[RedirectType::Http, RedirectType::Error]);
    assert_eq!(
        history.urls(),
        strings(&["http://a.ru", "http://b.ru", "http://b.ru"]).as_slice()
    );
    assert_eq!(fetcher.requested(), strings(&["http://a.ru", "http://b.ru"]));
}

#[tokio::test]
async fn market_location_is_rewritten_to_store_url() {
    let fetcher = Arc::new(
        ScriptedFetcher::default().redirect("http://url.ru", "market://redirect-url.ru"),
    );
    let history = walker(fetcher, 30).walk("http://url.ru").await;

    assert_eq!(history.types(), &[RedirectType::Http]);
    assert_eq!(
        history.urls(),
        strings(&[
            "http://url.ru",
            "http://play.google.com/store/apps/redirect-url.ru"
        ])
        .as_slice()
    );
}

#[tokio::test]
async fn meta_refresh_continues_the_chain() {
    let fetcher = Arc::new(ScriptedFetcher::default().page(
        "http://meta.ru/start",
        r#"<html><head><meta http-equiv="refresh" content="0; url='/landing'"></head></html>"#,
    ));
    let history = walker(fetcher, 30).walk("http://meta.ru/start").await;

    assert_eq!(history.types(), &[RedirectType::Meta]);
    assert_eq!(history.last_url(), "http://meta.ru/landing");
}

#[tokio::test]
async fn first_page_with_counters_wins() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .redirect_with_body(
                "http://a.ru",
                "http://b.ru",
                r#"<script src="//mc.yandex.ru/metrika/watch.js"></script>"#,
            )
            .page(
                "http://b.ru",
                r#"<script src="http://www.google-analytics.com/ga.js"></script>"#,
            ),
    );
    let history = walker(fetcher, 30).walk("http://a.ru").await;

    let expected: BTreeSet<String> = ["YA_METRICA".to_string()].into_iter().collect();
    assert_eq!(history.counters(), &expected);
}

#[tokio::test]
async fn empty_first_page_leaves_counters_to_later_hops() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .redirect("http://a.ru", "http://b.ru")
            .page("http://b.ru", r#"<img src="https://vk.com/rtrg?p=1">"#),
    );
    let history = walker(fetcher, 30).walk("http://a.ru").await;

    let expected: BTreeSet<String> = ["VK_COUNTER".to_string()].into_iter().collect();
    assert_eq!(history.counters(), &expected);
}

#[tokio::test]
async fn self_terminal_domain_is_not_fetched() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let history = walker(fetcher.clone(), 30)
        .walk("https://my.mail.ru/apps/123")
        .await;

    assert_eq!(history.urls(), strings(&["https://my.mail.ru/apps/123"]).as_slice());
    assert!(history.types().is_empty());
    assert!(fetcher.requested().is_empty());
}

#[tokio::test]
async fn terminal_tracker_location_ends_the_chain() {
    let fetcher = Arc::new(ScriptedFetcher::default().redirect(
        "http://ads.ru",
        "http://www.odnoklassniki.ru/dk?st.cmd=x&st.redirect=1",
    ));
    let history = walker(fetcher, 30).walk("http://ads.ru").await;

    assert!(history.types().is_empty());
    assert_eq!(history.urls(), strings(&["http://ads.ru"]).as_slice());
}

#[tokio::test]
async fn blank_start_url_passes_through_unfetched() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let history = walker(fetcher.clone(), 30).walk("   ").await;

    assert_eq!(history.urls(), strings(&["   "]).as_slice());
    assert!(history.types().is_empty());
    assert!(fetcher.requested().is_empty());
}

#[tokio::test]
async fn start_url_is_normalized_before_fetching() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let history = walker(fetcher.clone(), 30)
        .walk("HTTP://url.ru/a b.php?q=x y")
        .await;

    assert_eq!(history.start_url(), "http://url.ru/a%20b.php?q=x+y");
    assert_eq!(fetcher.requested(), strings(&["http://url.ru/a%20b.php?q=x+y"]));
}

#[tokio::test]
async fn real_server_self_redirect_is_capped() {
    let server = MockServer::start().await;
    let url = format!("{}/loop", server.uri());
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = Arc::new(ReqwestFetcher::new(FetchSettings::default()).expect("client builds"));
    let domains = Arc::new(DomainRules::builtin().unwrap());
    let classifier = RedirectClassifier::new(fetcher, domains);
    let counters = Arc::new(CounterRegistry::builtin().unwrap());
    let walker = HistoryWalker::new(classifier, counters, 3);
    let history = walker.walk(&url).await;

    assert_eq!(history.types(), &[RedirectType::Http; 3]);
    assert!(history.urls().iter().all(|hop| hop == &url));
}
