use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::RawItem;

const HTTP_USER_AGENT: &str = "BookScape/0.1 (+https://github.com/bookscape/bookscape)";
const RATE_LIMITED: u16 = 403;
const OK: u16 = 200;
static FETCH_DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Search settings. Defaults match the public Google Books quota behavior:
/// three attempts, ten seconds apart, forty results per page.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FetchSettings {
    pub endpoint: String,
    pub max_results: u32,
    /// Total attempts per search, including the first.
    pub max_attempts: u32,
    /// Fixed wait between attempts after a 403 or transport failure.
    pub retry_delay_secs: u64,
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/books/v1/volumes".to_string(),
            max_results: 40,
            max_attempts: 3,
            retry_delay_secs: 10,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Performs a single GET. Implementations report connection-level failures
/// as `Error::Transport`; any HTTP status is a successful response here.
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

pub trait Sleep {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::Client(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, HTTP_USER_AGENT)
            .send()
            .map_err(|err| Error::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| Error::Transport(err.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Option<Vec<RawItem>>,
}

pub struct Fetcher<T = HttpTransport, S = ThreadSleep> {
    settings: FetchSettings,
    transport: T,
    sleeper: S,
}

impl Fetcher {
    pub fn from_settings(settings: FetchSettings) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(settings.timeout_secs))?;
        Ok(Self::with_transport(settings, transport, ThreadSleep))
    }
}

impl<T: Transport, S: Sleep> Fetcher<T, S> {
    pub fn with_transport(settings: FetchSettings, transport: T, sleeper: S) -> Self {
        Self {
            settings,
            transport,
            sleeper,
        }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Search with the configured page size.
    pub fn fetch(&self, query: &str) -> Result<Vec<RawItem>> {
        self.fetch_with_limit(query, self.settings.max_results)
    }

    /// Issue one search, retrying rate limits and transport failures with a
    /// fixed delay. Exhausted rate limiting yields an empty result; any other
    /// non-200 status fails immediately.
    pub fn fetch_with_limit(&self, query: &str, max_results: u32) -> Result<Vec<RawItem>> {
        let url = search_url(&self.settings.endpoint, query, max_results);
        let attempts = self.settings.max_attempts.max(1);
        let delay = Duration::from_secs(self.settings.retry_delay_secs);
        let debug_enabled = fetch_debug_enabled();

        log::info!("fetching books query=\"{}\" max_results={}", query, max_results);

        for attempt in 1..=attempts {
            if debug_enabled {
                log::info!("[fetch-debug] http start url={} attempt={}", url, attempt);
            }
            let last_attempt = attempt == attempts;

            let response = match self.transport.get(&url) {
                Ok(value) => value,
                Err(err) => {
                    log::warn!("search transport error attempt={}: {}", attempt, err);
                    if last_attempt {
                        return Err(err);
                    }
                    self.sleeper.sleep(delay);
                    continue;
                }
            };

            if debug_enabled {
                log::info!(
                    "[fetch-debug] http status url={} status={} attempt={}",
                    url,
                    response.status,
                    attempt
                );
            }

            match response.status {
                OK => {
                    let parsed: SearchResponse = serde_json::from_str(&response.body)?;
                    let items = parsed.items.unwrap_or_default();
                    log::info!("fetched {} items for query=\"{}\"", items.len(), query);
                    return Ok(items);
                }
                RATE_LIMITED => {
                    if last_attempt {
                        break;
                    }
                    log::warn!(
                        "API request limit reached. Retrying in {} seconds...",
                        delay.as_secs()
                    );
                    self.sleeper.sleep(delay);
                }
                status => {
                    log::error!("Error fetching data: {}", status);
                    return Err(Error::Status(status));
                }
            }
        }

        log::warn!(
            "search still rate limited after {} attempts, giving up query=\"{}\"",
            attempts,
            query
        );
        Ok(vec![])
    }
}

pub fn search_url(endpoint: &str, query: &str, max_results: u32) -> String {
    format!(
        "{}?q={}&maxResults={}",
        endpoint,
        urlencoding::encode(query),
        max_results
    )
}

fn fetch_debug_enabled() -> bool {
    *FETCH_DEBUG_ENABLED.get_or_init(|| {
        std::env::var("BOOKSCAPE_FETCH_DEBUG")
            .map(|value| {
                let lowered = value.trim().to_ascii_lowercase();
                lowered == "1" || lowered == "true" || lowered == "yes" || lowered == "on"
            })
            .unwrap_or(false)
    })
}
