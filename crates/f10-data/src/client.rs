//! Rate-limited HTTP client for the F10 statement exports and profile page.

use crate::error::{DataError, Result};
use encoding_rs::{Encoding, GBK, UTF_8};
use f10_extract::Source;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Upstream site base URL
const BASE_URL: &str = "http://quotes.money.163.com";

/// Default minimum interval between requests
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request
const USER_AGENT: &str = "Mozilla/5.0 (compatible; f10-extract/0.1)";

/// Length of a company code
const COMPANY_CODE_LEN: usize = 6;

/// Source of raw page text for a company.
pub trait Fetcher {
    /// Fetch the decoded text of one upstream document.
    fn fetch(&self, source: Source, company_code: &str)
    -> impl Future<Output = Result<String>> + Send;
}

/// Spaces requests at least `min_interval` apart.
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            last_request: now.checked_sub(min_interval).unwrap_or(now),
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// HTTP client for the 163 F10 pages.
#[derive(Debug, Clone)]
pub struct F10Client {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    base_url: String,
}

impl F10Client {
    /// Create a client that waits [`DEFAULT_MIN_INTERVAL`] between requests.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(DEFAULT_MIN_INTERVAL)
    }

    /// Create a client with a custom pause between requests.
    ///
    /// # Example
    /// ```no_run
    /// use f10_data::F10Client;
    /// use f10_extract::Source;
    /// use std::time::Duration;
    ///
    /// # async fn example() -> f10_data::Result<()> {
    /// let client = F10Client::with_rate_limit(Duration::from_secs(2))?;
    /// let page = client.fetch_page(Source::ProfilePage, "600000").await?;
    /// println!("{} bytes", page.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_rate_limit(min_interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(min_interval))),
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at another host, e.g. a mirror or a local fixture server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// URL of the document carrying `source` for a company.
    pub fn url(&self, source: Source, company_code: &str) -> String {
        match source {
            Source::Statement(report) => {
                format!("{}/service/{}_{company_code}.html", self.base_url, report.slug())
            }
            Source::ProfilePage => format!("{}/f10/gszl_{company_code}.html", self.base_url),
        }
    }

    /// Fetch and decode one document.
    ///
    /// Statement exports are GBK encoded. The profile page is decoded with the
    /// charset its response declares, UTF-8 if it declares none.
    ///
    /// # Errors
    /// Returns [`DataError::CompanyNotFound`] on HTTP 404 and
    /// [`DataError::Http`] on any other non-success status.
    pub async fn fetch_page(&self, source: Source, company_code: &str) -> Result<String> {
        validate_company_code(company_code)?;
        let url = self.url(source, company_code);

        self.rate_limiter.lock().await.wait().await;
        debug!(url = %url, "fetching");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DataError::CompanyNotFound(company_code.to_string()));
        }
        if !status.is_success() {
            return Err(DataError::Http(format!("{url}: HTTP {status}")));
        }

        let encoding = match source {
            Source::Statement(_) => GBK,
            Source::ProfilePage => response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(charset)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
                .unwrap_or(UTF_8),
        };

        let bytes = response.bytes().await?;
        Ok(decode(&bytes, encoding))
    }
}

impl Fetcher for F10Client {
    async fn fetch(&self, source: Source, company_code: &str) -> Result<String> {
        self.fetch_page(source, company_code).await
    }
}

/// Check that a company code is six ASCII digits.
pub fn validate_company_code(code: &str) -> Result<()> {
    if code.len() == COMPANY_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(DataError::InvalidCompanyCode(code.to_string()))
    }
}

/// Decode response bytes, replacing malformed sequences.
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(encoding = actual.name(), "malformed byte sequences replaced while decoding");
    }
    text.into_owned()
}

/// The `charset` parameter of a Content-Type header value.
fn charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}
