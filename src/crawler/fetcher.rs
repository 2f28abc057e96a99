//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of a run, including:
//! - Building the HTTP client with the descriptive user agent string
//! - GET requests for pages (text) and PDFs (bytes)
//! - Pacing every request through the [`RequestThrottle`]
//! - Retry logic for transient failures per the [`RetryPolicy`]
//! - Error classification

use crate::config::{Config, UserAgentConfig};
use crate::crawler::policy::{RequestThrottle, RetryPolicy};
use crate::{FetchError, FetchErrorKind};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;

/// Longest connect phase allowed regardless of the request timeout
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total timeout of one request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use conference_harvester::config::UserAgentConfig;
/// use conference_harvester::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "ConferenceHarvester".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sequential HTTP fetcher shared by the whole run
///
/// Every request, retries included, first waits on the throttle. Failures
/// classified as transient are retried until the policy's attempts are used
/// up; anything else fails immediately.
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
    throttle: RequestThrottle,
    requests_sent: u64,
}

impl Fetcher {
    pub fn new(client: Client, retry: RetryPolicy, throttle: RequestThrottle) -> Self {
        Self {
            client,
            retry,
            throttle,
            requests_sent: 0,
        }
    }

    /// Builds a fetcher from the `[fetch]` and `[user-agent]` settings
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, config.fetch.request_timeout())?;
        Ok(Self::new(
            client,
            RetryPolicy::from_config(&config.fetch),
            RequestThrottle::from_config(&config.fetch),
        ))
    }

    /// Number of HTTP requests issued so far, retries included
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    /// Fetches a page and decodes its body as text
    pub async fn fetch_text(&mut self, url: &str) -> Result<String, FetchError> {
        let (attempts, response) = self.get_with_retry(url).await?;
        response.text().await.map_err(|e| FetchError {
            url: url.to_string(),
            attempts,
            kind: FetchErrorKind::Body(e.to_string()),
        })
    }

    /// Fetches a resource as raw bytes
    pub async fn fetch_bytes(&mut self, url: &str) -> Result<Vec<u8>, FetchError> {
        let (attempts, response) = self.get_with_retry(url).await?;
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| FetchError {
                url: url.to_string(),
                attempts,
                kind: FetchErrorKind::Body(e.to_string()),
            })
    }

    /// Sends GET requests until one succeeds or the policy gives up
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return the response |
    /// | HTTP 5xx / 429 | Retry with backoff |
    /// | Timeout / connection error | Retry with backoff |
    /// | Any other status (e.g. 404) | Fail immediately |
    ///
    /// Returns the number of attempts used alongside the response.
    async fn get_with_retry(&mut self, url: &str) -> Result<(u32, Response), FetchError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.throttle.wait().await;
            self.requests_sent += 1;
            tracing::debug!("GET {} (attempt {}/{})", url, attempt, self.retry.max_attempts);

            let kind = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::trace!("{} -> {}", url, response.status());
                    return Ok((attempt, response));
                }
                Ok(response) => FetchErrorKind::Status(response.status().as_u16()),
                Err(e) => classify_error(&e),
            };

            if !kind.is_retryable() || attempt >= self.retry.max_attempts {
                return Err(FetchError {
                    url: url.to_string(),
                    attempts: attempt,
                    kind,
                });
            }

            let backoff = self.retry.backoff_after(attempt);
            tracing::warn!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                attempt,
                self.retry.max_attempts,
                url,
                kind,
                backoff
            );
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(error: &reqwest::Error) -> FetchErrorKind {
    if error.is_timeout() {
        FetchErrorKind::Timeout
    } else if error.is_connect() {
        FetchErrorKind::Connect
    } else if error.is_body() || error.is_decode() {
        FetchErrorKind::Body(error.to_string())
    } else {
        FetchErrorKind::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    fn test_fetcher(max_attempts: u32) -> Fetcher {
        let client = build_http_client(&create_test_config(), Duration::from_secs(5)).unwrap();
        Fetcher::new(
            client,
            RetryPolicy::immediate(max_attempts),
            RequestThrottle::disabled(),
        )
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config, Duration::from_secs(30));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_user_agent_header_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(wiremock::matchers::header(
                "user-agent",
                "TestHarvester/1.0 (+https://example.com/about; admin@example.com)",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let mut fetcher = test_fetcher(1);
        let body = fetcher.fetch_text(&format!("{}/", server.uri())).await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
            .mount(&server)
            .await;

        let mut fetcher = test_fetcher(3);
        let body = fetcher
            .fetch_text(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();

        assert_eq!(body, "finally");
        assert_eq!(fetcher.requests_sent(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let mut fetcher = test_fetcher(2);
        let err = fetcher
            .fetch_text(&format!("{}/broken", server.uri()))
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 2);
        assert_eq!(err.kind, FetchErrorKind::Status(500));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let mut fetcher = test_fetcher(3);
        let err = fetcher
            .fetch_bytes(&format!("{}/missing.pdf", server.uri()))
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(err.kind, FetchErrorKind::Status(404));
        assert_eq!(fetcher.requests_sent(), 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        // Bind then drop a listener to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut fetcher = test_fetcher(2);
        let err = fetcher
            .fetch_text(&format!("http://127.0.0.1:{}/", port))
            .await
            .unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::Connect);
        assert_eq!(err.attempts, 2);
    }
}
