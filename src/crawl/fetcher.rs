use crate::config::FetchSettings;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching a listing page.
///
/// These cover the transport side only; what the page contains is the
/// extractor's concern.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, transport timeout, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Shared HTTP client plus the retry and size policy for listing pages.
///
/// Cheap to clone: `reqwest::Client` is reference counted internally.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_retries: u32,
    retry_base_delay: Duration,
    max_page_bytes: usize,
}

impl Fetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            max_retries: settings.max_retries,
            retry_base_delay: settings.retry_base_delay,
            max_page_bytes: settings.max_page_bytes,
        })
    }

    /// Fetches `url` and returns its body as text.
    ///
    /// # Behavior
    ///
    /// - 429 and 5xx responses are retried with exponential backoff, up to
    ///   `max_retries` times
    /// - Other non-2xx statuses fail immediately
    /// - Truncated bodies are retried like server errors
    /// - Bodies are decoded as UTF-8, replacing invalid sequences
    pub async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let mut retry_count = 0;

        let bytes = loop {
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if retry_count >= self.max_retries {
                    return Err(FetchError::RateLimited(self.max_retries));
                }
                let delay = self.backoff(retry_count);
                tracing::warn!(
                    url = %url,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            if status.is_server_error() {
                if retry_count >= self.max_retries {
                    return Err(FetchError::HttpStatus(status.as_u16()));
                }
                let delay = self.backoff(retry_count);
                tracing::warn!(
                    url = %url,
                    status = %status,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Server error, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            match read_limited_bytes(response, self.max_page_bytes).await {
                Ok(bytes) => break bytes,
                Err(FetchError::IncompleteResponse { expected, received }) => {
                    if retry_count >= self.max_retries {
                        return Err(FetchError::IncompleteResponse { expected, received });
                    }
                    let delay = self.backoff(retry_count);
                    tracing::debug!(
                        url = %url,
                        expected = expected,
                        received = received,
                        attempt = retry_count + 1,
                        "Retrying incomplete download"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }
        };

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn backoff(&self, retry_count: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(retry_count))
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
