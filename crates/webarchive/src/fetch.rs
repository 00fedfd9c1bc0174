use crate::domain::Domain;
use crate::observer::PipelineObserver;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

// region:        --- Fetch config

pub const DEFAULT_API_URL: &str = "https://web.archive.org/cdx/search/cdx";
pub const DEFAULT_USER_AGENT: &str = "WebArchive-Subdomain-Extractor/1.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub api_url: String,
    /// CDX output format, `json` or `txt`.
    pub output: String,
    pub collapse: String,
    pub max_results: usize,
    pub timeout: Duration,
    /// Attempts made after the first one fails.
    pub max_retries: usize,
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            output: "json".to_string(),
            collapse: "urlkey".to_string(),
            max_results: 10_000,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }
}

// endregion:     --- Fetch config

/// Wildcard subdomain query against the CDX endpoint.
pub fn query_url(domain: &Domain, config: &FetchConfig) -> Result<Url> {
    let mut url = Url::parse(&config.api_url)
        .map_err(|err| Error::MalformedRequest(format!("{:?}: {}", config.api_url, err)))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(Error::MalformedRequest(format!(
            "{:?} is not an http(s) endpoint",
            config.api_url
        )));
    }

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("url", &format!("*.{}/*", domain))
            .append_pair("output", &config.output)
            .append_pair("fl", "original");
        if !config.collapse.is_empty() {
            query.append_pair("collapse", &config.collapse);
        }
        query.append_pair("limit", &config.max_results.to_string());
    }

    Ok(url)
}

// region:        --- Transport

#[async_trait]
pub trait Transport: Send + Sync {
    /// Body of a successful GET. Non 2xx statuses are errors.
    async fn get(&self, url: &Url) -> Result<String>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        debug!("HTTP Client created: {:?}", client);

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(name = "HTTP_request", level = "debug", skip_all, fields(url = %url))]
    async fn get(&self, url: &Url) -> Result<String> {
        debug!("Sending request");
        let res = match self.client.get(url.clone()).send().await {
            Ok(res) => res,
            Err(err) => {
                error!("Reason: {}", err);
                return Err(Error::Reqwest(err));
            }
        };

        info!("{:12} - {}", "HTTP STATUS", res.status());
        if !res.status().is_success() {
            return Err(Error::HttpStatus(res.status().as_u16()));
        }

        Ok(res.text().await?)
    }
}

// endregion:     --- Transport

// region:        --- Delay

#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// endregion:     --- Delay

pub struct CdxFetcher<'a> {
    transport: &'a dyn Transport,
    delay: &'a dyn Delay,
    observer: &'a dyn PipelineObserver,
}

impl<'a> CdxFetcher<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        delay: &'a dyn Delay,
        observer: &'a dyn PipelineObserver,
    ) -> Self {
        Self {
            transport,
            delay,
            observer,
        }
    }

    /// Raw CDX body for `domain`, retried on transient failures.
    pub async fn fetch(&self, domain: &Domain, config: &FetchConfig) -> Result<String> {
        let url = query_url(domain, config)?;
        let max_attempts = config.max_attempts();
        let mut attempt = 1;

        loop {
            self.observer.fetch_started(&url, attempt, max_attempts);

            match self.transport.get(&url).await {
                Ok(body) => {
                    self.observer.fetch_completed(body.len(), attempt);
                    return Ok(body);
                }
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) if attempt >= max_attempts => {
                    return Err(Error::FetchExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    self.observer
                        .fetch_retry(attempt, max_attempts, &err, config.retry_delay);
                    self.delay.wait(config.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{Delay, Transport};
    use crate::{Error, Result};
    use async_trait::async_trait;
    use reqwest::Url;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned responses, then keeps failing with 503.
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String>>>,
        pub requests: Mutex<Vec<Url>>,
    }

    impl ScriptedTransport {
        pub fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn ok(body: &str) -> Self {
            Self::new(vec![Ok(body.to_string())])
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &Url) -> Result<String> {
            self.requests.lock().unwrap().push(url.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(Error::HttpStatus(503)))
        }
    }

    #[derive(Default)]
    pub struct RecordingDelay {
        pub waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn wait(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }
}
