use crate::error::{MirrorError, Result};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HOST};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Header telling the origin which public host the request is for.
pub const FORWARDED_HOST: &str = "X-Forwarded-Host";

/// What the crawler needs back from a single GET.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
    /// `charset` parameter of the `Content-Type` header, if any
    pub declared_encoding: Option<String>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only content declared as UTF-8 is treated as text.
    pub fn is_text(&self) -> bool {
        self.declared_encoding
            .as_deref()
            .is_some_and(|enc| enc.eq_ignore_ascii_case("utf-8") || enc.eq_ignore_ascii_case("utf8"))
    }
}

/// Source of page content for the crawler.
///
/// Implementations report the status as-is; deciding that a status is fatal is
/// the crawler's job.
pub trait Transport {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<FetchResponse>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<FetchResponse>> {
        (**self).fetch(path)
    }
}

/// Fetches paths from an upstream address while presenting the mirrored host.
///
/// The upstream is usually a port-forward or internal service in front of the
/// site; the `Host` and `X-Forwarded-Host` headers make it answer as the public
/// site would.
pub struct HttpTransport {
    client: Client,
    upstream: String,
    host: String,
}

impl HttpTransport {
    pub fn new(upstream: &str, host: &str) -> Result<Self> {
        Self::with_timeout(upstream, host, 30)
    }

    pub fn with_timeout(upstream: &str, host: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("Stasis/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            // Redirects point at the public host, never follow them
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        url::Url::parse(upstream)
            .map_err(|e| MirrorError::InvalidUrl(format!("{}: {}", upstream, e)))?;

        Ok(Self {
            client,
            upstream: upstream.trim_end_matches('/').to_string(),
            host: host.to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.upstream, path)
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl Transport for HttpTransport {
    async fn fetch(&self, path: &str) -> Result<FetchResponse> {
        let url = self.url_for(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(HOST, &self.host)
            .header(FORWARDED_HOST, &self.host)
            .send()
            .await?;

        let status = response.status().as_u16();
        let declared_encoding = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);
        let body = response.bytes().await?.to_vec();

        Ok(FetchResponse {
            url,
            status,
            body,
            declared_encoding,
        })
    }
}

/// Pull the `charset` parameter out of a `Content-Type` value.
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}
