use stasis_scanner::error::{MirrorError, Result};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_OUTPUT_DIR: &str = "www";
pub const DEFAULT_TARGET_BASE: &str = "http://localhost:8080/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a mirror run needs, passed explicitly into each phase.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Address requests are actually sent to
    pub upstream: String,
    /// Absolute base URL the site uses in its own content
    pub origin_base: String,
    /// Virtual host presented upstream; defaults to the origin host
    pub host: Option<String>,
    /// Base URL the mirror will be served from
    pub target_base: String,
    pub output_dir: PathBuf,
    pub threads: usize,
    pub timeout_secs: u64,
    /// Wipe a non-empty output directory instead of refusing it
    pub force: bool,
}

impl MirrorConfig {
    pub fn new(upstream: impl Into<String>, origin_base: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into(),
            origin_base: origin_base.into(),
            host: None,
            target_base: DEFAULT_TARGET_BASE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            threads: 1,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            force: false,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_target_base(mut self, target_base: impl Into<String>) -> Self {
        self.target_base = target_base.into();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Check every field and bring base URLs into their canonical form.
    ///
    /// Base URLs must be absolute http(s) URLs and always end with `/`, since
    /// crawled paths are appended to them and searched for right after them.
    pub fn validate(mut self) -> Result<Self> {
        parse_http_url("upstream", &self.upstream)?;
        self.origin_base = with_trailing_slash(parse_http_url("origin", &self.origin_base)?);
        self.target_base = with_trailing_slash(parse_http_url("target", &self.target_base)?);

        if self.threads == 0 {
            return Err(MirrorError::Config("threads must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(MirrorError::Config("timeout must be at least 1 second".to_string()));
        }
        if let Some(ref host) = self.host
            && host.trim().is_empty()
        {
            return Err(MirrorError::Config("host must not be empty".to_string()));
        }

        self.virtual_host()?;
        Ok(self)
    }

    /// Host name sent in the `Host` and `X-Forwarded-Host` headers.
    pub fn virtual_host(&self) -> Result<String> {
        if let Some(ref host) = self.host {
            return Ok(host.clone());
        }
        let origin = parse_http_url("origin", &self.origin_base)?;
        let host = origin
            .host_str()
            .ok_or_else(|| MirrorError::Config(format!("origin {} has no host", self.origin_base)))?;
        Ok(match origin.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }
}

fn parse_http_url(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|e| MirrorError::InvalidUrl(format!("{} {:?}: {}", name, value, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(MirrorError::InvalidUrl(format!(
            "{} {:?}: only http and https are supported",
            name, value
        )));
    }
    Ok(url)
}

fn with_trailing_slash(url: Url) -> String {
    let mut url = url.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
