//! Byte acquisition for inventory sources: local files and HTTP(S) URLs.

use crate::error::{InventoryError, Result};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for fetching remote sources.
///
/// Deserializable so hosts can embed it in their own configuration files;
/// durations are given in (fractional) seconds and missing fields keep their
/// defaults.
///
/// ```
/// use doc_inventory::FetchPolicy;
///
/// let policy: FetchPolicy = toml::from_str("timeout = 2.5\nattempts = 5").unwrap();
/// assert_eq!(policy.attempts, 5);
/// assert_eq!(policy.backoff, FetchPolicy::default().backoff);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchPolicy {
    /// Timeout for a single request.
    #[serde(deserialize_with = "deserialize_secs")]
    pub timeout: Duration,
    /// Total number of requests before giving up (at least one is made).
    pub attempts: u32,
    /// Base delay; the delay before attempt `k + 1` is `k * backoff`.
    #[serde(deserialize_with = "deserialize_secs")]
    pub backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

fn deserialize_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

/// Where inventory bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Local(PathBuf),
    Url(String),
}

impl Source {
    /// Classify a source string. `http://` and `https://` prefixes denote URLs;
    /// anything else is a local path, with a leading `~` expanded.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Url(source.to_string())
        } else {
            Self::Local(expand_tilde(source))
        }
    }

    /// Final path component, used to infer the format.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            Self::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                let (_, leaf) = split_url(path)?;
                (!leaf.is_empty()).then_some(leaf)
            }
        }
    }

    /// Root url derivable from the source itself. Only URLs have one.
    pub fn root_url(&self) -> Option<String> {
        match self {
            Self::Local(_) => None,
            Self::Url(url) => split_url(url).map(|(root, _)| root),
        }
    }

    /// Read all bytes, retrying remote fetches according to `policy`.
    pub fn read(&self, policy: &FetchPolicy) -> Result<Vec<u8>> {
        match self {
            Self::Local(path) => std::fs::read(path).map_err(|e| InventoryError::io(path, e)),
            Self::Url(url) => fetch(url, policy),
        }
    }
}

enum AttemptError {
    Request(ureq::Error),
    Body(std::io::Error),
}

/// GET `url`, retrying with linearly increasing delays.
fn fetch(url: &str, policy: &FetchPolicy) -> Result<Vec<u8>> {
    let agent = ureq::AgentBuilder::new().timeout(policy.timeout).build();
    let attempts = policy.attempts.max(1);

    let mut attempt = 1;
    loop {
        debug!("Fetching {} (attempt {}/{})", url, attempt, attempts);
        let error = match fetch_once(&agent, url) {
            Ok(bytes) => return Ok(bytes),
            Err(error) => error,
        };

        if attempt >= attempts {
            return Err(match error {
                AttemptError::Request(e) => InventoryError::from(e),
                AttemptError::Body(e) => InventoryError::io(url, e),
            });
        }

        let delay = retry_delay(policy, attempt);
        match &error {
            AttemptError::Request(e) => warn!("Fetching {} failed: {}; retrying in {:?}", url, e, delay),
            AttemptError::Body(e) => {
                warn!("Reading {} failed: {}; retrying in {:?}", url, e, delay)
            }
        }
        std::thread::sleep(delay);
        attempt += 1;
    }
}

/// Delay after failed attempt `attempt` (1-based), saturating on overflow.
fn retry_delay(policy: &FetchPolicy, attempt: u32) -> Duration {
    policy.backoff.saturating_mul(attempt)
}

fn fetch_once(agent: &ureq::Agent, url: &str) -> std::result::Result<Vec<u8>, AttemptError> {
    let response = agent.get(url).call().map_err(AttemptError::Request)?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(AttemptError::Body)?;
    Ok(bytes)
}

/// Split a URL into root and leaf at the last `/` after the scheme.
///
/// The root keeps its trailing slash so relative uris can be appended
/// directly. Returns `None` if `url` has no scheme.
///
/// ```
/// use doc_inventory::split_url;
///
/// let (root, leaf) = split_url("https://docs.python.org/3/objects.inv").unwrap();
/// assert_eq!(root, "https://docs.python.org/3/");
/// assert_eq!(leaf, "objects.inv");
/// ```
pub fn split_url(url: &str) -> Option<(String, String)> {
    let scheme_end = url.find("://")? + 3;
    match url[scheme_end..].rfind('/') {
        Some(index) => {
            let split = scheme_end + index + 1;
            Some((url[..split].to_string(), url[split..].to_string()))
        }
        None => Some((format!("{}/", url), String::new())),
    }
}

/// Local path for an inventory source string, with a leading `~` or `~/`
/// replaced by the home directory. Other paths, and `~` when no home
/// directory is known, are taken literally.
pub fn expand_tilde(path: &str) -> PathBuf {
    let home_relative = match path {
        "~" => Some(""),
        _ => path.strip_prefix("~/"),
    };
    match (home_relative, dirs::home_dir()) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
