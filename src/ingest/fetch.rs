use rand::seq::SliceRandom;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use std::time::Duration;

use super::ScrapeError;

/// Something that can turn a URL into page HTML.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

// Desktop browsers only; some boards serve a stripped page to unknown agents.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36 Edg/129.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:131.0) Gecko/20100101 Firefox/131.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:130.0) Gecko/20100101 Firefox/130.0",
];

/// Blocking HTTP fetcher with a randomly chosen browser User-Agent.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        if let Some(platform) = platform_hint(user_agent) {
            headers.insert("sec-ch-ua-platform", HeaderValue::from_static(platform));
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        tracing::info!(user_agent = %truncate_agent(user_agent), "http fetcher ready");
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        tracing::debug!(url, "fetching");
        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.text()?)
    }
}

fn truncate_agent(agent: &str) -> String {
    agent.chars().take(50).collect()
}

/// `sec-ch-ua-platform` value matching `agent`. Only Chromium browsers send
/// client hints, so Firefox agents get none.
fn platform_hint(agent: &str) -> Option<&'static str> {
    if agent.contains("Firefox/") {
        return None;
    }
    if agent.contains("Windows") {
        Some("\"Windows\"")
    } else if agent.contains("Macintosh") {
        Some("\"macOS\"")
    } else if agent.contains("Linux") {
        Some("\"Linux\"")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_hint_follows_agent() {
        assert_eq!(platform_hint(USER_AGENTS[0]), Some("\"Linux\""));
        assert_eq!(platform_hint(USER_AGENTS[1]), Some("\"Windows\""));
        assert_eq!(platform_hint(USER_AGENTS[2]), Some("\"macOS\""));
        assert_eq!(platform_hint(USER_AGENTS[3]), None);
        assert_eq!(platform_hint(USER_AGENTS[4]), None);
    }

    #[test]
    fn test_every_agent_builds_valid_headers() {
        for agent in USER_AGENTS {
            if let Some(platform) = platform_hint(agent) {
                assert!(HeaderValue::from_str(platform).is_ok());
            }
        }
    }
}
