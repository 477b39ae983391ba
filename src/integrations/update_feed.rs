// src/integrations/update_feed.rs
//
// Auto-update transport.
//
// ARCHITECTURE:
// - `UpdateTransport` is what the update provider talks to
// - `HttpUpdateFeed` checks an update.electronjs.org-style feed over HTTP
//   (204 = up to date, 200 + JSON = release available)
// - Downloading and installing belong to the platform installer

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

pub const DEFAULT_UPDATE_SERVER: &str = "https://update.electronjs.org";
pub const DEFAULT_UPDATE_REPOSITORY: &str = "Venipa/ytmdesktop2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    UpToDate,
    Available {
        name: Option<String>,
        notes: Option<String>,
        url: Option<String>,
        /// Whether the release is already staged for install.
        downloaded: bool,
    },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    fn set_feed_url(&self, url: &str);
    async fn check_for_updates(&self) -> AppResult<UpdateCheck>;
    fn quit_and_install(&self) -> AppResult<()>;
}

/// `{server}/{repository}/{platform}-{arch}/{version}`
pub fn feed_url(server: &str, repository: &str, platform: &str, arch: &str, version: &str) -> String {
    format!(
        "{}/{}/{}-{}/{}",
        server.trim_end_matches('/'),
        repository.trim_matches('/'),
        platform,
        arch,
        version
    )
}

/// Release payload of the feed
#[derive(Debug, Deserialize)]
struct FeedRelease {
    name: Option<String>,
    notes: Option<String>,
    url: Option<String>,
}

pub struct HttpUpdateFeed {
    http_client: Client,
    feed_url: RwLock<Option<String>>,
}

impl HttpUpdateFeed {
    pub fn new() -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("ytmdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            feed_url: RwLock::new(None),
        })
    }

    pub fn feed(&self) -> Option<String> {
        self.feed_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl UpdateTransport for HttpUpdateFeed {
    fn set_feed_url(&self, url: &str) {
        *self.feed_url.write().unwrap_or_else(PoisonError::into_inner) = Some(url.to_string());
    }

    async fn check_for_updates(&self) -> AppResult<UpdateCheck> {
        let url = self
            .feed()
            .ok_or_else(|| AppError::Integration("update feed URL not configured".to_string()))?;

        let response = self
            .http_client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::Integration(format!("Update feed request failed: {}", e)))?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(UpdateCheck::UpToDate),
            status if status.is_success() => {
                let release: FeedRelease = response.json().await.map_err(|e| {
                    AppError::Integration(format!("Failed to parse update feed: {}", e))
                })?;
                Ok(UpdateCheck::Available {
                    name: release.name,
                    notes: release.notes,
                    url: release.url,
                    downloaded: false,
                })
            }
            status => Err(AppError::Integration(format!(
                "Update feed returned status: {}",
                status
            ))),
        }
    }

    fn quit_and_install(&self) -> AppResult<()> {
        Err(AppError::Integration(
            "installing is handled by the platform installer".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url_format() {
        assert_eq!(
            feed_url("https://update.electronjs.org/", "Venipa/ytmdesktop2", "linux", "x86_64", "0.1.0"),
            "https://update.electronjs.org/Venipa/ytmdesktop2/linux-x86_64/0.1.0"
        );
    }

    #[tokio::test]
    async fn test_check_without_feed_url_fails() {
        let feed = HttpUpdateFeed::new().unwrap();
        assert!(feed.feed().is_none());
        let err = feed.check_for_updates().await.unwrap_err();
        assert!(matches!(err, AppError::Integration(_)));
    }

    #[test]
    fn test_set_feed_url() {
        let feed = HttpUpdateFeed::new().unwrap();
        feed.set_feed_url("https://example.invalid/feed");
        assert_eq!(feed.feed().as_deref(), Some("https://example.invalid/feed"));
        assert!(feed.quit_and_install().is_err());
    }
}
