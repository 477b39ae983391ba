// Accent color of track artwork.

use async_trait::async_trait;

use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccentResolver: Send + Sync {
    /// Vibrant swatch of the image at `image_url` as `#rrggbb`.
    async fn accent_hex(&self, image_url: &str) -> AppResult<Option<String>>;
}
