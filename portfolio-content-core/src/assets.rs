//! Asset URL resolution.
//!
//! The delivery API hands out protocol-relative file URLs (`//images.ctfassets.net/...`).
//! Anything passed on to an image consumer goes through here first.

use crate::model::ImageAsset;

/// Rewrites a protocol-relative URL to explicit HTTPS; other URLs are returned unchanged.
pub fn resolve_url(url: &str) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

/// URL of an image asset, or `None` when the asset, its file or the file URL is absent.
pub fn resolve_image_url(asset: Option<&ImageAsset>) -> Option<String> {
    let url = asset?.file.as_ref()?.url.as_deref()?;
    Some(resolve_url(url))
}
