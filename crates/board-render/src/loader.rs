//! Asynchronous content loading with a cross-origin fallback.
//!
//! A direct fetch is tried first. Hosts whose direct path fails under
//! cross-origin restrictions provide a second path that does not need the
//! restrictive mode (e.g. a proxy or re-encoding through an intermediate
//! canvas). Failure is reported only when both paths fail.

use crate::surface::Pixels;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("fetch {url} failed: {reason}")]
    Fetch { url: String, reason: String },
    #[error("blocked by cross-origin policy: {url}")]
    CrossOrigin { url: String },
    #[error("decode {url} failed: {reason}")]
    Decode { url: String, reason: String },
    #[error("could not load {url} (direct: {direct}; fallback: {fallback})")]
    Exhausted {
        url: String,
        direct: Box<LoadError>,
        fallback: Box<LoadError>,
    },
}

/// Which path produced the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPath {
    Direct,
    Fallback,
}

/// Host-provided content fetch + decode.
#[allow(async_fn_in_trait)]
pub trait ContentLoader {
    /// Fetch and decode with the surface's default (possibly
    /// cross-origin-restricted) mode.
    async fn fetch_direct(&self, url: &str) -> Result<Pixels, LoadError>;

    /// Fetch through a path that does not require the restrictive mode.
    async fn fetch_fallback(&self, url: &str) -> Result<Pixels, LoadError>;
}

/// Load `url`, falling back once if the direct path fails.
pub async fn load_content<L: ContentLoader>(
    loader: &L,
    url: &str,
) -> Result<(Pixels, LoadPath), LoadError> {
    let direct = match loader.fetch_direct(url).await {
        Ok(pixels) => return Ok((pixels, LoadPath::Direct)),
        Err(e) => e,
    };
    log::debug!("direct load of {url} failed ({direct}), trying fallback");

    match loader.fetch_fallback(url).await {
        Ok(pixels) => Ok((pixels, LoadPath::Fallback)),
        Err(fallback) => Err(LoadError::Exhausted {
            url: url.to_string(),
            direct: Box::new(direct),
            fallback: Box::new(fallback),
        }),
    }
}

/// Decode an encoded raster (PNG) into RGBA8 pixels.
pub fn decode_pixels(url: &str, bytes: &[u8]) -> Result<Pixels, LoadError> {
    let img = image::load_from_memory(bytes).map_err(|e| LoadError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Pixels::new(width, height, rgba.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Scripted loader: each path either succeeds with a 1x1 pixel or fails.
    struct Scripted {
        direct_ok: bool,
        fallback_ok: bool,
        calls: RefCell<Vec<&'static str>>,
    }

    impl ContentLoader for Scripted {
        async fn fetch_direct(&self, url: &str) -> Result<Pixels, LoadError> {
            self.calls.borrow_mut().push("direct");
            if self.direct_ok {
                Ok(Pixels::solid(1, 1, [255, 0, 0, 255]))
            } else {
                Err(LoadError::CrossOrigin { url: url.into() })
            }
        }

        async fn fetch_fallback(&self, url: &str) -> Result<Pixels, LoadError> {
            self.calls.borrow_mut().push("fallback");
            if self.fallback_ok {
                Ok(Pixels::solid(1, 1, [0, 255, 0, 255]))
            } else {
                Err(LoadError::Fetch {
                    url: url.into(),
                    reason: "404".into(),
                })
            }
        }
    }

    fn scripted(direct_ok: bool, fallback_ok: bool) -> Scripted {
        Scripted {
            direct_ok,
            fallback_ok,
            calls: RefCell::new(Vec::new()),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn direct_success_skips_fallback() {
        let loader = scripted(true, true);
        let (_, path) = load_content(&loader, "https://cdn.test/a.png").await.unwrap();
        assert_eq!(path, LoadPath::Direct);
        assert_eq!(*loader.calls.borrow(), vec!["direct"]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn cross_origin_failure_uses_fallback() {
        let loader = scripted(false, true);
        let (pixels, path) = load_content(&loader, "https://cdn.test/a.png").await.unwrap();
        assert_eq!(path, LoadPath::Fallback);
        assert_eq!(pixels.pixel(0, 0), [0, 255, 0, 255]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn both_paths_failing_reports_both_reasons() {
        let loader = scripted(false, false);
        let err = load_content(&loader, "https://cdn.test/a.png").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cross-origin"), "{msg}");
        assert!(msg.contains("404"), "{msg}");
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_pixels("mem://x", b"not a png").unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }
}
