//! Media asset resolution and downloading.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use url::Url;

use crate::api::types::MediaVersions;
use crate::dedup::{DedupLedger, MediaCategory};
use crate::error::{Error, Result};

/// Per-request deadline for asset downloads. Generous on purpose; there is
/// no retry.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(1000);

/// Kind of a downloadable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Fallback file extension for the kind.
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Photo => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

/// A media payload fragment reduced to its one selected asset.
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedMedia<'a> {
    pub id: &'a str,
    pub kind: MediaKind,
    pub url: &'a str,
}

/// Pick the asset to download: the first video variant when any exist,
/// otherwise the first image candidate.
pub fn resolve_media(media: &MediaVersions) -> Result<ResolvedMedia<'_>> {
    if let Some(video) = media.video_versions.as_ref().and_then(|v| v.first()) {
        return Ok(ResolvedMedia {
            id: &media.id,
            kind: MediaKind::Video,
            url: &video.url,
        });
    }

    if let Some(image) = media
        .image_versions
        .as_ref()
        .and_then(|iv| iv.candidates.first())
    {
        return Ok(ResolvedMedia {
            id: &media.id,
            kind: MediaKind::Photo,
            url: &image.url,
        });
    }

    Err(Error::MediaDownload(format!(
        "No downloadable variant for media {}",
        media.id
    )))
}

/// File extension for a resolved asset: taken from the URL path when it looks
/// like one, the kind's default otherwise.
pub fn asset_extension(resolved: &ResolvedMedia<'_>) -> String {
    if let Ok(parsed) = Url::parse(resolved.url) {
        let ext = parsed
            .path()
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext);
        if let Some(ext) = ext {
            if !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                return ext.to_ascii_lowercase();
            }
        }
    }
    resolved.kind.extension().to_string()
}

/// Blocking downloader for media assets.
pub struct MediaDownloader {
    http: Client,
}

impl MediaDownloader {
    pub fn new(user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// Fetch a URL and write the full response body to `dest`.
    pub fn fetch_to(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self.http.get(url).send()?;
        if !response.status().is_success() {
            return Err(Error::MediaDownload(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }

        let body = response.bytes()?;
        fs::write(dest, &body)?;
        Ok(())
    }

    /// Download one item into `dest_dir` as `<stem>.<ext>`, unless the ledger
    /// already holds its id.
    ///
    /// Returns the written path, or `None` when the item was skipped. The
    /// ledger is updated (and persisted) only after the file is fully
    /// written; a failure in between surfaces to the caller and leaves the
    /// item eligible for a later run.
    pub fn materialize(
        &self,
        ledger: &mut DedupLedger,
        category: MediaCategory,
        media: &MediaVersions,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<Option<PathBuf>> {
        if ledger.contains(category, &media.id) {
            tracing::debug!(id = %media.id, %category, "skipping already-downloaded media");
            return Ok(None);
        }

        let resolved = resolve_media(media)?;
        fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(format!("{}.{}", stem, asset_extension(&resolved)));

        self.fetch_to(resolved.url, &dest)?;
        ledger.mark_downloaded(category, media.id.clone())?;

        Ok(Some(dest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{ImageCandidate, ImageVersions, VideoVersion};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn photo(id: &str, url: &str) -> MediaVersions {
        MediaVersions {
            id: id.to_string(),
            video_versions: None,
            image_versions: Some(ImageVersions {
                candidates: vec![ImageCandidate {
                    url: url.to_string(),
                    width: Some(1080),
                    height: Some(1350),
                }],
            }),
        }
    }

    /// Minimal HTTP server answering every request with `body`.
    fn serve(body: &'static [u8]) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_inner = Arc::clone(&hits);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                hits_inner.fetch_add(1, Ordering::SeqCst);

                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(body);
            }
        });

        (format!("http://{}", addr), hits)
    }

    #[test]
    fn test_video_variant_wins_over_image() {
        let media = MediaVersions {
            id: "m1".to_string(),
            video_versions: Some(vec![
                VideoVersion {
                    url: "http://x/hd.mp4".to_string(),
                    width: None,
                    height: None,
                },
                VideoVersion {
                    url: "http://x/sd.mp4".to_string(),
                    width: None,
                    height: None,
                },
            ]),
            image_versions: Some(ImageVersions {
                candidates: vec![ImageCandidate {
                    url: "http://x/cover.jpg".to_string(),
                    width: None,
                    height: None,
                }],
            }),
        };

        let resolved = resolve_media(&media).unwrap();
        assert_eq!(resolved.kind, MediaKind::Video);
        assert_eq!(resolved.url, "http://x/hd.mp4");
    }

    #[test]
    fn test_photo_uses_first_candidate() {
        let media = photo("m2", "http://x/a.jpg");
        let resolved = resolve_media(&media).unwrap();
        assert_eq!(resolved.kind, MediaKind::Photo);
        assert_eq!(resolved.url, "http://x/a.jpg");
    }

    #[test]
    fn test_no_variant_is_an_error() {
        let media = MediaVersions {
            id: "m3".to_string(),
            video_versions: None,
            image_versions: None,
        };
        assert!(matches!(
            resolve_media(&media),
            Err(Error::MediaDownload(_))
        ));
    }

    #[test]
    fn test_extension_from_url_with_fallback() {
        let media = photo("m4", "http://host/path/img.webp?sig=abc");
        let resolved = resolve_media(&media).unwrap();
        assert_eq!(asset_extension(&resolved), "webp");

        let media = photo("m5", "http://host/opaque-token");
        let resolved = resolve_media(&media).unwrap();
        assert_eq!(asset_extension(&resolved), "jpg");
    }

    #[test]
    fn test_materialize_downloads_once_per_id() {
        let (url, hits) = serve(b"image-bytes");
        let tmp = TempDir::new().unwrap();
        let mut ledger = DedupLedger::load(tmp.path()).unwrap();
        let downloader = MediaDownloader::new("test-agent").unwrap();
        let media = photo("p1", &format!("{}/p1.jpg", url));
        let dest_dir = tmp.path().join("posts").join("post_x");

        let first = downloader
            .materialize(&mut ledger, MediaCategory::Posts, &media, &dest_dir, "0")
            .unwrap();
        let path = first.expect("first call downloads");
        assert_eq!(fs::read(&path).unwrap(), b"image-bytes");

        let second = downloader
            .materialize(&mut ledger, MediaCategory::Posts, &media, &dest_dir, "0")
            .unwrap();
        assert!(second.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // The skip decision survives a fresh session.
        let reloaded = DedupLedger::load(tmp.path()).unwrap();
        assert!(reloaded.contains(MediaCategory::Posts, "p1"));
    }

    #[test]
    fn test_materialize_failure_leaves_ledger_unmarked() {
        let tmp = TempDir::new().unwrap();
        let mut ledger = DedupLedger::load(tmp.path()).unwrap();
        let downloader = MediaDownloader::new("test-agent").unwrap();
        // Nothing listens on this port.
        let media = photo("p2", "http://127.0.0.1:9/p2.jpg");

        let result = downloader.materialize(
            &mut ledger,
            MediaCategory::Posts,
            &media,
            &tmp.path().join("posts"),
            "0",
        );

        assert!(result.is_err());
        assert!(!ledger.contains(MediaCategory::Posts, "p2"));
    }
}
