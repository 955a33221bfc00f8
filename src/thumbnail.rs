//! Preview images for the work links on a profile page.
//!
//! YouTube links are resolved offline from the video id. Instagram posts need the page
//! itself, so the HTML is fetched and scraped for the Open Graph image, falling back to
//! the thumbnail embedded in the page's JSON. Scraping breaks whenever the markup
//! changes, which is why everything sits behind [`ThumbnailResolver`].

use std::{
    collections::HashMap,
    sync::{Mutex, OnceLock},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

pub const CRAWLER_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

const INSTAGRAM_DOMAIN: &str = "instagram.com";
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const YOUTUBE_ID_LEN: usize = 11;

#[async_trait]
pub trait ThumbnailResolver: Send + Sync {
    /// Best-effort direct image URL for `url`, `None` when nothing can be found
    async fn resolve(&self, url: &str) -> Option<String>;
}

/// Resolve every url concurrently; the output lines up with the input
pub async fn resolve_all<S: AsRef<str>>(
    resolver: &dyn ThumbnailResolver,
    urls: &[S],
) -> Vec<Option<String>> {
    join_all(urls.iter().map(|url| resolver.resolve(url.as_ref()))).await
}

fn youtube_pattern() -> &'static Regex {
    static YOUTUBE: OnceLock<Regex> = OnceLock::new();
    YOUTUBE.get_or_init(|| {
        Regex::new(r"^.*(youtu.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*")
            .expect("static regex")
    })
}

fn embedded_thumbnail_pattern() -> &'static Regex {
    static EMBEDDED: OnceLock<Regex> = OnceLock::new();
    EMBEDDED.get_or_init(|| {
        Regex::new(r#""(?:thumbnail_src|display_url)"\s*:\s*"([^"]+)""#).expect("static regex")
    })
}

fn og_image_selector() -> &'static Selector {
    static OG_IMAGE: OnceLock<Selector> = OnceLock::new();
    OG_IMAGE.get_or_init(|| {
        Selector::parse(r#"meta[property="og:image"]"#).expect("static selector")
    })
}

/// The 11 character video id of a YouTube link
pub fn youtube_id(url: &str) -> Option<&str> {
    let id = youtube_pattern().captures(url)?.get(2)?.as_str();
    (id.len() == YOUTUBE_ID_LEN).then_some(id)
}

pub fn youtube_thumbnail(url: &str) -> Option<String> {
    youtube_id(url).map(|id| format!("https://img.youtube.com/vi/{id}/maxresdefault.jpg"))
}

pub fn is_instagram(url: &str) -> bool {
    url.contains(INSTAGRAM_DOMAIN)
}

/// Content of the first `og:image` meta tag
pub fn extract_og_image(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(og_image_selector())
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

/// Thumbnail field from the JSON blob Instagram inlines into the page
pub fn extract_embedded_thumbnail(html: &str) -> Option<String> {
    let raw = embedded_thumbnail_pattern().captures(html)?.get(1)?.as_str();
    Some(raw.replace(r"&", "&").replace(r"\/", "/"))
}

pub fn extract_thumbnail(html: &str) -> Option<String> {
    extract_og_image(html).or_else(|| extract_embedded_thumbnail(html))
}

struct CacheEntry {
    fetched_at: Instant,
    thumbnail: Option<String>,
}

/// Resolver that talks to the network for Instagram and caches page results for an hour
pub struct HttpThumbnailResolver {
    client: reqwest::Client,
    cache: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl HttpThumbnailResolver {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(CRAWLER_USER_AGENT)
            .build()?;

        Ok(Self::with_client(client, CACHE_TTL))
    }

    pub fn with_client(client: reqwest::Client, ttl: Duration) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn cached(&self, url: &str) -> Option<Option<String>> {
        let cache = self.cache.lock().ok()?;
        cache
            .get(url)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.thumbnail.clone())
    }

    fn remember(&self, url: &str, thumbnail: Option<String>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
            cache.insert(
                url.to_string(),
                CacheEntry {
                    fetched_at: Instant::now(),
                    thumbnail,
                },
            );
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            debug!("Thumbnail page {url} answered {}", response.status());
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }

    async fn resolve_instagram(&self, url: &str) -> Option<String> {
        if let Some(hit) = self.cached(url) {
            return hit;
        }

        match self.fetch_page(url).await {
            Ok(Some(html)) => {
                let thumbnail = extract_thumbnail(&html);
                self.remember(url, thumbnail.clone());
                thumbnail
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to fetch Instagram thumbnail for {url}: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl ThumbnailResolver for HttpThumbnailResolver {
    async fn resolve(&self, url: &str) -> Option<String> {
        if url.is_empty() {
            return None;
        }

        if let Some(thumbnail) = youtube_thumbnail(url) {
            return Some(thumbnail);
        }

        if is_instagram(url) {
            return self.resolve_instagram(url).await;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use axum::{Router, http::StatusCode, routing::get};
    use tokio::net::TcpListener;

    use super::*;

    const VIDEO: &str = "dQw4w9WgXcQ";

    #[test]
    fn youtube_shapes_yield_the_video_id() {
        let urls = [
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ#t=0",
            "https://www.youtube.com/user/somebody#p/u/1/dQw4w9WgXcQ",
        ];
        for url in urls {
            assert_eq!(youtube_id(url), Some(VIDEO), "{url}");
        }
    }

    #[test]
    fn ids_of_the_wrong_length_are_ignored() {
        assert_eq!(youtube_id("https://youtu.be/short"), None);
        assert_eq!(youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQx"), None);
        assert_eq!(youtube_id("https://example.com/page"), None);
    }

    #[test]
    fn youtube_thumbnail_is_built_from_the_id() {
        assert_eq!(
            youtube_thumbnail("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
        );
    }

    #[test]
    fn og_image_wins_over_embedded_json() {
        let html = r#"<html><head>
            <meta property="og:title" content="post" />
            <meta property="og:image" content="https://cdn.example/og.jpg" />
            </head><body><script>{"thumbnail_src":"https://cdn.example/json.jpg"}</script></body></html>"#;
        assert_eq!(
            extract_thumbnail(html).as_deref(),
            Some("https://cdn.example/og.jpg")
        );
    }

    #[test]
    fn embedded_json_is_unescaped() {
        let html = r#"<script>{"display_url":"https:\/\/cdn.example\/p.jpg?a=1&b=2"}</script>"#;
        assert_eq!(
            extract_thumbnail(html).as_deref(),
            Some("https://cdn.example/p.jpg?a=1&b=2")
        );
        assert_eq!(extract_thumbnail("<html></html>"), None);
    }

    #[tokio::test]
    async fn unknown_and_empty_urls_have_no_thumbnail() {
        let resolver = HttpThumbnailResolver::new().unwrap();
        assert_eq!(resolver.resolve("").await, None);
        assert_eq!(resolver.resolve("https://vimeo.com/12345").await, None);
    }

    #[tokio::test]
    async fn unreachable_instagram_degrades_to_none() {
        let resolver = HttpThumbnailResolver::new().unwrap();
        // Nothing listens on port 9 locally
        let url = "http://127.0.0.1:9/instagram.com/p/abc/";
        assert_eq!(resolver.resolve(url).await, None);
    }

    async fn serve(hits: Arc<AtomicUsize>) -> String {
        let og_hits = hits.clone();
        let app = Router::new()
            .route(
                "/instagram.com/p/ok/",
                get(move || {
                    og_hits.fetch_add(1, Ordering::SeqCst);
                    async {
                        r#"<html><head><meta property="og:image" content="https://cdn.example/ok.jpg"></head></html>"#
                    }
                }),
            )
            .route(
                "/instagram.com/p/gone/",
                get(|| async { (StatusCode::NOT_FOUND, "gone") }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }

    #[tokio::test]
    async fn instagram_pages_are_scraped_and_cached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(hits.clone()).await;
        let resolver = HttpThumbnailResolver::new().unwrap();

        let url = format!("{base}/instagram.com/p/ok/");
        for _ in 0..2 {
            assert_eq!(
                resolver.resolve(&url).await.as_deref(),
                Some("https://cdn.example/ok.jpg")
            );
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let missing = format!("{base}/instagram.com/p/gone/");
        assert_eq!(resolver.resolve(&missing).await, None);
    }

    #[tokio::test]
    async fn resolve_all_keeps_input_order() {
        let resolver = HttpThumbnailResolver::new().unwrap();
        let urls = [
            "https://example.com/not-a-video",
            "https://youtu.be/aaaaaaaaaaa",
            "",
            "https://www.youtube.com/watch?v=bbbbbbbbbbb",
        ];

        let thumbnails = resolve_all(&resolver, &urls).await;
        assert_eq!(
            thumbnails,
            vec![
                None,
                Some("https://img.youtube.com/vi/aaaaaaaaaaa/maxresdefault.jpg".to_string()),
                None,
                Some("https://img.youtube.com/vi/bbbbbbbbbbb/maxresdefault.jpg".to_string()),
            ]
        );
    }
}
