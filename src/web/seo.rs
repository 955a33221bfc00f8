use std::sync::Arc;

use axum::{
    extract::State as AxumState,
    http::header,
    response::IntoResponse,
};
use chrono::Utc;

use super::State;

/// Indexable pages with their change frequency and priority
const SITEMAP_PAGES: [(&str, &str, &str); 3] = [
    ("/", "yearly", "1.0"),
    ("/creator-calc", "monthly", "0.8"),
    ("/login", "yearly", "0.5"),
];

pub fn robots_txt(origin: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /dashboard/\nDisallow: /auth/\n\nSitemap: {origin}/sitemap.xml\n"
    )
}

pub fn sitemap_xml(origin: &str, lastmod: &str) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for (path, changefreq, priority) in SITEMAP_PAGES {
        let loc = if path == "/" {
            origin.to_string()
        } else {
            format!("{origin}{path}")
        };
        xml.push_str(&format!(
            "  <url>\n    <loc>{loc}</loc>\n    <lastmod>{lastmod}</lastmod>\n    <changefreq>{changefreq}</changefreq>\n    <priority>{priority}</priority>\n  </url>\n"
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

pub async fn robots(AxumState(state): AxumState<Arc<State>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.to_string())],
        robots_txt(state.config.origin()),
    )
}

pub async fn sitemap(AxumState(state): AxumState<Arc<State>>) -> impl IntoResponse {
    let lastmod = Utc::now().format("%Y-%m-%d").to_string();
    (
        [(header::CONTENT_TYPE, "application/xml".to_string())],
        sitemap_xml(state.config.origin(), &lastmod),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robots_blocks_private_areas() {
        let body = robots_txt("https://eliteinfluencer.in");
        assert!(body.starts_with("User-agent: *\nAllow: /\n"));
        assert!(body.contains("Disallow: /dashboard/\n"));
        assert!(body.contains("Disallow: /auth/\n"));
        assert!(body.ends_with("Sitemap: https://eliteinfluencer.in/sitemap.xml\n"));
    }

    #[test]
    fn sitemap_lists_pages_with_hints() {
        let xml = sitemap_xml("https://site.test", "2026-01-01");
        assert_eq!(xml.matches("<url>").count(), 3);
        assert!(xml.contains("<loc>https://site.test</loc>"));
        assert!(xml.contains(
            "<loc>https://site.test/creator-calc</loc>\n    <lastmod>2026-01-01</lastmod>\n    <changefreq>monthly</changefreq>\n    <priority>0.8</priority>"
        ));
        assert!(xml.contains("<loc>https://site.test/login</loc>"));
    }
}
