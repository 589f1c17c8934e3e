//! Sitemap parsing.
//!
//! Handles `<urlset>` documents, `<sitemapindex>` documents pointing at
//! further sitemaps, plain-text URL lists, and `Sitemap:` lines in
//! robots.txt.

use std::collections::HashSet;

use quick_xml::events::Event;
use url::Url;

pub const SITEMAP_PATH: &str = "/sitemap.xml";

/// Page URLs and nested sitemap URLs found in one sitemap document.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Sitemap {
    pub pages: Vec<Url>,
    pub nested: Vec<Url>,
}

impl Sitemap {
    pub fn parse(body: &str) -> Self {
        let trimmed = body.trim_start();
        if trimmed.starts_with('<') || body.contains("<loc>") {
            Self::parse_xml(body)
        } else {
            Self::parse_plain(body)
        }
    }

    fn parse_xml(body: &str) -> Self {
        let mut reader = quick_xml::Reader::from_str(body);
        let mut sitemap = Sitemap::default();
        let mut seen = HashSet::new();
        let mut in_index_entry = false;
        let mut loc: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"sitemap" => in_index_entry = true,
                    b"loc" => loc = Some(String::new()),
                    _ => {}
                },
                Ok(Event::Text(t)) => {
                    if let Some(loc) = loc.as_mut() {
                        match t.decode() {
                            Ok(text) => loc.push_str(&text),
                            Err(e) => tracing::debug!("[SITEMAP] Undecodable <loc> text: {}", e),
                        }
                    }
                }
                Ok(Event::CData(t)) => {
                    if let Some(loc) = loc.as_mut() {
                        loc.push_str(&String::from_utf8_lossy(&t));
                    }
                }
                Ok(Event::GeneralRef(r)) => {
                    if let (Some(loc), Ok(name)) = (loc.as_mut(), r.decode()) {
                        loc.push_str(unescape_entity(&name));
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"sitemap" => in_index_entry = false,
                    b"loc" => {
                        if let Some(url) = loc.take().and_then(|raw| web_url(raw.trim())) {
                            let target = if in_index_entry {
                                &mut sitemap.nested
                            } else {
                                &mut sitemap.pages
                            };
                            push_unique(target, &mut seen, url);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    tracing::warn!(
                        "[SITEMAP] Malformed XML at byte {}: {}",
                        reader.buffer_position(),
                        e
                    );
                    break;
                }
                _ => {}
            }
        }
        sitemap
    }

    fn parse_plain(body: &str) -> Self {
        let mut sitemap = Sitemap::default();
        let mut seen = HashSet::new();
        for url in body.split_whitespace().filter_map(web_url) {
            push_unique(&mut sitemap.pages, &mut seen, url);
        }
        sitemap
    }
}

/// Default sitemap location for the site `start_url` belongs to.
pub fn default_location(start_url: &Url) -> Option<Url> {
    start_url.join(SITEMAP_PATH).ok()
}

/// Sitemaps declared with `Sitemap:` lines in a robots.txt body.
pub fn robots_sitemaps(robots_txt: &str) -> Vec<Url> {
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    for line in robots_txt.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("sitemap") {
            if let Some(url) = web_url(value.trim()) {
                push_unique(&mut found, &mut seen, url);
            }
        }
    }
    found
}

fn web_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

fn push_unique(urls: &mut Vec<Url>, seen: &mut HashSet<Url>, url: Url) {
    if seen.insert(url.clone()) {
        urls.push(url);
    }
}

fn unescape_entity(name: &str) -> &'static str {
    match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(urls: &[Url]) -> Vec<&str> {
        urls.iter().map(Url::as_str).collect()
    }

    #[test]
    fn urlset_pages() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc><lastmod>2024-01-01</lastmod></url>
  <url><loc>
    https://example.com/about
  </loc></url>
  <url><loc>https://example.com/</loc></url>
</urlset>"#;
        let sitemap = Sitemap::parse(body);
        assert_eq!(
            strs(&sitemap.pages),
            vec!["https://example.com/", "https://example.com/about"]
        );
        assert!(sitemap.nested.is_empty());
    }

    #[test]
    fn index_lists_nested_sitemaps() {
        let body = r#"<sitemapindex>
  <sitemap><loc>https://example.com/posts.xml</loc></sitemap>
  <sitemap><loc>https://example.com/pages.xml</loc></sitemap>
</sitemapindex>"#;
        let sitemap = Sitemap::parse(body);
        assert!(sitemap.pages.is_empty());
        assert_eq!(
            strs(&sitemap.nested),
            vec!["https://example.com/posts.xml", "https://example.com/pages.xml"]
        );
    }

    #[test]
    fn escaped_query_strings() {
        let body = "<urlset><url><loc>https://example.com/list?page=2&amp;sort=new</loc></url></urlset>";
        let sitemap = Sitemap::parse(body);
        assert_eq!(
            strs(&sitemap.pages),
            vec!["https://example.com/list?page=2&sort=new"]
        );
    }

    #[test]
    fn plain_text_list_skips_non_web_urls() {
        let body = "https://example.com/a\nftp://example.com/file\nnot-a-url\nhttps://example.com/b\n";
        let sitemap = Sitemap::parse(body);
        assert_eq!(
            strs(&sitemap.pages),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn empty_and_broken_input() {
        assert_eq!(Sitemap::parse(""), Sitemap::default());
        let partial = Sitemap::parse("<urlset><url><loc>https://example.com/</loc></url><url><loc>");
        assert_eq!(strs(&partial.pages), vec!["https://example.com/"]);
    }

    #[test]
    fn large_urlset_is_parsed_in_order() {
        let mut body = String::from("<urlset>");
        for i in 0..50_000 {
            body.push_str(&format!("<url><loc>https://example.com/p/{}</loc></url>", i));
        }
        body.push_str("<url><loc>https://example.com/p/7</loc></url></urlset>");

        let started = std::time::Instant::now();
        let sitemap = Sitemap::parse(&body);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(sitemap.pages.len(), 50_000);
        assert_eq!(sitemap.pages[49_999].path(), "/p/49999");
    }

    #[test]
    fn robots_txt_declarations() {
        let robots = "User-agent: *\nDisallow: /admin\nSitemap: https://example.com/s1.xml\nsitemap:https://example.com/s2.xml\n";
        assert_eq!(
            strs(&robots_sitemaps(robots)),
            vec!["https://example.com/s1.xml", "https://example.com/s2.xml"]
        );
    }

    #[test]
    fn default_location_is_site_root() {
        let start = Url::parse("https://example.com/blog/post").unwrap();
        assert_eq!(
            default_location(&start).unwrap().as_str(),
            "https://example.com/sitemap.xml"
        );
    }
}
