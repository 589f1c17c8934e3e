use scraper::{Html, Node, Selector};
use std::sync::OnceLock;
use url::Url;

use crate::domain::models::{DataSource, HeadingElement, ImageElement, LinkElement, PageAnalysis};

/// Raw response data handed to the extractor.
#[derive(Debug, Clone, Copy)]
pub struct ResponseMeta {
    pub status_code: u16,
    pub load_time_ms: u64,
    pub content_size: usize,
}

pub struct PageExtractor;

impl PageExtractor {
    /// Parse an HTML document into a `PageAnalysis` with issues generated.
    pub fn analyze(html: &str, url: &Url, meta: ResponseMeta) -> PageAnalysis {
        let document = Html::parse_document(html);
        let robots = Self::extract_robots_meta(&document);

        let mut page = PageAnalysis {
            url: url.to_string(),
            status_code: meta.status_code,
            title: Self::extract_title(&document),
            meta_description: Self::extract_meta_description(&document),
            meta_keywords: Self::extract_meta_keywords(&document),
            canonical_url: Self::extract_canonical(&document),
            headings: Self::extract_headings(&document),
            word_count: Self::extract_word_count(&document),
            images: Self::extract_images(&document, url),
            links: Self::extract_links(&document, url),
            load_time_ms: meta.load_time_ms,
            content_size: meta.content_size,
            has_viewport: Self::has_viewport(&document),
            has_structured_data: Self::has_structured_data(&document),
            is_https: url.scheme() == "https",
            noindex: robots.is_some_and(|r| r.contains("noindex")),
            issues: Vec::new(),
            source: DataSource::Live,
        };
        page.refresh_issues();
        page
    }

    pub fn extract_title(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("title").unwrap());
        html.select(selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn extract_meta_description(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector =
            SELECTOR.get_or_init(|| Selector::parse("meta[name='description']").unwrap());
        Self::meta_content(html, selector)
    }

    pub fn extract_meta_keywords(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("meta[name='keywords']").unwrap());
        Self::meta_content(html, selector)
    }

    pub fn extract_robots_meta(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("meta[name='robots']").unwrap());
        Self::meta_content(html, selector).map(|s| s.to_lowercase())
    }

    pub fn has_viewport(html: &Html) -> bool {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("meta[name='viewport']").unwrap());
        Self::meta_content(html, selector).is_some()
    }

    pub fn has_structured_data(html: &Html) -> bool {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR
            .get_or_init(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
        html.select(selector).next().is_some()
    }

    fn meta_content(html: &Html, selector: &Selector) -> Option<String> {
        html.select(selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn extract_canonical(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("link[rel='canonical']").unwrap());
        html.select(selector)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Visible body text, skipping script/style/noscript contents.
    pub fn extract_body_text(html: &Html) -> String {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("body").unwrap());

        let Some(body) = html.select(selector).next() else {
            return String::new();
        };

        let mut text = String::new();
        for node in body.descendants() {
            let Node::Text(chunk) = node.value() else {
                continue;
            };
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| e.name()))
                .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
            if !hidden {
                text.push_str(chunk);
                text.push(' ');
            }
        }
        text
    }

    pub fn extract_word_count(html: &Html) -> usize {
        Self::extract_body_text(html).split_whitespace().count()
    }

    pub fn extract_headings(html: &Html) -> Vec<HeadingElement> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());

        html.select(selector)
            .filter_map(|element| {
                let level = element
                    .value()
                    .name()
                    .trim_start_matches('h')
                    .parse::<u8>()
                    .ok()?;
                let text = element
                    .text()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");
                if text.is_empty() {
                    return None;
                }
                Some(HeadingElement { level, text })
            })
            .collect()
    }

    pub fn extract_images(html: &Html, base: &Url) -> Vec<ImageElement> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("img").unwrap());

        html.select(selector)
            .map(|element| {
                let src = element.value().attr("src").unwrap_or("").trim();
                let resolved = base
                    .join(src)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| src.to_string());
                ImageElement {
                    src: resolved,
                    alt: element.value().attr("alt").map(|s| s.trim().to_string()),
                }
            })
            .collect()
    }

    pub fn extract_links(html: &Html, base: &Url) -> Vec<LinkElement> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("a[href]").unwrap());

        static IMG_SELECTOR: OnceLock<Selector> = OnceLock::new();
        let img_selector = IMG_SELECTOR.get_or_init(|| Selector::parse("img").unwrap());

        let mut links = Vec::new();
        for element in html.select(selector) {
            let Some(href) = element.value().attr("href").map(str::trim) else {
                continue;
            };

            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
            {
                continue;
            }

            let Ok(mut resolved) = base.join(href) else {
                continue;
            };
            resolved.set_fragment(None);

            // Anchor text, then aria-label/title, then the alt of a wrapped image
            let mut text = element.text().collect::<String>().trim().to_string();
            if text.is_empty() {
                if let Some(attr) = element
                    .value()
                    .attr("aria-label")
                    .or_else(|| element.value().attr("title"))
                {
                    text = attr.trim().to_string();
                }
            }
            if text.is_empty() {
                if let Some(alt) = element
                    .select(img_selector)
                    .filter_map(|img| img.value().attr("alt"))
                    .map(str::trim)
                    .find(|alt| !alt.is_empty())
                {
                    text = alt.to_string();
                }
            }

            links.push(LinkElement {
                is_internal: Self::same_site(base, &resolved),
                href: resolved.to_string(),
                text: (!text.is_empty()).then_some(text),
                status_code: None,
            });
        }
        links
    }

    pub fn same_site(base: &Url, other: &Url) -> bool {
        base.host_str() == other.host_str() && base.port_or_known_default() == other.port_or_known_default()
    }
}
