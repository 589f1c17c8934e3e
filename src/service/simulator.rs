//! Synthetic data generator.
//!
//! Used when a live fetch is impossible. Every value is picked pseudo-randomly
//! from fixed template lists; records are tagged `DataSource::Simulated` so the
//! dashboard can say so.

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use url::Url;

use crate::config::SimulationConfig;
use crate::domain::models::{
    Competition, DataSource, HeadingElement, ImageElement, KeywordIdea, LinkElement,
    PageAnalysis, SearchIntent,
};

const TOPICS: &[&str] = &[
    "Digital Marketing",
    "Web Design",
    "Software Development",
    "Cloud Hosting",
    "E-commerce",
    "Analytics",
    "Content Strategy",
    "Consulting",
];

const TITLE_TEMPLATES: &[&str] = &[
    "{brand} | Home",
    "Welcome to {brand}",
    "{brand} - Professional {topic} Services",
    "About Us - {brand}",
    "{topic} Guide: Everything You Need to Know",
    "Contact {brand} Today",
    "Best {topic} Tips and Best Practices for Growing Businesses",
    "{topic}",
    "{brand} Blog - Latest {topic} News, Insights and Updates From Our Team",
];

const DESCRIPTION_TEMPLATES: &[&str] = &[
    "{brand} offers expert {topic} solutions for businesses of every size. Get in touch to learn more.",
    "Discover how {brand} can help you with {topic}.",
    "Learn everything about {topic} with our in-depth guides, tutorials and case studies written by industry experts at {brand}.",
    "Official website of {brand}.",
    "Looking for reliable {topic}? {brand} has helped hundreds of clients improve results with proven methods and transparent pricing.",
];

const H1_TEMPLATES: &[&str] = &[
    "Welcome to {brand}",
    "{topic} That Delivers Results",
    "About {brand}",
    "Our {topic} Services",
    "Get in Touch",
];

const H2_TEMPLATES: &[&str] = &[
    "Why Choose Us",
    "Our Services",
    "What Our Clients Say",
    "Latest Articles",
    "How It Works",
    "Pricing Plans",
    "Frequently Asked Questions",
    "Meet the Team",
];

const H3_TEMPLATES: &[&str] = &[
    "Fast Turnaround",
    "Dedicated Support",
    "Transparent Pricing",
    "Proven Track Record",
    "Step 1: Consultation",
    "Step 2: Strategy",
];

const PATHS: &[&str] = &[
    "/about",
    "/services",
    "/blog",
    "/contact",
    "/pricing",
    "/products",
    "/faq",
    "/blog/getting-started",
    "/team",
    "/careers",
    "/privacy-policy",
    "/case-studies",
];

const EXTERNAL_HOSTS: &[&str] = &[
    "https://twitter.com/",
    "https://www.linkedin.com/",
    "https://www.facebook.com/",
    "https://github.com/",
    "https://www.youtube.com/",
];

const LINK_TEXTS: &[&str] = &[
    "Learn more",
    "Read more",
    "Our services",
    "Contact us",
    "click here",
    "View pricing",
    "Blog",
];

/// Keyword modifiers. `{}` is replaced by the seed keyword.
const KEYWORD_MODIFIERS: &[(&str, SearchIntent)] = &[
    ("{}", SearchIntent::Informational),
    ("what is {}", SearchIntent::Informational),
    ("how to use {}", SearchIntent::Informational),
    ("{} guide", SearchIntent::Informational),
    ("{} tutorial", SearchIntent::Informational),
    ("{} examples", SearchIntent::Informational),
    ("why {} matters", SearchIntent::Informational),
    ("best {}", SearchIntent::Commercial),
    ("top {} tools", SearchIntent::Commercial),
    ("{} reviews", SearchIntent::Commercial),
    ("{} vs alternatives", SearchIntent::Commercial),
    ("{} comparison", SearchIntent::Commercial),
    ("buy {}", SearchIntent::Transactional),
    ("{} pricing", SearchIntent::Transactional),
    ("cheap {}", SearchIntent::Transactional),
    ("{} services", SearchIntent::Transactional),
    ("{} near me", SearchIntent::Transactional),
    ("{} login", SearchIntent::Navigational),
    ("{} official site", SearchIntent::Navigational),
    ("{} app", SearchIntent::Navigational),
];

pub struct Simulator {
    rng: Mutex<StdRng>,
    min_latency_ms: u64,
    max_latency_ms: u64,
}

impl Simulator {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            min_latency_ms: config.min_latency_ms,
            max_latency_ms: config.max_latency_ms.max(config.min_latency_ms),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(&SimulationConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    /// Artificial delay used to pace simulated progress.
    pub fn latency(&self) -> Duration {
        if self.max_latency_ms == 0 {
            return Duration::ZERO;
        }
        let ms = self.with_rng(|rng| rng.gen_range(self.min_latency_ms..=self.max_latency_ms));
        Duration::from_millis(ms)
    }

    /// Display brand derived from the host, e.g. `shop.acme-tools.com` -> `Acme Tools`.
    pub fn brand_for(url: &Url) -> String {
        let host = url.host_str().unwrap_or("example.com");
        let labels: Vec<&str> = host.split('.').filter(|l| *l != "www").collect();
        let name = match labels.len() {
            0 => "example",
            1 => labels[0],
            n => labels[n - 2],
        };
        name.split(['-', '_'])
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn fill(template: &str, brand: &str, topic: &str) -> String {
        template.replace("{brand}", brand).replace("{topic}", topic)
    }

    fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
        items.choose(rng).copied().unwrap_or_default()
    }

    /// Fabricate a full page analysis for `url`.
    pub fn page(&self, url: &Url) -> PageAnalysis {
        let brand = Self::brand_for(url);
        let mut page = self.with_rng(|rng| {
            let topic = Self::pick(rng, TOPICS);
            let mut page = PageAnalysis::empty(url.as_str());

            page.status_code = match rng.gen_range(0..100) {
                0..=94 => 200,
                95..=97 => 404,
                _ => 500,
            };

            if rng.gen_bool(0.9) {
                page.title = Some(Self::fill(Self::pick(rng, TITLE_TEMPLATES), &brand, topic));
            }
            if rng.gen_bool(0.8) {
                page.meta_description =
                    Some(Self::fill(Self::pick(rng, DESCRIPTION_TEMPLATES), &brand, topic));
            }
            if rng.gen_bool(0.3) {
                page.meta_keywords = Some(format!(
                    "{}, {}, {}",
                    topic.to_lowercase(),
                    brand.to_lowercase(),
                    Self::pick(rng, TOPICS).to_lowercase()
                ));
            }
            if rng.gen_bool(0.6) {
                page.canonical_url = Some(url.to_string());
            }

            let h1s = match rng.gen_range(0..100) {
                0..=9 => 0,
                10..=84 => 1,
                _ => 2,
            };
            for _ in 0..h1s {
                page.headings.push(HeadingElement {
                    level: 1,
                    text: Self::fill(Self::pick(rng, H1_TEMPLATES), &brand, topic),
                });
            }
            for _ in 0..rng.gen_range(2..=6) {
                page.headings.push(HeadingElement {
                    level: 2,
                    text: Self::pick(rng, H2_TEMPLATES).to_string(),
                });
                if rng.gen_bool(0.4) {
                    page.headings.push(HeadingElement {
                        level: 3,
                        text: Self::pick(rng, H3_TEMPLATES).to_string(),
                    });
                }
            }

            page.word_count = rng.gen_range(80..=2500);

            for i in 0..rng.gen_range(0..=12) {
                let alt = if rng.gen_bool(0.75) {
                    Some(format!("{} image {}", topic, i + 1))
                } else {
                    None
                };
                page.images.push(ImageElement {
                    src: url
                        .join(&format!("/images/photo-{}.jpg", i + 1))
                        .map(|u| u.to_string())
                        .unwrap_or_default(),
                    alt,
                });
            }

            for _ in 0..rng.gen_range(5..=20) {
                let path = Self::pick(rng, PATHS);
                page.links.push(LinkElement {
                    href: url.join(path).map(|u| u.to_string()).unwrap_or_default(),
                    text: Some(Self::pick(rng, LINK_TEXTS).to_string()),
                    is_internal: true,
                    status_code: None,
                });
            }
            for _ in 0..rng.gen_range(0..=4) {
                page.links.push(LinkElement {
                    href: Self::pick(rng, EXTERNAL_HOSTS).to_string(),
                    text: None,
                    is_internal: false,
                    status_code: None,
                });
            }

            page.load_time_ms = rng.gen_range(300..=5500);
            page.content_size = rng.gen_range(15_000..=350_000);
            page.has_viewport = rng.gen_bool(0.9);
            page.has_structured_data = rng.gen_bool(0.5);
            page.noindex = rng.gen_bool(0.03);
            page
        });

        page.source = DataSource::Simulated;
        page.refresh_issues();
        page
    }

    /// Fabricate `count` pages of one site, starting with `start` itself.
    pub fn site(&self, start: &Url, count: usize) -> Vec<PageAnalysis> {
        let mut paths: Vec<&str> = PATHS.iter().copied().filter(|p| *p != start.path()).collect();
        self.with_rng(|rng| paths.shuffle(rng));

        let mut pages = Vec::with_capacity(count);
        if count == 0 {
            return pages;
        }
        pages.push(self.page(start));

        for i in 1..count {
            let path = paths[(i - 1) % paths.len()];
            let path = if i > paths.len() {
                format!("{}-{}", path, i / paths.len() + 1)
            } else {
                path.to_string()
            };
            if let Ok(url) = start.join(&path) {
                pages.push(self.page(&url));
            }
        }
        pages
    }

    /// Number of pages a simulated crawl "finds", between 3 and `max_pages`.
    pub fn site_size(&self, max_pages: usize) -> usize {
        if max_pages <= 3 {
            return max_pages;
        }
        self.with_rng(|rng| rng.gen_range(3..=max_pages))
    }

    /// Search volume, difficulty, cpc and 12-month trend for a keyword.
    pub fn keyword_metrics(&self, word_count: usize) -> (u32, u8, f64, Vec<u32>) {
        self.with_rng(|rng| {
            // Longer phrases get less traffic and less competition
            let exponent_max = (5.2 - 0.6 * word_count.saturating_sub(1) as f64).max(1.5);
            let volume = 10f64.powf(rng.gen_range(1.0..exponent_max));
            let volume = ((volume / 10.0).round() * 10.0).max(10.0) as u32;

            let difficulty_max = (100 - 12 * word_count.saturating_sub(1).min(6)) as u8;
            let difficulty = rng.gen_range(1..=difficulty_max);
            let cpc = (rng.gen_range(0.1..15.0) * 100.0_f64).round() / 100.0;

            let base: i32 = 100;
            let trend = (0..12)
                .map(|_| (base + rng.gen_range(-30..=30)) as u32)
                .collect();
            (volume, difficulty, cpc, trend)
        })
    }

    /// Up to `limit` keyword ideas around `seed`, one per modifier template.
    /// The bare seed always comes first.
    pub fn keyword_ideas(&self, seed: &str, limit: usize) -> Vec<KeywordIdea> {
        let mut modifiers: Vec<(&str, SearchIntent)> = KEYWORD_MODIFIERS[1..].to_vec();
        self.with_rng(|rng| modifiers.shuffle(rng));
        modifiers.insert(0, KEYWORD_MODIFIERS[0]);

        modifiers
            .into_iter()
            .take(limit)
            .map(|(template, intent)| {
                let keyword = template.replace("{}", seed);
                let (search_volume, difficulty, cpc, trend) =
                    self.keyword_metrics(keyword.split_whitespace().count());
                KeywordIdea {
                    keyword,
                    search_volume,
                    difficulty,
                    cpc,
                    competition: Competition::from_difficulty(difficulty),
                    intent,
                    trend,
                    source: DataSource::Simulated,
                }
            })
            .collect()
    }

    /// Next position of a tracked keyword, given the previous one.
    pub fn ranking_position(&self, previous: Option<u8>) -> Option<u8> {
        self.with_rng(|rng| match previous {
            None => {
                if rng.gen_bool(0.3) {
                    None
                } else {
                    Some(rng.gen_range(1..=100))
                }
            }
            Some(prev) => {
                if prev > 80 && rng.gen_bool(0.1) {
                    return None;
                }
                let step: i32 = rng.gen_range(-5..=5);
                Some((prev as i32 + step).clamp(1, 100) as u8)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://www.acme-tools.com/").unwrap()
    }

    #[test]
    fn brand_is_derived_from_host() {
        assert_eq!(Simulator::brand_for(&url()), "Acme Tools");
        assert_eq!(
            Simulator::brand_for(&Url::parse("http://localhost:8080/").unwrap()),
            "Localhost"
        );
    }

    #[test]
    fn same_seed_same_output() {
        let a = Simulator::seeded(7).page(&url());
        let b = Simulator::seeded(7).page(&url());
        assert_eq!(a, b);
    }

    #[test]
    fn simulated_pages_are_tagged_and_consistent() {
        let sim = Simulator::seeded(11);
        for _ in 0..50 {
            let page = sim.page(&url());
            assert_eq!(page.source, DataSource::Simulated);
            assert!(page.is_https);
            assert_eq!(page.issues, page.generate_issues());
            assert!((300..=5500).contains(&page.load_time_ms));
            assert!(page.links.iter().filter(|l| l.is_internal).all(|l| l.href.starts_with("https://www.acme-tools.com/")));
        }
    }

    #[test]
    fn site_has_requested_unique_pages() {
        let sim = Simulator::seeded(3);
        let pages = sim.site(&url(), 20);
        assert_eq!(pages.len(), 20);
        assert_eq!(pages[0].url, "https://www.acme-tools.com/");
        let mut urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        urls.sort_unstable();
        urls.dedup();
        assert_eq!(urls.len(), 20);

        assert!(sim.site(&url(), 0).is_empty());
    }

    #[test]
    fn keyword_ideas_follow_templates() {
        let sim = Simulator::seeded(9);
        let ideas = sim.keyword_ideas("rust crawler", 8);
        assert_eq!(ideas.len(), 8);
        assert_eq!(ideas[0].keyword, "rust crawler");
        assert!(ideas.iter().all(|i| i.keyword.contains("rust crawler")));
        assert!(ideas.iter().all(|i| i.source == DataSource::Simulated));
        assert!(ideas.iter().all(|i| i.trend.len() == 12));
        assert!(ideas
            .iter()
            .all(|i| i.competition == Competition::from_difficulty(i.difficulty)));

        let buy = sim
            .keyword_ideas("rust crawler", 100)
            .into_iter()
            .find(|i| i.keyword == "buy rust crawler")
            .unwrap();
        assert_eq!(buy.intent, SearchIntent::Transactional);
        assert_eq!(sim.keyword_ideas("x", 100).len(), KEYWORD_MODIFIERS.len());
    }

    #[test]
    fn site_size_bounds() {
        let sim = Simulator::seeded(5);
        assert_eq!(sim.site_size(1), 1);
        for _ in 0..100 {
            let n = sim.site_size(10);
            assert!((3..=10).contains(&n));
        }
    }

    #[test]
    fn ranking_positions_stay_in_range() {
        let sim = Simulator::seeded(9);
        let mut pos = Some(1);
        for _ in 0..500 {
            pos = sim.ranking_position(pos);
            if let Some(p) = pos {
                assert!((1..=100).contains(&p));
            }
        }
    }

    #[test]
    fn keyword_metrics_are_bounded() {
        let sim = Simulator::seeded(1);
        for words in 1..6 {
            let (volume, difficulty, cpc, trend) = sim.keyword_metrics(words);
            assert!(volume >= 10);
            assert!((1..=100).contains(&difficulty));
            assert!((0.1..=15.0).contains(&cpc));
            assert_eq!(trend.len(), 12);
        }
    }

    #[test]
    fn zero_latency_by_default() {
        assert_eq!(Simulator::seeded(1).latency(), Duration::ZERO);
        let sim = Simulator::new(&SimulationConfig {
            seed: Some(1),
            min_latency_ms: 5,
            max_latency_ms: 10,
            ..Default::default()
        });
        let d = sim.latency();
        assert!(d >= Duration::from_millis(5) && d <= Duration::from_millis(10));
    }
}
