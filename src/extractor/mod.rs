pub mod keyword_extractor;
pub mod page_extractor;
pub mod sitemap;
