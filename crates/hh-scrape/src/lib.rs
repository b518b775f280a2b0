mod parser;

pub mod export;
pub mod query;
pub mod scraper;
pub mod types;
pub mod utils;

pub use crate::scraper::{FetchStrategy, ScraperError, WebScraper};

pub(crate) const API_BASE_URL: &str = "https://api.hh.ru/vacancies/";
pub(crate) const RESUME_SEARCH_URL: &str = "https://hh.ru/search/resume";
pub(crate) const RESUME_BASE_URL: &str = "https://hh.ru/resume/";
