use crate::parser::{self, ParseError};
use crate::query::{SearchQuery, Surface};
use crate::types::{CandidateProfile, JobPosting};

use reqwest::Client;
use reqwest::header::USER_AGENT;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
}

/// How much of each vacancy to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// One request per search page; records come straight from the list
    /// payload and carry no skills.
    PageOnly,
    /// Follow every list item with a detail request for the full record.
    WithDetails,
}

// The resume pages are served to browsers only; API requests go out with the
// package user agent instead.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_1) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/39.0.2171.95 Safari/537.36";

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    api_base: String,
    search_base: String,
    resume_base: String,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            api_base: crate::API_BASE_URL.to_string(),
            search_base: crate::RESUME_SEARCH_URL.to_string(),
            resume_base: crate::RESUME_BASE_URL.to_string(),
        })
    }

    pub async fn fetch_vacancies(
        &self,
        query: &SearchQuery,
        strategy: FetchStrategy,
    ) -> Result<Vec<JobPosting>, ScraperError> {
        let probe_url = format!(
            "{}?{}",
            self.api_base,
            query.query_string(Surface::VacancyApi, None)
        );
        log::info!("Probing vacancy search: {}", probe_url);
        let probe = parser::parse_vacancy_page(&self.get(&probe_url, false).await?)?;
        log::info!(
            "Search matched {} vacancies across {} page(s)",
            probe.found,
            probe.pages
        );

        let mut postings = Vec::new();
        for page_number in 0..probe.pages {
            let url = format!(
                "{}?{}",
                self.api_base,
                query.query_string(Surface::VacancyApi, Some(page_number))
            );
            log::info!("Fetching vacancy page {}...", page_number);
            let page = parser::parse_vacancy_page(&self.get(&url, false).await?)?;

            for item in page.items {
                match strategy {
                    FetchStrategy::PageOnly => postings.push(parser::vacancy_from_value(item)?),
                    FetchStrategy::WithDetails => {
                        let Some(id) = parser::vacancy_id(&item) else {
                            log::warn!("Skipping a list item without an id on page {page_number}");
                            continue;
                        };
                        if let Some(posting) = self.fetch_vacancy_detail(id).await? {
                            postings.push(posting);
                        }
                    }
                }
            }
        }

        Ok(postings)
    }

    async fn fetch_vacancy_detail(&self, id: &str) -> Result<Option<JobPosting>, ScraperError> {
        let url = format!("{}{}", self.api_base, id);
        log::debug!("Fetching vacancy {}: {}", id, url);
        let body = self.get(&url, false).await?;
        let value: Value = serde_json::from_str(&body).map_err(ParseError::from)?;

        // Challenge interstitials decode as JSON but carry no id. One bad
        // record must not abort the page.
        if parser::vacancy_id(&value).is_none() {
            log::warn!("Skipping vacancy {}: challenge payload without an id", id);
            return Ok(None);
        }

        Ok(Some(parser::vacancy_from_value(value)?))
    }

    pub async fn fetch_resumes(
        &self,
        query: &SearchQuery,
        pages: u32,
    ) -> Result<Vec<CandidateProfile>, ScraperError> {
        let mut profiles = Vec::new();

        for page_number in 0..pages {
            let url = format!(
                "{}?{}",
                self.search_base,
                query.query_string(Surface::ResumeSearch, Some(page_number))
            );
            log::info!("Fetching resume search page {}...", page_number);
            let html = self.get(&url, true).await?;

            let ids = parser::parse_resume_ids(&html);
            if ids.is_empty() {
                log::warn!("No resume links found on page {}", page_number);
            }

            for id in ids {
                let resume_url = format!("{}{}", self.resume_base, id);
                log::debug!("Fetching resume {}: {}", id, resume_url);
                let html = self.get(&resume_url, true).await?;
                match parser::parse_resume(&id, &html) {
                    Ok(profile) => profiles.push(profile),
                    Err(e) => log::warn!("Skipping resume: {}", e),
                }
            }
        }

        Ok(profiles)
    }

    async fn get(&self, url: &str, browser_headers: bool) -> Result<String, ScraperError> {
        let mut request = self.client.get(url);
        if browser_headers {
            request = request.header(USER_AGENT, BROWSER_USER_AGENT);
        }
        Ok(request
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }
}
