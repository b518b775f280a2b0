use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

const PER_PAGE: u32 = 100;

/// Which upstream surface a query is serialized for: the vacancy JSON API
/// or the resume HTML search pages. The two take different parameter names
/// and page conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    VacancyApi,
    ResumeSearch,
}

impl Surface {
    fn role_param(&self) -> &'static str {
        match self {
            Surface::VacancyApi => "roles",
            Surface::ResumeSearch => "professional_role",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub areas: BTreeSet<u32>,
    pub roles: BTreeSet<u32>,
}

impl SearchQuery {
    pub fn from_parts(
        text: impl Into<String>,
        areas: impl IntoIterator<Item = u32>,
        roles: impl IntoIterator<Item = u32>,
    ) -> Self {
        SearchQuery {
            text: text.into(),
            areas: areas.into_iter().collect(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn params(&self, surface: Surface, page: Option<u32>) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        // The resume search rejects requests without its full filter set, so
        // the fixed values ride along on every page.
        if surface == Surface::ResumeSearch {
            params.push(("search_period", "0".to_string()));
            params.push(("order_by", "relevance".to_string()));
            params.push(("filter_exp_period", "all_time".to_string()));
            params.push(("relocation", "living".to_string()));
            params.push(("gender", "unknown".to_string()));
        }

        if !self.text.is_empty() {
            params.push(("text", self.text.clone()));
        }
        for area in &self.areas {
            params.push(("area", area.to_string()));
        }
        for role in &self.roles {
            params.push((surface.role_param(), role.to_string()));
        }

        if surface == Surface::VacancyApi {
            params.push(("per_page", PER_PAGE.to_string()));
        }

        // The API takes an explicit page number on every request; the HTML
        // search addresses its first page by omitting the parameter.
        match (surface, page) {
            (Surface::VacancyApi, Some(page)) => params.push(("page", page.to_string())),
            (Surface::ResumeSearch, Some(page)) if page > 0 => {
                params.push(("page", page.to_string()));
            }
            _ => {}
        }

        params
    }

    pub fn query_string(&self, surface: Surface, page: Option<u32>) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.params(surface, page) {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }
}
